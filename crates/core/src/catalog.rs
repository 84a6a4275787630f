//! Catalog
//!
//! Read-only snapshots of restaurants and menu items as the catalog collaborator reports
//! them at call time. The cart never mutates these; it copies what it needs.

use thiserror::Error;

use crate::ids::TypedUuid;

/// Restaurant identifier.
pub type RestaurantId = TypedUuid<Restaurant>;

/// Menu item identifier.
pub type MenuItemId = TypedUuid<MenuItem>;

/// Option group identifier.
pub type OptionGroupId = TypedUuid<OptionGroup>;

/// Option identifier.
pub type OptionId = TypedUuid<MenuOption>;

/// Errors raised when a catalog snapshot breaks its own invariants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// `min_selections` exceeds `max_selections`.
    #[error("option group {group} has min {min} greater than max {max}")]
    InvalidSelectionBounds {
        /// Offending group
        group: OptionGroupId,
        /// Configured minimum
        min: u32,
        /// Configured (or implied) maximum
        max: u32,
    },
}

/// Restaurant settings relevant to pricing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restaurant {
    /// Restaurant id
    pub id: RestaurantId,

    /// Display name
    pub name: String,

    /// Minimum subtotal (after discount) accepted for delivery orders, in minor units
    pub minimum_delivery: u64,

    /// Flat delivery fee charged on delivery orders, in minor units
    pub delivery_fee: u64,
}

/// A menu item as listed by a restaurant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    /// Menu item id
    pub id: MenuItemId,

    /// Owning restaurant
    pub restaurant: RestaurantId,

    /// Display name
    pub name: String,

    /// Base unit price in minor units
    pub price: u64,

    /// Whether the item can currently be ordered
    pub is_available: bool,

    /// Option groups, in menu order
    pub option_groups: Vec<OptionGroup>,
}

impl MenuItem {
    /// Find one of this item's option groups.
    pub fn option_group(&self, id: OptionGroupId) -> Option<&OptionGroup> {
        self.option_groups.iter().find(|group| group.id == id)
    }

    /// Check every option group's selection bounds.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidSelectionBounds`] for the first inconsistent group.
    pub fn validate(&self) -> Result<(), CatalogError> {
        self.option_groups.iter().try_for_each(OptionGroup::validate)
    }
}

/// How many options a group accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionType {
    /// At most one option.
    Single,

    /// Any number of options within the group's bounds.
    Multiple,
}

/// A named set of modifiers for a menu item, e.g. "Toppings".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionGroup {
    /// Group id
    pub id: OptionGroupId,

    /// Display name
    pub name: String,

    /// Single or multiple choice
    pub selection_type: SelectionType,

    /// Minimum number of selections once the group is used
    pub min_selections: u32,

    /// Maximum number of selections; `None` is unbounded
    pub max_selections: Option<u32>,

    /// Number of leading selections that are not charged
    pub free_selections: u32,

    /// Whether the customer must choose from this group
    pub is_required: bool,

    /// Options, in menu order
    pub options: Vec<MenuOption>,
}

impl OptionGroup {
    /// Find an option in this group.
    pub fn option(&self, id: OptionId) -> Option<&MenuOption> {
        self.options.iter().find(|option| option.id == id)
    }

    /// Effective upper bound. Single choice groups are capped at one.
    pub fn effective_max(&self) -> Option<u32> {
        match self.selection_type {
            SelectionType::Single => Some(self.max_selections.map_or(1, |max| max.min(1))),
            SelectionType::Multiple => self.max_selections,
        }
    }

    /// Effective lower bound. A required group needs at least one choice.
    pub fn effective_min(&self) -> u32 {
        if self.is_required {
            self.min_selections.max(1)
        } else {
            self.min_selections
        }
    }

    /// Options selected by default, skipping any that are unavailable.
    pub fn default_options(&self) -> impl Iterator<Item = &MenuOption> {
        self.options
            .iter()
            .filter(|option| option.is_default && option.is_available)
    }

    /// Check `min <= max`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidSelectionBounds`] when the bounds are inverted.
    pub fn validate(&self) -> Result<(), CatalogError> {
        match self.effective_max() {
            Some(max) if self.effective_min() > max => Err(CatalogError::InvalidSelectionBounds {
                group: self.id,
                min: self.effective_min(),
                max,
            }),
            _ => Ok(()),
        }
    }
}

/// A single modifier within an option group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuOption {
    /// Option id
    pub id: OptionId,

    /// Display name
    pub name: String,

    /// Price added per unit when selected, in minor units
    pub additional_price: u64,

    /// Selected when the customer makes no choice for the group
    pub is_default: bool,

    /// Whether the option can currently be chosen
    pub is_available: bool,
}
