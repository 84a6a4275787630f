//! Cart
//!
//! A mutable, owner-scoped staging area for an order. Every mutation re-resolves the
//! affected line against the catalog snapshot it is given and keeps the per-line price
//! snapshot current; the subtotal is always derived, never stored.

use std::fmt::{self, Display};

use jiff::Timestamp;
use smallvec::SmallVec;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    catalog::{MenuItem, MenuItemId, RestaurantId},
    ids::TypedUuid,
    money::{self, AmountError},
    options::{SelectedOption, Selection, SelectionError, resolve_selection},
};

/// Cart identifier.
pub type CartId = TypedUuid<Cart>;

/// Cart line identifier.
pub type CartLineId = TypedUuid<CartLine>;

/// Largest quantity a single line may carry.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Longest special-instructions text accepted, in characters.
pub const MAX_INSTRUCTIONS_LEN: usize = 500;

/// Errors from cart mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    /// Quantity outside `1..=MAX_LINE_QUANTITY`.
    #[error("quantity {quantity} is outside 1..={MAX_LINE_QUANTITY}")]
    InvalidQuantity {
        /// Requested quantity
        quantity: u32,
    },

    /// Special instructions exceed [`MAX_INSTRUCTIONS_LEN`].
    #[error("special instructions are {length} characters, limit is {MAX_INSTRUCTIONS_LEN}")]
    InstructionsTooLong {
        /// Length supplied
        length: usize,
    },

    /// The menu item belongs to a different restaurant than the cart.
    #[error("menu item {item} does not belong to restaurant {restaurant}")]
    ForeignMenuItem {
        /// Requested item
        item: MenuItemId,
        /// Restaurant the cart is bound to
        restaurant: RestaurantId,
    },

    /// The menu item is switched off.
    #[error("menu item {item} is unavailable")]
    ItemUnavailable {
        /// Unavailable item
        item: MenuItemId,
    },

    /// The catalog snapshot supplied is not the menu item being priced.
    #[error("menu item {item} was supplied for {expected}")]
    ItemMismatch {
        /// Item the line refers to
        expected: MenuItemId,
        /// Item supplied
        item: MenuItemId,
    },

    /// No line with this id.
    #[error("cart line {line} not found")]
    LineNotFound {
        /// Requested line
        line: CartLineId,
    },

    /// Wrapped selection error.
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// Wrapped money arithmetic error.
    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// Who a cart belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CartOwner {
    /// A signed-in customer.
    User(Uuid),

    /// An anonymous browser session.
    Session(String),
}

impl Display for CartOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(uuid) => write!(f, "user:{uuid}"),
            Self::Session(session) => write!(f, "session:{session}"),
        }
    }
}

/// How the order reaches the customer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeliveryType {
    /// Delivered by the restaurant; minimum order and delivery fee apply.
    #[default]
    Delivery,

    /// Collected by the customer.
    Collection,
}

impl DeliveryType {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delivery => "delivery",
            Self::Collection => "collection",
        }
    }
}

/// One menu item entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// Line id
    pub id: CartLineId,

    /// Menu item reference
    pub menu_item: MenuItemId,

    /// Item name captured at the last mutation
    pub item_name: String,

    /// Quantity, at least one
    pub quantity: u32,

    /// Selections as the customer made them, replayed on every re-resolution
    pub selections: SmallVec<[Selection; 2]>,

    /// Resolved options captured at the last mutation
    pub options: SmallVec<[SelectedOption; 4]>,

    /// Free-text special instructions
    pub instructions: Option<String>,

    /// Base item price captured at the last mutation (excludes options)
    pub unit_price: u64,

    /// Per-unit option delta captured at the last mutation
    pub options_price: u64,
}

impl CartLine {
    /// Price of one unit including options.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::Overflow`] if the sum does not fit.
    pub fn unit_total(&self) -> Result<u64, AmountError> {
        money::add(self.unit_price, self.options_price)
    }

    /// `(unit_price + options_price) * quantity`.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::Overflow`] if the product does not fit.
    pub fn total(&self) -> Result<u64, AmountError> {
        money::times(self.unit_total()?, self.quantity)
    }

    /// Re-resolve this line against a fresh catalog snapshot of its menu item, returning a
    /// copy with current names and prices.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the item is unavailable or the stored selections no longer
    /// satisfy the item's option groups.
    pub fn reprice(&self, item: &MenuItem) -> Result<Self, CartError> {
        if item.id != self.menu_item {
            return Err(CartError::ItemMismatch {
                expected: self.menu_item,
                item: item.id,
            });
        }

        if !item.is_available {
            return Err(CartError::ItemUnavailable { item: item.id });
        }

        let resolved = resolve_selection(item, &self.selections)?;

        Ok(Self {
            item_name: item.name.clone(),
            unit_price: item.price,
            options_price: resolved.unit_delta,
            options: resolved.options,
            ..self.clone()
        })
    }
}

/// Input for a new line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartLine {
    /// Menu item to add
    pub menu_item: MenuItemId,

    /// Quantity, at least one
    pub quantity: u32,

    /// Option selections
    pub selections: Vec<Selection>,

    /// Special instructions
    pub instructions: Option<String>,
}

/// Partial update of an existing line. `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartLineUpdate {
    /// New quantity; zero is rejected, use removal instead
    pub quantity: Option<u32>,

    /// Replacement selections
    pub selections: Option<Vec<Selection>>,

    /// Replacement instructions; `Some(None)` clears them
    pub instructions: Option<Option<String>>,
}

/// A customer's cart, scoped to exactly one restaurant while it has lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    /// Cart id
    pub id: CartId,

    /// Owning user or session
    pub owner: CartOwner,

    /// Restaurant every line belongs to; rebinds when the cart is empty
    pub restaurant: Option<RestaurantId>,

    /// Delivery or collection
    pub delivery_type: DeliveryType,

    /// Normalised code of the applied coupon
    pub coupon_code: Option<String>,

    /// Lines in insertion order
    pub lines: Vec<CartLine>,

    /// Optimistic concurrency version; zero means never stored
    pub version: u64,

    /// Creation time
    pub created_at: Timestamp,

    /// Last mutation time
    pub updated_at: Timestamp,
}

impl Cart {
    /// Create an empty, unsaved cart.
    #[must_use]
    pub fn new(owner: CartOwner, now: Timestamp) -> Self {
        Self {
            id: CartId::generate(),
            owner,
            restaurant: None,
            delivery_type: DeliveryType::default(),
            coupon_code: None,
            lines: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Find a line by id.
    pub fn line(&self, id: CartLineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.id == id)
    }

    /// Whether any line references `item`.
    pub fn contains_item(&self, item: MenuItemId) -> bool {
        self.lines.iter().any(|line| line.menu_item == item)
    }

    /// Sum of every line total.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::Overflow`] if any line or the sum does not fit.
    pub fn subtotal(&self) -> Result<u64, AmountError> {
        self.lines
            .iter()
            .try_fold(0_u64, |acc, line| money::add(acc, line.total()?))
    }

    /// Add a line for `item`, binding an empty cart to the item's restaurant.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the quantity or instructions are invalid, the item belongs
    /// to another restaurant, is unavailable, or its selections do not resolve.
    pub fn add_line(
        &mut self,
        item: &MenuItem,
        line: NewCartLine,
        now: Timestamp,
    ) -> Result<CartLineId, CartError> {
        check_quantity(line.quantity)?;
        let instructions = normalise_instructions(line.instructions)?;

        if let Some(restaurant) = self.restaurant
            && !self.is_empty()
            && restaurant != item.restaurant
        {
            return Err(CartError::ForeignMenuItem {
                item: item.id,
                restaurant,
            });
        }

        if line.menu_item != item.id {
            return Err(CartError::ItemMismatch {
                expected: line.menu_item,
                item: item.id,
            });
        }

        if !item.is_available {
            return Err(CartError::ItemUnavailable { item: item.id });
        }

        let resolved = resolve_selection(item, &line.selections)?;

        let new_line = CartLine {
            id: CartLineId::generate(),
            menu_item: item.id,
            item_name: item.name.clone(),
            quantity: line.quantity,
            selections: line.selections.into_iter().collect(),
            options: resolved.options,
            instructions,
            unit_price: item.price,
            options_price: resolved.unit_delta,
        };

        // The new total must be representable before the line is accepted.
        money::add(self.subtotal()?, new_line.total()?)?;

        let id = new_line.id;

        self.restaurant = Some(item.restaurant);
        self.lines.push(new_line);
        self.updated_at = now;

        Ok(id)
    }

    /// Apply `update` to a line, re-resolving it against `item`.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the line does not exist, a zero or oversized quantity is
    /// requested, or the (possibly new) selections do not resolve.
    pub fn update_line(
        &mut self,
        line: CartLineId,
        item: &MenuItem,
        update: CartLineUpdate,
        now: Timestamp,
    ) -> Result<(), CartError> {
        let existing = self.line(line).ok_or(CartError::LineNotFound { line })?;
        let others = self.subtotal()?.saturating_sub(existing.total()?);

        let mut updated = existing.clone();

        if let Some(quantity) = update.quantity {
            check_quantity(quantity)?;
            updated.quantity = quantity;
        }

        if let Some(selections) = update.selections {
            updated.selections = selections.into_iter().collect();
        }

        if let Some(instructions) = update.instructions {
            updated.instructions = normalise_instructions(instructions)?;
        }

        let updated = updated.reprice(item)?;

        // The new subtotal must be representable before the line is replaced.
        money::add(others, updated.total()?)?;

        let slot = self
            .lines
            .iter_mut()
            .find(|candidate| candidate.id == line)
            .ok_or(CartError::LineNotFound { line })?;

        *slot = updated;
        self.updated_at = now;

        Ok(())
    }

    /// Remove a line. Removing the last line leaves a valid, empty cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if no line has this id.
    pub fn remove_line(&mut self, line: CartLineId, now: Timestamp) -> Result<CartLine, CartError> {
        let position = self
            .lines
            .iter()
            .position(|candidate| candidate.id == line)
            .ok_or(CartError::LineNotFound { line })?;

        let removed = self.lines.remove(position);
        self.updated_at = now;

        Ok(removed)
    }

    /// Empty the cart: no lines, no coupon, no restaurant binding.
    pub fn clear(&mut self, now: Timestamp) {
        self.lines.clear();
        self.coupon_code = None;
        self.restaurant = None;
        self.updated_at = now;
    }

    /// Switch between delivery and collection.
    pub fn set_delivery_type(&mut self, delivery_type: DeliveryType, now: Timestamp) {
        self.delivery_type = delivery_type;
        self.updated_at = now;
    }

    /// Record `code` as the applied coupon, replacing any previous one.
    pub fn set_coupon(&mut self, code: String, now: Timestamp) {
        self.coupon_code = Some(code);
        self.updated_at = now;
    }

    /// Drop the applied coupon, if any.
    pub fn remove_coupon(&mut self, now: Timestamp) {
        self.coupon_code = None;
        self.updated_at = now;
    }
}

fn check_quantity(quantity: u32) -> Result<(), CartError> {
    if (1..=MAX_LINE_QUANTITY).contains(&quantity) {
        Ok(())
    } else {
        Err(CartError::InvalidQuantity { quantity })
    }
}

fn normalise_instructions(instructions: Option<String>) -> Result<Option<String>, CartError> {
    let Some(text) = instructions else {
        return Ok(None);
    };

    let trimmed = text.trim();
    let length = trimmed.chars().count();

    if length > MAX_INSTRUCTIONS_LEN {
        return Err(CartError::InstructionsTooLong { length });
    }

    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}
