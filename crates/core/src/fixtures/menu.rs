//! Restaurant and Menu Fixtures

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::catalog::{
    MenuItem, MenuItemId, MenuOption, OptionGroup, OptionGroupId, OptionId, Restaurant,
    RestaurantId, SelectionType,
};

/// Restaurant fixture
#[derive(Debug, Deserialize)]
pub struct RestaurantFixture {
    /// Display name
    pub name: String,

    /// Minimum order for delivery (e.g., "15.00 GBP")
    #[serde(default)]
    pub minimum_delivery: Option<String>,

    /// Delivery fee (e.g., "2.50 GBP")
    #[serde(default)]
    pub delivery_fee: Option<String>,
}

/// Menu item fixture
#[derive(Debug, Deserialize)]
pub struct MenuItemFixture {
    /// Key of the owning restaurant
    pub restaurant: String,

    /// Display name
    pub name: String,

    /// Base price (e.g., "10.00 GBP")
    pub price: String,

    /// Whether the item can be ordered
    #[serde(default = "yes")]
    pub available: bool,

    /// Option groups in menu order
    #[serde(default)]
    pub option_groups: Vec<OptionGroupFixture>,
}

/// Selection type as written in YAML
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionTypeFixture {
    /// At most one option
    Single,

    /// Any number within bounds
    Multiple,
}

impl From<SelectionTypeFixture> for SelectionType {
    fn from(fixture: SelectionTypeFixture) -> Self {
        match fixture {
            SelectionTypeFixture::Single => SelectionType::Single,
            SelectionTypeFixture::Multiple => SelectionType::Multiple,
        }
    }
}

/// Option group fixture
#[derive(Debug, Deserialize)]
pub struct OptionGroupFixture {
    /// Key used by scenarios to refer to this group
    pub key: String,

    /// Display name
    pub name: String,

    /// Single or multiple choice
    pub selection_type: SelectionTypeFixture,

    /// Minimum selections once the group is used
    #[serde(default)]
    pub min_selections: u32,

    /// Maximum selections
    #[serde(default)]
    pub max_selections: Option<u32>,

    /// Leading selections that are free
    #[serde(default)]
    pub free_selections: u32,

    /// Whether a choice is mandatory
    #[serde(default)]
    pub required: bool,

    /// Options in menu order
    pub options: Vec<OptionFixture>,
}

/// Option fixture
#[derive(Debug, Deserialize)]
pub struct OptionFixture {
    /// Key used by scenarios to refer to this option
    pub key: String,

    /// Display name
    pub name: String,

    /// Additional price (e.g., "1.50 GBP"); free when omitted
    #[serde(default)]
    pub price: Option<String>,

    /// Selected when the group is left untouched
    #[serde(default)]
    pub default: bool,

    /// Whether the option can be chosen
    #[serde(default = "yes")]
    pub available: bool,
}

fn yes() -> bool {
    true
}

/// Generated ids for one menu item's groups and options, by fixture key.
#[derive(Debug, Clone, Default)]
pub struct MenuItemKeys {
    /// Group key -> group id
    pub groups: FxHashMap<String, OptionGroupId>,

    /// (group key, option key) -> option id
    pub options: FxHashMap<(String, String), OptionId>,
}

pub(super) fn build_restaurant(
    fixture: RestaurantFixture,
    minimum_delivery: u64,
    delivery_fee: u64,
) -> Restaurant {
    Restaurant {
        id: RestaurantId::generate(),
        name: fixture.name,
        minimum_delivery,
        delivery_fee,
    }
}

pub(super) fn build_menu_item(
    fixture: MenuItemFixture,
    restaurant: RestaurantId,
    price: u64,
    mut option_price: impl FnMut(Option<&str>) -> Result<u64, super::FixtureError>,
) -> Result<(MenuItem, MenuItemKeys), super::FixtureError> {
    let mut keys = MenuItemKeys::default();
    let mut option_groups = Vec::with_capacity(fixture.option_groups.len());

    for group in fixture.option_groups {
        let group_id = OptionGroupId::generate();
        let mut options = Vec::with_capacity(group.options.len());

        for option in group.options {
            let option_id = OptionId::generate();

            options.push(MenuOption {
                id: option_id,
                name: option.name,
                additional_price: option_price(option.price.as_deref())?,
                is_default: option.default,
                is_available: option.available,
            });

            keys.options.insert((group.key.clone(), option.key), option_id);
        }

        keys.groups.insert(group.key, group_id);

        option_groups.push(OptionGroup {
            id: group_id,
            name: group.name,
            selection_type: group.selection_type.into(),
            min_selections: group.min_selections,
            max_selections: group.max_selections,
            free_selections: group.free_selections,
            is_required: group.required,
            options,
        });
    }

    let item = MenuItem {
        id: MenuItemId::generate(),
        restaurant,
        name: fixture.name,
        price,
        is_available: fixture.available,
        option_groups,
    };

    item.validate()?;

    Ok((item, keys))
}
