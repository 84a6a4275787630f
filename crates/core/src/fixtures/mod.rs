//! Fixtures
//!
//! YAML catalogs (restaurants, menu items, coupons) keyed by human-readable strings. Loading
//! generates fresh ids and keeps a key -> id mapping so tests and scenarios can refer to
//! entities by name.

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    catalog::{CatalogError, MenuItem, OptionGroupId, OptionId, Restaurant},
    coupons::{Coupon, CouponDiscount, CouponId, normalize_code},
    fixtures::{
        coupons::{CouponDiscountFixture, CouponFixture},
        menu::{MenuItemFixture, MenuItemKeys, RestaurantFixture},
    },
};

pub mod coupons;
pub mod menu;
pub mod prices;

pub use prices::{parse_percentage, parse_price};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Currency mismatch between prices
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No prices loaded yet
    #[error("No prices loaded yet; currency unknown")]
    NoCurrency,

    /// Restaurant not found
    #[error("Restaurant not found: {0}")]
    RestaurantNotFound(String),

    /// Menu item not found
    #[error("Menu item not found: {0}")]
    MenuItemNotFound(String),

    /// Option group not found
    #[error("Option group not found: {item}.{group}")]
    OptionGroupNotFound {
        /// Menu item key
        item: String,
        /// Group key
        group: String,
    },

    /// Option not found
    #[error("Option not found: {item}.{group}.{option}")]
    OptionNotFound {
        /// Menu item key
        item: String,
        /// Group key
        group: String,
        /// Option key
        option: String,
    },

    /// Coupon not found
    #[error("Coupon not found: {0}")]
    CouponNotFound(String),

    /// Menu item breaks a catalog invariant
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Top-level shape of a catalog YAML file
#[derive(Debug, Deserialize)]
pub struct CatalogFixture {
    /// Restaurant key -> restaurant
    #[serde(default)]
    pub restaurants: FxHashMap<String, RestaurantFixture>,

    /// Menu item key -> menu item
    #[serde(default)]
    pub menu_items: FxHashMap<String, MenuItemFixture>,

    /// Coupon key -> coupon
    #[serde(default)]
    pub coupons: FxHashMap<String, CouponFixture>,
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    restaurants: FxHashMap<String, Restaurant>,
    menu_items: FxHashMap<String, (MenuItem, MenuItemKeys)>,
    coupons: FxHashMap<String, Coupon>,

    /// Currency for the fixture set
    currency: Option<&'static Currency>,
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            restaurants: FxHashMap::default(),
            menu_items: FxHashMap::default(),
            coupons: FxHashMap::default(),
            currency: None,
        }
    }

    /// Load a catalog from `<base>/catalogs/<name>.yml`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, a key reference is dangling,
    /// or prices use more than one currency.
    pub fn load_catalog(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("catalogs").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;

        self.load_catalog_str(&contents)
    }

    /// Load a catalog from YAML text
    ///
    /// # Errors
    ///
    /// See [`Fixture::load_catalog`].
    pub fn load_catalog_str(&mut self, contents: &str) -> Result<&mut Self, FixtureError> {
        let fixture: CatalogFixture = serde_norway::from_str(contents)?;

        for (key, restaurant) in fixture.restaurants {
            let minimum_delivery = self.optional_price(restaurant.minimum_delivery.as_deref())?;
            let delivery_fee = self.optional_price(restaurant.delivery_fee.as_deref())?;

            self.restaurants.insert(
                key,
                menu::build_restaurant(restaurant, minimum_delivery, delivery_fee),
            );
        }

        for (key, item) in fixture.menu_items {
            let restaurant = self.restaurant(&item.restaurant)?.id;
            let price = self.price(&item.price)?;

            let built = menu::build_menu_item(item, restaurant, price, |option_price| {
                self.optional_price(option_price)
            })?;

            self.menu_items.insert(key, built);
        }

        for (key, coupon) in fixture.coupons {
            let coupon = self.build_coupon(coupon)?;

            self.coupons.insert(key, coupon);
        }

        Ok(self)
    }

    /// Load a catalog by name from the default base path
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.load_catalog(name)?;

        Ok(fixture)
    }

    fn build_coupon(&mut self, fixture: CouponFixture) -> Result<Coupon, FixtureError> {
        let discount = match fixture.discount {
            CouponDiscountFixture::Percentage { value } => {
                CouponDiscount::Percentage(parse_percentage(&value)?)
            }
            CouponDiscountFixture::Fixed { value } => CouponDiscount::Fixed(self.price(&value)?),
        };

        let restaurant = fixture
            .restaurant
            .as_deref()
            .map(|key| self.restaurant(key).map(|restaurant| restaurant.id))
            .transpose()?;

        let menu_item = fixture
            .menu_item
            .as_deref()
            .map(|key| self.menu_item(key).map(|item| item.id))
            .transpose()?;

        Ok(Coupon {
            id: CouponId::generate(),
            code: normalize_code(&fixture.code),
            discount,
            minimum_order: self.optional_price(fixture.minimum_order.as_deref())?,
            maximum_discount: fixture
                .maximum_discount
                .as_deref()
                .map(|value| self.price(value))
                .transpose()?,
            valid_from: fixture.valid_from,
            valid_to: fixture.valid_to,
            max_usage: fixture.max_usage,
            usage_count: fixture.usage_count,
            restaurant,
            menu_item,
            is_active: fixture.active,
        })
    }

    fn price(&mut self, value: &str) -> Result<u64, FixtureError> {
        let (minor_units, currency) = parse_price(value)?;

        match self.currency {
            Some(existing) if existing != currency => Err(FixtureError::CurrencyMismatch(
                existing.iso_alpha_code.to_string(),
                currency.iso_alpha_code.to_string(),
            )),
            Some(_) => Ok(minor_units),
            None => {
                self.currency = Some(currency);

                Ok(minor_units)
            }
        }
    }

    fn optional_price(&mut self, value: Option<&str>) -> Result<u64, FixtureError> {
        value.map_or(Ok(0), |value| self.price(value))
    }

    /// Get a restaurant by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the restaurant is not found.
    pub fn restaurant(&self, key: &str) -> Result<&Restaurant, FixtureError> {
        self.restaurants
            .get(key)
            .ok_or_else(|| FixtureError::RestaurantNotFound(key.to_string()))
    }

    /// Get a menu item by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the menu item is not found.
    pub fn menu_item(&self, key: &str) -> Result<&MenuItem, FixtureError> {
        self.menu_items
            .get(key)
            .map(|(item, _)| item)
            .ok_or_else(|| FixtureError::MenuItemNotFound(key.to_string()))
    }

    /// Get an option group id by menu item and group key
    ///
    /// # Errors
    ///
    /// Returns an error if the item or group is not found.
    pub fn option_group(&self, item: &str, group: &str) -> Result<OptionGroupId, FixtureError> {
        let (_, keys) = self
            .menu_items
            .get(item)
            .ok_or_else(|| FixtureError::MenuItemNotFound(item.to_string()))?;

        keys.groups
            .get(group)
            .copied()
            .ok_or_else(|| FixtureError::OptionGroupNotFound {
                item: item.to_string(),
                group: group.to_string(),
            })
    }

    /// Get an option id by menu item, group and option key
    ///
    /// # Errors
    ///
    /// Returns an error if the item, group or option is not found.
    pub fn option(&self, item: &str, group: &str, option: &str) -> Result<OptionId, FixtureError> {
        let (_, keys) = self
            .menu_items
            .get(item)
            .ok_or_else(|| FixtureError::MenuItemNotFound(item.to_string()))?;

        keys.options
            .get(&(group.to_string(), option.to_string()))
            .copied()
            .ok_or_else(|| FixtureError::OptionNotFound {
                item: item.to_string(),
                group: group.to_string(),
                option: option.to_string(),
            })
    }

    /// Get a coupon by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the coupon is not found.
    pub fn coupon(&self, key: &str) -> Result<&Coupon, FixtureError> {
        self.coupons
            .get(key)
            .ok_or_else(|| FixtureError::CouponNotFound(key.to_string()))
    }

    /// All loaded restaurants
    pub fn restaurants(&self) -> impl Iterator<Item = &Restaurant> {
        self.restaurants.values()
    }

    /// All loaded menu items
    pub fn menu_items(&self) -> impl Iterator<Item = &MenuItem> {
        self.menu_items.values().map(|(item, _)| item)
    }

    /// All loaded coupons
    pub fn coupons(&self) -> impl Iterator<Item = &Coupon> {
        self.coupons.values()
    }

    /// Get the currency
    ///
    /// # Errors
    ///
    /// Returns an error if no prices have been loaded yet.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        self.currency.ok_or(FixtureError::NoCurrency)
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use decimal_percentage::Percentage;
    use rust_decimal::Decimal;
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use crate::catalog::SelectionType;

    use super::*;

    const CATALOG: &str = r#"
restaurants:
  napoli:
    name: Napoli
    minimum_delivery: 15.00 GBP
    delivery_fee: 2.50 GBP

menu_items:
  margherita:
    restaurant: napoli
    name: Margherita
    price: 10.00 GBP
    option_groups:
      - key: extras
        name: Extras
        selection_type: multiple
        free_selections: 1
        options:
          - key: olives
            name: Olives
            price: 0.50 GBP
          - key: burrata
            name: Burrata
            price: 1.50 GBP
      - key: base
        name: Base
        selection_type: single
        required: true
        options:
          - key: classic
            name: Classic
            default: true
          - key: thin
            name: Thin

coupons:
  tenoff:
    code: tenoff
    discount:
      type: percentage
      value: 10%
    max_usage: 100
  pizza_fiver:
    code: PIZZA5
    discount:
      type: fixed
      value: 5.00 GBP
    restaurant: napoli
    menu_item: margherita
    valid_to: 2030-01-01T00:00:00Z
"#;

    fn write_fixture(base: &Path, name: &str, contents: &str) -> TestResult {
        let dir = base.join("catalogs");

        fs::create_dir_all(&dir)?;
        fs::write(dir.join(format!("{name}.yml")), contents)?;

        Ok(())
    }

    #[test]
    fn loads_restaurants_items_and_coupons() -> TestResult {
        let dir = tempfile::tempdir()?;
        write_fixture(dir.path(), "napoli", CATALOG)?;

        let mut fixture = Fixture::with_base_path(dir.path());
        fixture.load_catalog("napoli")?;

        let napoli = fixture.restaurant("napoli")?;
        assert_eq!(napoli.minimum_delivery, 15_00);
        assert_eq!(napoli.delivery_fee, 2_50);

        let pizza = fixture.menu_item("margherita")?;
        assert_eq!(pizza.price, 10_00);
        assert_eq!(pizza.restaurant, napoli.id);
        assert_eq!(pizza.option_groups.len(), 2);

        let base = pizza.option_group(fixture.option_group("margherita", "base")?);
        assert_eq!(base.map(|g| g.selection_type), Some(SelectionType::Single));

        let thin = fixture.option("margherita", "base", "thin")?;
        assert!(base.and_then(|g| g.option(thin)).is_some());

        let tenoff = fixture.coupon("tenoff")?;
        assert_eq!(tenoff.code, "TENOFF");
        assert_eq!(
            tenoff.discount,
            CouponDiscount::Percentage(Percentage::from(Decimal::new(1, 1)))
        );
        assert_eq!(tenoff.max_usage, Some(100));

        let fiver = fixture.coupon("pizza_fiver")?;
        assert_eq!(fiver.discount, CouponDiscount::Fixed(5_00));
        assert_eq!(fiver.restaurant, Some(napoli.id));
        assert_eq!(fiver.menu_item, Some(pizza.id));
        assert!(fiver.valid_to.is_some());

        assert_eq!(fixture.currency()?, GBP);

        Ok(())
    }

    #[test]
    fn rejects_currency_mismatch() {
        let mut fixture = Fixture::new();

        let result = fixture.load_catalog_str(
            "restaurants:\n  a:\n    name: A\n    minimum_delivery: 1.00 USD\n    delivery_fee: 1.00 GBP\n",
        );

        assert!(matches!(result, Err(FixtureError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn rejects_dangling_restaurant_key() {
        let mut fixture = Fixture::new();

        let result = fixture.load_catalog_str(
            "menu_items:\n  x:\n    restaurant: nowhere\n    name: X\n    price: 1.00 GBP\n",
        );

        assert!(matches!(result, Err(FixtureError::RestaurantNotFound(key)) if key == "nowhere"));
    }

    #[test]
    fn rejects_inverted_selection_bounds() {
        let mut fixture = Fixture::new();

        let result = fixture.load_catalog_str(
            r"
restaurants:
  r:
    name: R
menu_items:
  x:
    restaurant: r
    name: X
    price: 1.00 GBP
    option_groups:
      - key: g
        name: G
        selection_type: multiple
        min_selections: 3
        max_selections: 1
        options: []
",
        );

        assert!(matches!(
            result,
            Err(FixtureError::Catalog(CatalogError::InvalidSelectionBounds { .. }))
        ));
    }

    #[test]
    fn missing_keys_return_errors() {
        let fixture = Fixture::new();

        assert!(matches!(
            fixture.menu_item("nope"),
            Err(FixtureError::MenuItemNotFound(_))
        ));
        assert!(matches!(
            fixture.coupon("nope"),
            Err(FixtureError::CouponNotFound(_))
        ));
        assert!(matches!(fixture.currency(), Err(FixtureError::NoCurrency)));
    }

    #[test]
    fn shipped_catalogs_load() -> TestResult {
        let base = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures");

        let mut fixture = Fixture::with_base_path(base);
        fixture.load_catalog("napoli")?;

        assert!(fixture.menu_items().count() > 0);
        assert!(fixture.coupons().count() > 0);

        Ok(())
    }
}
