//! Coupon Fixtures

use jiff::Timestamp;
use serde::Deserialize;

/// Discount configuration from YAML fixtures
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CouponDiscountFixture {
    /// Percentage discount (e.g., "10%")
    Percentage {
        /// Percentage string (e.g., "10%" or "0.10")
        value: String,
    },

    /// Fixed amount off (e.g., "5.00 GBP")
    Fixed {
        /// Amount string (e.g., "5.00 GBP")
        value: String,
    },
}

/// Coupon fixture
#[derive(Debug, Deserialize)]
pub struct CouponFixture {
    /// Customer-facing code; normalised on load
    pub code: String,

    /// Discount configuration
    pub discount: CouponDiscountFixture,

    /// Minimum subtotal (e.g., "20.00 GBP")
    #[serde(default)]
    pub minimum_order: Option<String>,

    /// Cap on percentage discounts (e.g., "20.00 GBP")
    #[serde(default)]
    pub maximum_discount: Option<String>,

    /// Start of validity window
    #[serde(default)]
    pub valid_from: Option<Timestamp>,

    /// End of validity window
    #[serde(default)]
    pub valid_to: Option<Timestamp>,

    /// Usage cap
    #[serde(default)]
    pub max_usage: Option<u32>,

    /// Redemptions so far
    #[serde(default)]
    pub usage_count: u32,

    /// Restaurant key scope
    #[serde(default)]
    pub restaurant: Option<String>,

    /// Menu item key scope
    #[serde(default)]
    pub menu_item: Option<String>,

    /// Whether the coupon is switched on
    #[serde(default = "active")]
    pub active: bool,
}

fn active() -> bool {
    true
}
