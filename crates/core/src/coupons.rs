//! Coupons
//!
//! Eligibility is a fixed sequence of checks where the first failure wins. The discount is
//! computed separately so a cart view can explain why a coupon stopped applying without
//! touching the cart itself.

use decimal_percentage::Percentage;
use jiff::Timestamp;
use thiserror::Error;

use crate::{
    cart::Cart,
    catalog::{MenuItemId, RestaurantId},
    ids::TypedUuid,
    money::{AmountError, percent_of_minor},
};

/// Coupon identifier.
pub type CouponId = TypedUuid<Coupon>;

/// Errors from coupon eligibility checks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CouponError {
    /// The coupon has been switched off.
    #[error("coupon {code} is not active")]
    Inactive {
        /// Coupon code
        code: String,
    },

    /// `now` is before `valid_from` or after `valid_to`.
    #[error("coupon {code} is not valid at {now}")]
    OutsideValidityWindow {
        /// Coupon code
        code: String,
        /// Time of the check
        now: Timestamp,
        /// Start of the window, if any
        valid_from: Option<Timestamp>,
        /// End of the window, if any
        valid_to: Option<Timestamp>,
    },

    /// Usage count has reached the cap.
    #[error("coupon {code} has been used {max_usage} times and is exhausted")]
    Exhausted {
        /// Coupon code
        code: String,
        /// Usage cap
        max_usage: u32,
    },

    /// The coupon is scoped to a restaurant other than the cart's.
    #[error("coupon {code} only applies to restaurant {required}")]
    WrongRestaurant {
        /// Coupon code
        code: String,
        /// Restaurant the coupon is scoped to
        required: RestaurantId,
        /// Restaurant the cart is bound to
        actual: Option<RestaurantId>,
    },

    /// The coupon is scoped to a menu item the cart does not contain.
    #[error("coupon {code} requires menu item {item} in the cart")]
    MissingMenuItem {
        /// Coupon code
        code: String,
        /// Menu item the coupon is scoped to
        item: MenuItemId,
    },

    /// Subtotal is below the coupon's minimum order.
    #[error("coupon {code} requires a subtotal of {required}, cart has {subtotal}")]
    MinimumOrderNotMet {
        /// Coupon code
        code: String,
        /// Minimum order, in minor units
        required: u64,
        /// Cart subtotal, in minor units
        subtotal: u64,
    },

    /// Wrapped money arithmetic error.
    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// How a coupon reduces the subtotal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CouponDiscount {
    /// Fraction of the subtotal, e.g. `0.10` for 10% off.
    Percentage(Percentage),

    /// Fixed amount in minor units.
    Fixed(u64),
}

/// A discount rule identified by a code.
#[derive(Debug, Clone, PartialEq)]
pub struct Coupon {
    /// Coupon id
    pub id: CouponId,

    /// Normalised code, see [`normalize_code`]
    pub code: String,

    /// Percentage or fixed discount
    pub discount: CouponDiscount,

    /// Minimum subtotal required, in minor units (zero for none)
    pub minimum_order: u64,

    /// Cap on a percentage discount, in minor units
    pub maximum_discount: Option<u64>,

    /// Start of the validity window (inclusive)
    pub valid_from: Option<Timestamp>,

    /// End of the validity window (inclusive)
    pub valid_to: Option<Timestamp>,

    /// Maximum number of redemptions across all customers
    pub max_usage: Option<u32>,

    /// Number of completed redemptions
    pub usage_count: u32,

    /// Restaurant scope
    pub restaurant: Option<RestaurantId>,

    /// Single menu item scope
    pub menu_item: Option<MenuItemId>,

    /// Whether the coupon is switched on
    pub is_active: bool,
}

/// Normalise a customer-entered code for case-insensitive lookup.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl Coupon {
    /// Whether `now` falls inside the validity window.
    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        self.valid_from.is_none_or(|from| now >= from) && self.valid_to.is_none_or(|to| now <= to)
    }

    /// Whether the usage cap has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.max_usage.is_some_and(|max| self.usage_count >= max)
    }

    /// Run every eligibility check against `cart` in order.
    ///
    /// # Errors
    ///
    /// Returns the first failing check as a [`CouponError`].
    pub fn check_eligibility(&self, cart: &Cart, now: Timestamp) -> Result<(), CouponError> {
        if !self.is_active {
            return Err(CouponError::Inactive {
                code: self.code.clone(),
            });
        }

        if !self.is_valid_at(now) {
            return Err(CouponError::OutsideValidityWindow {
                code: self.code.clone(),
                now,
                valid_from: self.valid_from,
                valid_to: self.valid_to,
            });
        }

        if let Some(max_usage) = self.max_usage
            && self.usage_count >= max_usage
        {
            return Err(CouponError::Exhausted {
                code: self.code.clone(),
                max_usage,
            });
        }

        if let Some(required) = self.restaurant
            && cart.restaurant != Some(required)
        {
            return Err(CouponError::WrongRestaurant {
                code: self.code.clone(),
                required,
                actual: cart.restaurant,
            });
        }

        if let Some(item) = self.menu_item
            && !cart.contains_item(item)
        {
            return Err(CouponError::MissingMenuItem {
                code: self.code.clone(),
                item,
            });
        }

        let subtotal = cart.subtotal()?;

        if subtotal < self.minimum_order {
            return Err(CouponError::MinimumOrderNotMet {
                code: self.code.clone(),
                required: self.minimum_order,
                subtotal,
            });
        }

        Ok(())
    }

    /// Discount this coupon gives on `subtotal`, never exceeding it.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::Amount`] if the percentage cannot be represented.
    pub fn compute_discount(&self, subtotal: u64) -> Result<u64, CouponError> {
        let discount = match self.discount {
            CouponDiscount::Percentage(percent) => {
                let raw = percent_of_minor(percent, subtotal)?;

                self.maximum_discount.map_or(raw, |max| raw.min(max))
            }
            CouponDiscount::Fixed(amount) => amount,
        };

        Ok(discount.min(subtotal))
    }

    /// Check eligibility and compute the discount for `cart`.
    ///
    /// # Errors
    ///
    /// Returns a [`CouponError`] if the coupon does not apply.
    pub fn redeem(&self, cart: &Cart, now: Timestamp) -> Result<u64, CouponError> {
        self.check_eligibility(cart, now)?;

        self.compute_discount(cart.subtotal()?)
    }
}
