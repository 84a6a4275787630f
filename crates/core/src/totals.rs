//! Totals
//!
//! The read-side pricing pass: subtotal from lines, discount from the applied coupon,
//! delivery fee and minimum from the restaurant. Nothing here is cached on the cart.

use jiff::Timestamp;

use crate::{
    cart::Cart,
    catalog::Restaurant,
    coupons::{Coupon, CouponError},
    delivery::{DeliveryCheck, check_minimum, delivery_fee},
    money::{self, AmountError},
};

/// Monetary summary of a cart or order, in minor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CartTotals {
    /// Sum of line totals
    pub subtotal: u64,

    /// Coupon discount, never above `subtotal`
    pub discount: u64,

    /// Delivery fee for the chosen delivery type
    pub delivery_fee: u64,

    /// `subtotal - discount + delivery_fee`
    pub total: u64,
}

impl CartTotals {
    /// Combine the three inputs, clipping the discount to the subtotal.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::Overflow`] if the total does not fit.
    pub fn new(subtotal: u64, discount: u64, delivery_fee: u64) -> Result<Self, AmountError> {
        let discount = discount.min(subtotal);
        let total = money::add(subtotal.saturating_sub(discount), delivery_fee)?;

        Ok(Self {
            subtotal,
            discount,
            delivery_fee,
            total,
        })
    }

    /// Subtotal once the discount has been taken off.
    pub fn subtotal_after_discount(&self) -> u64 {
        self.subtotal.saturating_sub(self.discount)
    }
}

/// Why an applied coupon is not currently reducing the total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponRejection {
    /// No coupon with this code exists any more.
    NotFound,

    /// The coupon exists but fails an eligibility check.
    Ineligible(CouponError),
}

/// The coupon code on a cart and what it is currently worth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedCoupon {
    /// Normalised coupon code
    pub code: String,

    /// Discount granted, zero when rejected
    pub discount: u64,

    /// Set when the coupon no longer applies
    pub rejection: Option<CouponRejection>,
}

/// A cart together with freshly computed totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedCart {
    /// The cart as stored
    pub cart: Cart,

    /// Computed totals
    pub totals: CartTotals,

    /// Delivery minimum check; absent while the cart is not bound to a restaurant
    pub delivery: Option<DeliveryCheck>,

    /// Applied coupon status, if a code is set
    pub coupon: Option<AppliedCoupon>,
}

/// Price `cart` against current restaurant settings and coupon state.
///
/// An ineligible coupon is reported on [`PricedCart::coupon`] with a zero discount instead
/// of failing the whole read.
///
/// # Errors
///
/// Returns an [`AmountError`] if any amount overflows.
pub fn price_cart(
    cart: Cart,
    restaurant: Option<&Restaurant>,
    coupon: Option<&Coupon>,
    now: Timestamp,
) -> Result<PricedCart, AmountError> {
    let subtotal = cart.subtotal()?;

    let applied = match (cart.coupon_code.as_ref(), coupon) {
        (None, _) => None,
        (Some(code), None) => Some(AppliedCoupon {
            code: code.clone(),
            discount: 0,
            rejection: Some(CouponRejection::NotFound),
        }),
        (Some(code), Some(coupon)) => Some(match coupon.redeem(&cart, now) {
            Ok(discount) => AppliedCoupon {
                code: code.clone(),
                discount,
                rejection: None,
            },
            Err(CouponError::Amount(err)) => return Err(err),
            Err(err) => AppliedCoupon {
                code: code.clone(),
                discount: 0,
                rejection: Some(CouponRejection::Ineligible(err)),
            },
        }),
    };

    let discount = applied.as_ref().map_or(0, |applied| applied.discount);
    let fee = restaurant.map_or(0, |restaurant| delivery_fee(cart.delivery_type, restaurant));
    let totals = CartTotals::new(subtotal, discount, fee)?;

    let delivery = restaurant.map(|restaurant| {
        check_minimum(
            cart.delivery_type,
            restaurant,
            totals.subtotal_after_discount(),
        )
    });

    Ok(PricedCart {
        cart,
        totals,
        delivery,
        coupon: applied,
    })
}
