//! Error taxonomy shared by the application services.
//!
//! Every service error is one of four kinds: a missing entity, a rejected request, a
//! state change that raced the caller, or a storage failure passed through untouched.

use platter::prelude::*;
use thiserror::Error;

/// The entity a not-found error refers to.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Missing {
    /// The owner has no cart.
    #[error("cart")]
    Cart,

    /// No line with this id in the cart.
    #[error("cart line {0}")]
    CartLine(CartLineId),

    /// Unknown menu item, or one from another restaurant.
    #[error("menu item {0}")]
    MenuItem(MenuItemId),

    /// Unknown restaurant.
    #[error("restaurant {0}")]
    Restaurant(RestaurantId),

    /// No active coupon with this code.
    #[error("coupon {code}")]
    InvalidCoupon {
        /// Normalised code
        code: String,
    },

    /// A record the storage layer could not find.
    #[error("record")]
    Record,
}

/// What a coupon is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponScope {
    /// Only carts from this restaurant
    Restaurant(RestaurantId),

    /// Only carts containing this menu item
    MenuItem(MenuItemId),
}

/// A business rule the request breaks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationReason {
    /// Quantity outside the accepted range.
    #[error("quantity {quantity} is outside 1..={MAX_LINE_QUANTITY}")]
    InvalidQuantity {
        /// Requested quantity
        quantity: u32,
    },

    /// Special instructions are too long.
    #[error("special instructions are {length} characters long")]
    InstructionsTooLong {
        /// Supplied length
        length: usize,
    },

    /// The menu item is switched off.
    #[error("menu item {item} is unavailable")]
    ItemUnavailable {
        /// Unavailable item
        item: MenuItemId,
    },

    /// Option selections break a group's rules.
    #[error(transparent)]
    Selection(SelectionError),

    /// The coupon is outside its validity window.
    #[error("coupon {code} is expired or not yet valid")]
    CouponExpiredOrNotYetValid {
        /// Coupon code
        code: String,
    },

    /// The coupon has reached its usage cap.
    #[error("coupon {code} has been fully redeemed")]
    CouponExhausted {
        /// Coupon code
        code: String,
    },

    /// The coupon's scope does not match the cart.
    #[error("coupon {code} does not apply to this cart")]
    CouponNotApplicable {
        /// Coupon code
        code: String,
        /// The restriction that failed
        scope: CouponScope,
    },

    /// The cart subtotal is below the coupon's minimum order.
    #[error("coupon {code} requires a subtotal of {required}, cart has {subtotal}")]
    MinimumOrderNotMet {
        /// Coupon code
        code: String,
        /// Minimum order, in minor units
        required: u64,
        /// Cart subtotal, in minor units
        subtotal: u64,
    },

    /// The restaurant's delivery minimum is not met.
    #[error("delivery minimum of {required} not met, {shortfall} short")]
    MinimumNotMet {
        /// Restaurant minimum, in minor units
        required: u64,
        /// Amount still needed, in minor units
        shortfall: u64,
    },

    /// Checkout of a cart without lines.
    #[error("cart is empty")]
    EmptyCart,

    /// The order lifecycle does not allow this status change.
    #[error("order cannot move from {from} to {to}")]
    StatusTransition {
        /// Current status
        from: OrderStatus,
        /// Requested status
        to: OrderStatus,
    },

    /// The payment lifecycle does not allow this status change.
    #[error("payment cannot move from {from} to {to}")]
    PaymentTransition {
        /// Current status
        from: PaymentStatus,
        /// Requested status
        to: PaymentStatus,
    },

    /// An amount does not fit in the supported range.
    #[error("amount out of range")]
    AmountOutOfRange,
}

/// State changed between the caller's read and this write.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConflictReason {
    /// One or more lines can no longer be ordered as they stand.
    #[error("{} cart line(s) are no longer available", .0.len())]
    ItemNoLongerAvailable(Vec<LineConflict>),

    /// Another writer saved the cart first.
    #[error("cart was modified concurrently")]
    CartModified,
}

/// A failure sorted into the shared taxonomy, before it is wrapped by a service error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Classified {
    NotFound(Missing),
    Validation(ValidationReason),
    Conflict(ConflictReason),
}

impl From<AmountError> for Classified {
    fn from(_error: AmountError) -> Self {
        Self::Validation(ValidationReason::AmountOutOfRange)
    }
}

impl From<SelectionError> for Classified {
    fn from(error: SelectionError) -> Self {
        match error {
            SelectionError::Amount(error) => error.into(),
            other => Self::Validation(ValidationReason::Selection(other)),
        }
    }
}

impl From<CartError> for Classified {
    fn from(error: CartError) -> Self {
        match error {
            CartError::InvalidQuantity { quantity } => {
                Self::Validation(ValidationReason::InvalidQuantity { quantity })
            }
            CartError::InstructionsTooLong { length } => {
                Self::Validation(ValidationReason::InstructionsTooLong { length })
            }
            CartError::ForeignMenuItem { item, .. } | CartError::ItemMismatch { item, .. } => {
                Self::NotFound(Missing::MenuItem(item))
            }
            CartError::ItemUnavailable { item } => {
                Self::Validation(ValidationReason::ItemUnavailable { item })
            }
            CartError::LineNotFound { line } => Self::NotFound(Missing::CartLine(line)),
            CartError::Selection(error) => error.into(),
            CartError::Amount(error) => error.into(),
        }
    }
}

impl From<CouponError> for Classified {
    fn from(error: CouponError) -> Self {
        match error {
            CouponError::Inactive { code } => Self::NotFound(Missing::InvalidCoupon { code }),
            CouponError::OutsideValidityWindow { code, .. } => {
                Self::Validation(ValidationReason::CouponExpiredOrNotYetValid { code })
            }
            CouponError::Exhausted { code, .. } => {
                Self::Validation(ValidationReason::CouponExhausted { code })
            }
            CouponError::WrongRestaurant { code, required, .. } => {
                Self::Validation(ValidationReason::CouponNotApplicable {
                    code,
                    scope: CouponScope::Restaurant(required),
                })
            }
            CouponError::MissingMenuItem { code, item } => {
                Self::Validation(ValidationReason::CouponNotApplicable {
                    code,
                    scope: CouponScope::MenuItem(item),
                })
            }
            CouponError::MinimumOrderNotMet {
                code,
                required,
                subtotal,
            } => Self::Validation(ValidationReason::MinimumOrderNotMet {
                code,
                required,
                subtotal,
            }),
            CouponError::Amount(error) => error.into(),
        }
    }
}

impl From<OrderError> for Classified {
    fn from(error: OrderError) -> Self {
        match error {
            OrderError::EmptyCart => Self::Validation(ValidationReason::EmptyCart),
            OrderError::RestaurantMismatch { restaurant } => {
                Self::NotFound(Missing::Restaurant(restaurant))
            }
            OrderError::LinesUnavailable(conflicts) => {
                Self::Conflict(ConflictReason::ItemNoLongerAvailable(conflicts))
            }
            OrderError::MinimumNotMet {
                required,
                shortfall,
            } => Self::Validation(ValidationReason::MinimumNotMet {
                required,
                shortfall,
            }),
            OrderError::CouponNotFound { code } => {
                Self::NotFound(Missing::InvalidCoupon { code })
            }
            OrderError::Coupon(error) => error.into(),
            OrderError::InvalidStatusTransition { from, to } => {
                Self::Validation(ValidationReason::StatusTransition { from, to })
            }
            OrderError::InvalidPaymentTransition { from, to } => {
                Self::Validation(ValidationReason::PaymentTransition { from, to })
            }
            OrderError::Amount(error) => error.into(),
        }
    }
}
