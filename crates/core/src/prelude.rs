//! Platter prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{
        Cart, CartError, CartId, CartLine, CartLineId, CartLineUpdate, CartOwner, DeliveryType,
        MAX_LINE_QUANTITY, NewCartLine,
    },
    catalog::{
        MenuItem, MenuItemId, MenuOption, OptionGroup, OptionGroupId, OptionId, Restaurant,
        RestaurantId, SelectionType,
    },
    coupons::{Coupon, CouponDiscount, CouponError, CouponId, normalize_code},
    delivery::{DeliveryCheck, check_minimum, delivery_fee},
    fixtures::{Fixture, FixtureError},
    ids::TypedUuid,
    money::AmountError,
    options::{ResolvedSelection, SelectedOption, Selection, SelectionError, resolve_selection},
    orders::{
        CheckoutSnapshot, LineConflict, LineConflictReason, Order, OrderError, OrderId, OrderLine,
        OrderStatus, OrderedOption, PaymentMethod, PaymentStatus, RedeemedCoupon, build_order,
    },
    receipt::{ReceiptError, write_order_receipt},
    totals::{AppliedCoupon, CartTotals, CouponRejection, PricedCart, price_cart},
};
