//! Presentation projections.
//!
//! Views are plain serialisable records built from priced carts and orders. Money is
//! rendered as a two-decimal amount (`"23.00"`).

use jiff::Timestamp;
use platter::{money, prelude::*};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// A cart as shown to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    /// Cart id
    pub id: Uuid,

    /// Owner, as `user:<id>` or `session:<id>`
    pub owner: String,

    /// Restaurant the cart is bound to
    pub restaurant: Option<Uuid>,

    /// `delivery` or `collection`
    pub delivery_type: &'static str,

    /// Lines in the order they were added
    pub lines: Vec<CartLineView>,

    /// Sum of line totals
    pub subtotal: Decimal,

    /// Coupon discount
    pub discount: Decimal,

    /// Delivery fee, zero for collection
    pub delivery_fee: Decimal,

    /// Amount payable
    pub total: Decimal,

    /// Delivery minimum status, absent for an unbound cart
    pub delivery: Option<DeliveryView>,

    /// Applied coupon, if a code is set
    pub coupon: Option<CouponView>,

    /// Optimistic concurrency version
    pub version: u64,
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLineView {
    /// Line id
    pub id: Uuid,

    /// Menu item id
    pub menu_item: Uuid,

    /// Menu item name
    pub name: String,

    /// Quantity
    pub quantity: u32,

    /// Base item price
    pub unit_price: Decimal,

    /// Per-unit option charges
    pub options_price: Decimal,

    /// `(unit_price + options_price) * quantity`
    pub total: Decimal,

    /// Chosen options
    pub options: Vec<OptionView>,

    /// Special instructions
    pub instructions: Option<String>,
}

/// A chosen option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    /// Option group name
    pub group: String,

    /// Option name
    pub name: String,

    /// Amount charged per unit
    pub price: Decimal,
}

/// Delivery minimum status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeliveryView {
    /// Whether the minimum is reached
    pub met: bool,

    /// Amount still needed
    pub shortfall: Decimal,
}

/// Applied coupon status. `reason` explains a zero discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CouponView {
    /// Normalised code
    pub code: String,

    /// Discount granted
    pub discount: Decimal,

    /// Whether the coupon currently applies
    pub applied: bool,

    /// Why it does not
    pub reason: Option<String>,
}

impl CartView {
    /// Project a priced cart.
    ///
    /// # Errors
    ///
    /// Returns an [`AmountError`] if a line total overflows.
    pub fn from_priced(priced: &PricedCart) -> Result<Self, AmountError> {
        let lines = priced
            .cart
            .lines
            .iter()
            .map(CartLineView::from_line)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: priced.cart.id.into_uuid(),
            owner: priced.cart.owner.to_string(),
            restaurant: priced.cart.restaurant.map(TypedUuid::into_uuid),
            delivery_type: priced.cart.delivery_type.as_str(),
            lines,
            subtotal: money::to_decimal(priced.totals.subtotal),
            discount: money::to_decimal(priced.totals.discount),
            delivery_fee: money::to_decimal(priced.totals.delivery_fee),
            total: money::to_decimal(priced.totals.total),
            delivery: priced.delivery.map(|check| DeliveryView {
                met: check.met,
                shortfall: money::to_decimal(check.shortfall),
            }),
            coupon: priced.coupon.as_ref().map(CouponView::from_applied),
            version: priced.cart.version,
        })
    }
}

impl CartLineView {
    fn from_line(line: &CartLine) -> Result<Self, AmountError> {
        Ok(Self {
            id: line.id.into_uuid(),
            menu_item: line.menu_item.into_uuid(),
            name: line.item_name.clone(),
            quantity: line.quantity,
            unit_price: money::to_decimal(line.unit_price),
            options_price: money::to_decimal(line.options_price),
            total: money::to_decimal(line.total()?),
            options: line
                .options
                .iter()
                .map(|option| OptionView {
                    group: option.group_name.clone(),
                    name: option.name.clone(),
                    price: money::to_decimal(option.charged_price),
                })
                .collect(),
            instructions: line.instructions.clone(),
        })
    }
}

impl CouponView {
    fn from_applied(applied: &AppliedCoupon) -> Self {
        Self {
            code: applied.code.clone(),
            discount: money::to_decimal(applied.discount),
            applied: applied.rejection.is_none(),
            reason: applied.rejection.as_ref().map(|rejection| match rejection {
                CouponRejection::NotFound => "coupon no longer exists".to_string(),
                CouponRejection::Ineligible(error) => error.to_string(),
            }),
        }
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
    /// Order id
    pub id: Uuid,

    /// Restaurant name at order time
    pub restaurant: String,

    /// Lifecycle status
    pub status: &'static str,

    /// Payment status
    pub payment_status: &'static str,

    /// `card` or `cash`
    pub payment_method: &'static str,

    /// `delivery` or `collection`
    pub delivery_type: &'static str,

    /// Redeemed coupon code
    pub coupon_code: Option<String>,

    /// Frozen lines
    pub lines: Vec<OrderLineView>,

    /// Sum of line totals
    pub subtotal: Decimal,

    /// Coupon discount
    pub discount: Decimal,

    /// Delivery fee
    pub delivery_fee: Decimal,

    /// Amount payable
    pub total: Decimal,

    /// Creation time
    pub created_at: Timestamp,
}

/// One frozen order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLineView {
    /// Item name at order time
    pub name: String,

    /// Quantity
    pub quantity: u32,

    /// Base item price at order time
    pub unit_price: Decimal,

    /// Options at order time
    pub options: Vec<OptionView>,

    /// Special instructions
    pub instructions: Option<String>,

    /// Line total
    pub total: Decimal,
}

impl OrderView {
    /// Project an order snapshot.
    pub fn from_order(order: &Order) -> Self {
        Self {
            id: order.id.into_uuid(),
            restaurant: order.restaurant_name.clone(),
            status: order.status.as_str(),
            payment_status: order.payment_status.as_str(),
            payment_method: order.payment_method.as_str(),
            delivery_type: order.delivery_type.as_str(),
            coupon_code: order.coupon.as_ref().map(|coupon| coupon.code.clone()),
            lines: order
                .lines
                .iter()
                .map(|line| OrderLineView {
                    name: line.item_name.clone(),
                    quantity: line.quantity,
                    unit_price: money::to_decimal(line.unit_price),
                    options: line
                        .options
                        .iter()
                        .map(|option| OptionView {
                            group: option.group_name.clone(),
                            name: option.name.clone(),
                            price: money::to_decimal(option.price),
                        })
                        .collect(),
                    instructions: line.instructions.clone(),
                    total: money::to_decimal(line.total),
                })
                .collect(),
            subtotal: money::to_decimal(order.totals.subtotal),
            discount: money::to_decimal(order.totals.discount),
            delivery_fee: money::to_decimal(order.totals.delivery_fee),
            total: money::to_decimal(order.totals.total),
            created_at: order.created_at,
        }
    }
}
