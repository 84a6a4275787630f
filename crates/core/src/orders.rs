//! Orders
//!
//! Converting a cart into an immutable order. Every line is re-resolved against the current
//! catalog, totals are recomputed from scratch, and names and prices are deep-copied so
//! later catalog edits cannot leak into the order.

use std::fmt::{self, Display};

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    cart::{Cart, CartError, CartId, CartLine, CartLineId, CartOwner, DeliveryType},
    catalog::{MenuItem, MenuItemId, OptionGroupId, OptionId, Restaurant, RestaurantId},
    coupons::{Coupon, CouponError, CouponId},
    delivery::{check_minimum, delivery_fee},
    ids::TypedUuid,
    money::AmountError,
    options::SelectionError,
    totals::CartTotals,
};

/// Order identifier.
pub type OrderId = TypedUuid<Order>;

/// Order line identifier.
pub type OrderLineId = TypedUuid<OrderLine>;

/// Why a cart line can no longer be ordered as it stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineConflictReason {
    /// The menu item no longer exists.
    ItemRemoved,

    /// The menu item is switched off.
    ItemUnavailable,

    /// The menu item moved to another restaurant.
    ItemMoved,

    /// A selected option is switched off.
    OptionUnavailable {
        /// Option group
        group: OptionGroupId,
        /// Option
        option: OptionId,
    },

    /// The stored selections no longer satisfy the item's option groups.
    SelectionInvalid(SelectionError),
}

/// A cart line that failed re-validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineConflict {
    /// Offending cart line
    pub line: CartLineId,

    /// Menu item the line refers to
    pub menu_item: MenuItemId,

    /// What changed
    pub reason: LineConflictReason,
}

/// Errors from building an order.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// The cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// The cart is not bound to the restaurant supplied.
    #[error("cart is not bound to restaurant {restaurant}")]
    RestaurantMismatch {
        /// Restaurant supplied
        restaurant: RestaurantId,
    },

    /// One or more lines can no longer be ordered.
    #[error("{} cart line(s) are no longer available", .0.len())]
    LinesUnavailable(Vec<LineConflict>),

    /// Delivery orders must reach the restaurant's minimum.
    #[error("delivery minimum of {required} not met, {shortfall} short")]
    MinimumNotMet {
        /// Restaurant minimum, in minor units
        required: u64,
        /// Amount still needed, in minor units
        shortfall: u64,
    },

    /// A coupon code is set but no such coupon exists.
    #[error("coupon {code} not found")]
    CouponNotFound {
        /// Coupon code
        code: String,
    },

    /// The applied coupon is no longer eligible.
    #[error(transparent)]
    Coupon(CouponError),

    /// Requested status change is not allowed.
    #[error("order cannot move from {from} to {to}")]
    InvalidStatusTransition {
        /// Current status
        from: OrderStatus,
        /// Requested status
        to: OrderStatus,
    },

    /// Requested payment status change is not allowed.
    #[error("payment cannot move from {from} to {to}")]
    InvalidPaymentTransition {
        /// Current status
        from: PaymentStatus,
        /// Requested status
        to: PaymentStatus,
    },

    /// Wrapped money arithmetic error.
    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// Order lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    /// Created, awaiting restaurant confirmation
    #[default]
    Pending,
    /// Accepted by the restaurant
    Confirmed,
    /// Being cooked
    Preparing,
    /// Ready for hand-off
    Ready,
    /// With a courier
    OutForDelivery,
    /// Handed to the customer
    Delivered,
    /// Abandoned before completion
    Cancelled,
}

impl OrderStatus {
    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further transitions are possible.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether moving to `next` is a valid step.
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (from, Self::Cancelled) => !from.is_terminal(),
            (Self::Pending, Self::Confirmed)
            | (Self::Confirmed, Self::Preparing)
            | (Self::Preparing, Self::Ready)
            | (Self::Ready, Self::OutForDelivery | Self::Delivered)
            | (Self::OutForDelivery, Self::Delivered) => true,
            _ => false,
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    /// Not yet settled
    #[default]
    Pending,
    /// Settled
    Paid,
    /// Declined or abandoned
    Failed,
    /// Returned to the customer
    Refunded,
}

impl PaymentStatus {
    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    /// Whether moving to `next` is a valid step.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Paid | Self::Failed) | (Self::Paid, Self::Refunded)
        )
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    /// Card payment, settled by the payment gateway
    Card,
    /// Cash on delivery or collection
    Cash,
}

impl PaymentMethod {
    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Cash => "cash",
        }
    }
}

/// Frozen copy of a selected option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedOption {
    /// Option group name at order time
    pub group_name: String,

    /// Option name at order time
    pub name: String,

    /// Price charged per unit (zero for free selections)
    pub price: u64,
}

/// Frozen copy of a cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    /// Line id
    pub id: OrderLineId,

    /// Menu item the line was ordered from; informational only
    pub menu_item: MenuItemId,

    /// Item name at order time
    pub item_name: String,

    /// Base unit price at order time
    pub unit_price: u64,

    /// Quantity
    pub quantity: u32,

    /// Selected options at order time
    pub options: SmallVec<[OrderedOption; 4]>,

    /// Special instructions
    pub instructions: Option<String>,

    /// `(unit_price + sum of option prices) * quantity`
    pub total: u64,
}

/// Coupon redeemed by an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemedCoupon {
    /// Coupon id
    pub id: CouponId,

    /// Code at order time
    pub code: String,

    /// Usage cap at order time
    pub max_usage: Option<u32>,
}

/// An immutable order snapshot. Only `status` and `payment_status` change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Order id
    pub id: OrderId,

    /// Cart the order was created from
    pub cart: CartId,

    /// Customer
    pub owner: CartOwner,

    /// Restaurant
    pub restaurant: RestaurantId,

    /// Restaurant name at order time
    pub restaurant_name: String,

    /// Lifecycle status
    pub status: OrderStatus,

    /// Payment status
    pub payment_status: PaymentStatus,

    /// Payment method
    pub payment_method: PaymentMethod,

    /// Delivery or collection
    pub delivery_type: DeliveryType,

    /// Redeemed coupon, if any
    pub coupon: Option<RedeemedCoupon>,

    /// Monetary snapshot
    pub totals: CartTotals,

    /// Lines in cart order
    pub lines: Vec<OrderLine>,

    /// Creation time
    pub created_at: Timestamp,
}

impl Order {
    /// Move to `next` if the lifecycle allows it.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::InvalidStatusTransition`] otherwise.
    pub fn transition_to(&mut self, next: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }

        self.status = next;

        Ok(())
    }

    /// Move the payment to `next` if allowed.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::InvalidPaymentTransition`] otherwise.
    pub fn transition_payment_to(&mut self, next: PaymentStatus) -> Result<(), OrderError> {
        if !self.payment_status.can_transition_to(next) {
            return Err(OrderError::InvalidPaymentTransition {
                from: self.payment_status,
                to: next,
            });
        }

        self.payment_status = next;

        Ok(())
    }
}

/// Current catalog state needed to finalise a cart.
#[derive(Debug)]
pub struct CheckoutSnapshot<'a> {
    /// Restaurant the cart is bound to
    pub restaurant: &'a Restaurant,

    /// Current menu items for every line, keyed by id; absent means removed
    pub items: &'a FxHashMap<MenuItemId, MenuItem>,

    /// Coupon looked up by the cart's code, if one is applied and exists
    pub coupon: Option<&'a Coupon>,
}

/// Re-validate `cart` against `snapshot` and freeze it into a pending order.
///
/// Checks run in order: empty cart, line availability (every offending line is reported),
/// delivery minimum, coupon eligibility.
///
/// # Errors
///
/// Returns the first failing check as an [`OrderError`].
pub fn build_order(
    cart: &Cart,
    snapshot: &CheckoutSnapshot<'_>,
    payment_method: PaymentMethod,
    now: Timestamp,
) -> Result<Order, OrderError> {
    if cart.is_empty() {
        return Err(OrderError::EmptyCart);
    }

    let restaurant = snapshot.restaurant;

    if cart.restaurant != Some(restaurant.id) {
        return Err(OrderError::RestaurantMismatch {
            restaurant: restaurant.id,
        });
    }

    let repriced = reprice_lines(cart, restaurant.id, snapshot.items)?;

    let current = Cart {
        lines: repriced,
        ..cart.clone()
    };

    let subtotal = current.subtotal()?;

    let coupon = match (&current.coupon_code, snapshot.coupon) {
        (None, _) => None,
        (Some(code), None) => Some(Err(OrderError::CouponNotFound { code: code.clone() })),
        (Some(_), Some(coupon)) => Some(match coupon.redeem(&current, now) {
            Ok(discount) => Ok((coupon, discount)),
            Err(CouponError::Amount(err)) => return Err(err.into()),
            Err(err) => Err(OrderError::Coupon(err)),
        }),
    };

    let discount = match &coupon {
        Some(Ok((_, discount))) => *discount,
        _ => 0,
    };

    let fee = delivery_fee(current.delivery_type, restaurant);
    let totals = CartTotals::new(subtotal, discount, fee)?;

    let check = check_minimum(
        current.delivery_type,
        restaurant,
        totals.subtotal_after_discount(),
    );

    if !check.met {
        return Err(OrderError::MinimumNotMet {
            required: restaurant.minimum_delivery,
            shortfall: check.shortfall,
        });
    }

    let redeemed = coupon.transpose()?.map(|(coupon, _)| RedeemedCoupon {
        id: coupon.id,
        code: coupon.code.clone(),
        max_usage: coupon.max_usage,
    });

    let lines = current
        .lines
        .iter()
        .map(freeze_line)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Order {
        id: OrderId::generate(),
        cart: current.id,
        owner: current.owner.clone(),
        restaurant: restaurant.id,
        restaurant_name: restaurant.name.clone(),
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
        payment_method,
        delivery_type: current.delivery_type,
        coupon: redeemed,
        totals,
        lines,
        created_at: now,
    })
}

fn reprice_lines(
    cart: &Cart,
    restaurant: RestaurantId,
    items: &FxHashMap<MenuItemId, MenuItem>,
) -> Result<Vec<CartLine>, OrderError> {
    let mut repriced = Vec::with_capacity(cart.lines.len());
    let mut conflicts = Vec::new();

    for line in &cart.lines {
        let conflict = |reason| LineConflict {
            line: line.id,
            menu_item: line.menu_item,
            reason,
        };

        let Some(item) = items.get(&line.menu_item) else {
            conflicts.push(conflict(LineConflictReason::ItemRemoved));
            continue;
        };

        if item.restaurant != restaurant {
            conflicts.push(conflict(LineConflictReason::ItemMoved));
            continue;
        }

        match line.reprice(item) {
            Ok(current) => repriced.push(current),
            Err(CartError::Amount(err)) => return Err(err.into()),
            Err(CartError::Selection(SelectionError::OptionUnavailable { group, option })) => {
                conflicts.push(conflict(LineConflictReason::OptionUnavailable { group, option }));
            }
            Err(CartError::Selection(SelectionError::Amount(err))) => return Err(err.into()),
            Err(CartError::Selection(err)) => {
                conflicts.push(conflict(LineConflictReason::SelectionInvalid(err)));
            }
            Err(_) => conflicts.push(conflict(LineConflictReason::ItemUnavailable)),
        }
    }

    if conflicts.is_empty() {
        Ok(repriced)
    } else {
        Err(OrderError::LinesUnavailable(conflicts))
    }
}

fn freeze_line(line: &CartLine) -> Result<OrderLine, OrderError> {
    Ok(OrderLine {
        id: OrderLineId::generate(),
        menu_item: line.menu_item,
        item_name: line.item_name.clone(),
        unit_price: line.unit_price,
        quantity: line.quantity,
        options: line
            .options
            .iter()
            .map(|option| OrderedOption {
                group_name: option.group_name.clone(),
                name: option.name.clone(),
                price: option.charged_price,
            })
            .collect(),
        instructions: line.instructions.clone(),
        total: line.total()?,
    })
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use testresult::TestResult;

    use crate::{
        cart::NewCartLine,
        catalog::{MenuOption, OptionGroup, SelectionType},
        coupons::CouponDiscount,
        options::Selection,
    };

    use super::*;

    struct Fixture {
        restaurant: Restaurant,
        pizza: MenuItem,
        coupon: Coupon,
        cart: Cart,
    }

    fn now() -> Timestamp {
        Timestamp::UNIX_EPOCH
    }

    fn fixture() -> Result<Fixture, CartError> {
        let restaurant = Restaurant {
            id: RestaurantId::generate(),
            name: "Napoli".to_string(),
            minimum_delivery: 15_00,
            delivery_fee: 0,
        };

        let extras = OptionGroup {
            id: OptionGroupId::generate(),
            name: "Extras".to_string(),
            selection_type: SelectionType::Multiple,
            min_selections: 0,
            max_selections: None,
            free_selections: 0,
            is_required: false,
            options: vec![MenuOption {
                id: OptionId::generate(),
                name: "Burrata".to_string(),
                additional_price: 1_50,
                is_default: false,
                is_available: true,
            }],
        };

        let selection = Selection::new(extras.id, extras.options.iter().map(|o| o.id));

        let pizza = MenuItem {
            id: MenuItemId::generate(),
            restaurant: restaurant.id,
            name: "Margherita".to_string(),
            price: 10_00,
            is_available: true,
            option_groups: vec![extras],
        };

        let coupon = Coupon {
            id: CouponId::generate(),
            code: "TENOFF".to_string(),
            discount: CouponDiscount::Percentage(Percentage::from(0.1)),
            minimum_order: 0,
            maximum_discount: None,
            valid_from: None,
            valid_to: None,
            max_usage: Some(5),
            usage_count: 0,
            restaurant: None,
            menu_item: None,
            is_active: true,
        };

        let mut cart = Cart::new(CartOwner::Session("s".to_string()), now());
        cart.add_line(
            &pizza,
            NewCartLine {
                menu_item: pizza.id,
                quantity: 2,
                selections: vec![selection],
                instructions: Some("extra crispy".to_string()),
            },
            now(),
        )?;
        cart.set_coupon("TENOFF".to_string(), now());

        Ok(Fixture {
            restaurant,
            pizza,
            coupon,
            cart,
        })
    }

    fn items(item: &MenuItem) -> FxHashMap<MenuItemId, MenuItem> {
        let mut items = FxHashMap::default();
        items.insert(item.id, item.clone());
        items
    }

    #[test]
    fn builds_pending_order_with_snapshot() -> TestResult {
        let f = fixture()?;
        let items = items(&f.pizza);

        let order = build_order(
            &f.cart,
            &CheckoutSnapshot {
                restaurant: &f.restaurant,
                items: &items,
                coupon: Some(&f.coupon),
            },
            PaymentMethod::Card,
            now(),
        )?;

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.totals.subtotal, 23_00);
        assert_eq!(order.totals.discount, 2_30);
        assert_eq!(order.totals.total, 20_70);

        let line = order.lines.first().ok_or("order should have a line")?;
        assert_eq!(line.item_name, "Margherita");
        assert_eq!(line.unit_price, 10_00);
        assert_eq!(line.total, 23_00);
        assert_eq!(line.options.first().map(|o| o.name.as_str()), Some("Burrata"));
        assert_eq!(line.instructions.as_deref(), Some("extra crispy"));
        assert_eq!(order.coupon.map(|c| c.id), Some(f.coupon.id));

        Ok(())
    }

    #[test]
    fn uses_current_catalog_prices() -> TestResult {
        let mut f = fixture()?;
        f.pizza.price = 11_00;
        let items = items(&f.pizza);

        let order = build_order(
            &f.cart,
            &CheckoutSnapshot {
                restaurant: &f.restaurant,
                items: &items,
                coupon: None,
            },
            PaymentMethod::Cash,
            now(),
        );

        assert_eq!(
            order,
            Err(OrderError::CouponNotFound {
                code: "TENOFF".to_string()
            })
        );

        f.cart.remove_coupon(now());
        let order = build_order(
            &f.cart,
            &CheckoutSnapshot {
                restaurant: &f.restaurant,
                items: &items,
                coupon: None,
            },
            PaymentMethod::Cash,
            now(),
        )?;

        assert_eq!(order.totals.subtotal, 25_00);

        Ok(())
    }

    #[test]
    fn empty_cart_is_rejected() -> TestResult {
        let mut f = fixture()?;
        f.cart.clear(now());
        let items = items(&f.pizza);

        let result = build_order(
            &f.cart,
            &CheckoutSnapshot {
                restaurant: &f.restaurant,
                items: &items,
                coupon: None,
            },
            PaymentMethod::Card,
            now(),
        );

        assert_eq!(result, Err(OrderError::EmptyCart));

        Ok(())
    }

    #[test]
    fn every_unavailable_line_is_reported() -> TestResult {
        let mut f = fixture()?;
        let mut salad = f.pizza.clone();
        salad.id = MenuItemId::generate();
        salad.name = "Salad".to_string();

        f.cart.add_line(
            &salad,
            NewCartLine {
                menu_item: salad.id,
                quantity: 1,
                selections: Vec::new(),
                instructions: None,
            },
            now(),
        )?;

        f.pizza.is_available = false;
        let items = items(&f.pizza);

        let result = build_order(
            &f.cart,
            &CheckoutSnapshot {
                restaurant: &f.restaurant,
                items: &items,
                coupon: Some(&f.coupon),
            },
            PaymentMethod::Card,
            now(),
        );

        let Err(OrderError::LinesUnavailable(conflicts)) = result else {
            return Err(format!("expected LinesUnavailable, got {result:?}").into());
        };

        let reasons: Vec<_> = conflicts.into_iter().map(|c| (c.menu_item, c.reason)).collect();
        assert_eq!(
            reasons,
            vec![
                (f.pizza.id, LineConflictReason::ItemUnavailable),
                (salad.id, LineConflictReason::ItemRemoved),
            ]
        );

        Ok(())
    }

    #[test]
    fn unavailable_option_is_a_line_conflict() -> TestResult {
        let mut f = fixture()?;

        let group = f.pizza.option_groups.first_mut().ok_or("group")?;
        let option = group.options.first_mut().ok_or("option")?;
        option.is_available = false;
        let (group_id, option_id) = (group.id, option.id);

        let items = items(&f.pizza);

        let result = build_order(
            &f.cart,
            &CheckoutSnapshot {
                restaurant: &f.restaurant,
                items: &items,
                coupon: Some(&f.coupon),
            },
            PaymentMethod::Card,
            now(),
        );

        assert!(matches!(
            result,
            Err(OrderError::LinesUnavailable(ref conflicts))
                if conflicts.iter().any(|c| c.reason == LineConflictReason::OptionUnavailable {
                    group: group_id,
                    option: option_id,
                })
        ));

        Ok(())
    }

    #[test]
    fn minimum_checked_before_coupon() -> TestResult {
        let mut f = fixture()?;
        f.restaurant.minimum_delivery = 50_00;
        f.coupon.is_active = false;
        let items = items(&f.pizza);

        let result = build_order(
            &f.cart,
            &CheckoutSnapshot {
                restaurant: &f.restaurant,
                items: &items,
                coupon: Some(&f.coupon),
            },
            PaymentMethod::Card,
            now(),
        );

        assert_eq!(
            result,
            Err(OrderError::MinimumNotMet {
                required: 50_00,
                shortfall: 27_00
            })
        );

        Ok(())
    }

    #[test]
    fn exhausted_coupon_fails_finalisation() -> TestResult {
        let mut f = fixture()?;
        f.coupon.usage_count = 5;
        let items = items(&f.pizza);

        let result = build_order(
            &f.cart,
            &CheckoutSnapshot {
                restaurant: &f.restaurant,
                items: &items,
                coupon: Some(&f.coupon),
            },
            PaymentMethod::Card,
            now(),
        );

        assert!(matches!(
            result,
            Err(OrderError::Coupon(CouponError::Exhausted { max_usage: 5, .. }))
        ));

        Ok(())
    }

    #[test]
    fn snapshot_survives_catalog_edits() -> TestResult {
        let mut f = fixture()?;
        let items_now = items(&f.pizza);

        let order = build_order(
            &f.cart,
            &CheckoutSnapshot {
                restaurant: &f.restaurant,
                items: &items_now,
                coupon: Some(&f.coupon),
            },
            PaymentMethod::Card,
            now(),
        )?;
        let before = order.clone();

        f.pizza.name = "Renamed".to_string();
        f.pizza.price = 99_00;
        drop(items_now);

        assert_eq!(order, before);
        assert_eq!(order.lines.first().map(|l| l.item_name.as_str()), Some("Margherita"));

        Ok(())
    }

    #[test]
    fn status_transitions_follow_lifecycle() -> TestResult {
        use OrderStatus::{
            Cancelled, Confirmed, Delivered, OutForDelivery, Pending, Preparing, Ready,
        };

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Preparing));
        assert!(Preparing.can_transition_to(Ready));
        assert!(Ready.can_transition_to(OutForDelivery));
        assert!(Ready.can_transition_to(Delivered));
        assert!(OutForDelivery.can_transition_to(Delivered));
        assert!(Preparing.can_transition_to(Cancelled));

        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));

        let f = fixture()?;
        let items = items(&f.pizza);
        let mut order = build_order(
            &f.cart,
            &CheckoutSnapshot {
                restaurant: &f.restaurant,
                items: &items,
                coupon: Some(&f.coupon),
            },
            PaymentMethod::Card,
            now(),
        )?;

        order.transition_to(Confirmed)?;
        assert_eq!(
            order.transition_to(Delivered),
            Err(OrderError::InvalidStatusTransition {
                from: Confirmed,
                to: Delivered
            })
        );

        order.transition_payment_to(PaymentStatus::Paid)?;
        order.transition_payment_to(PaymentStatus::Refunded)?;
        assert!(order.transition_payment_to(PaymentStatus::Paid).is_err());

        Ok(())
    }
}
