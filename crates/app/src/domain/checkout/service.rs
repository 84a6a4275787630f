//! Checkout service.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use platter::prelude::*;
use rustc_hash::FxHashMap;
use tracing::{Span, info};

use crate::{
    domain::{
        checkout::errors::CheckoutError,
        errors::{Missing, ValidationReason},
    },
    stores::{CartStore, Catalog, CouponStore, StoreError, UnitOfWork},
};

/// [`CheckoutService`] that commits through a [`UnitOfWork`].
#[derive(Clone)]
pub struct DefaultCheckoutService {
    catalog: Arc<dyn Catalog>,
    coupons: Arc<dyn CouponStore>,
    carts: Arc<dyn CartStore>,
    uow: Arc<dyn UnitOfWork>,
}

impl DefaultCheckoutService {
    /// Wire the service to its collaborators.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn Catalog>,
        coupons: Arc<dyn CouponStore>,
        carts: Arc<dyn CartStore>,
        uow: Arc<dyn UnitOfWork>,
    ) -> Self {
        Self {
            catalog,
            coupons,
            carts,
            uow,
        }
    }

    /// Current catalog state for every distinct menu item on the cart. Deleted items are
    /// left out so the order builder reports them as removed.
    async fn current_items(
        &self,
        cart: &Cart,
    ) -> Result<FxHashMap<MenuItemId, MenuItem>, CheckoutError> {
        let mut items = FxHashMap::default();

        for id in cart.lines.iter().map(|line| line.menu_item) {
            if items.contains_key(&id) {
                continue;
            }

            match self.catalog.get_menu_item(id).await {
                Ok(item) => {
                    items.insert(id, item);
                }
                Err(StoreError::NotFound) => {}
                Err(error) => return Err(error.into()),
            }
        }

        Ok(items)
    }

    async fn current_coupon(&self, cart: &Cart) -> Result<Option<Coupon>, CheckoutError> {
        let Some(code) = cart.coupon_code.as_deref() else {
            return Ok(None);
        };

        match self.coupons.get_coupon_by_code(code).await {
            Ok(coupon) => Ok(Some(coupon)),
            Err(StoreError::NotFound) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    /// Write the order, usage increment and cart clear as one unit.
    async fn persist(&self, cart: &Cart, order: Order) -> Result<Order, CheckoutError> {
        let mut tx = self.uow.begin().await?;

        if let Some(coupon) = &order.coupon {
            let usage_count = tx
                .increment_coupon_usage(coupon.id, coupon.max_usage)
                .await
                .map_err(|error| match error {
                    StoreError::Conflict => {
                        CheckoutError::Validation(ValidationReason::CouponExhausted {
                            code: coupon.code.clone(),
                        })
                    }
                    StoreError::NotFound => CheckoutError::NotFound(Missing::InvalidCoupon {
                        code: coupon.code.clone(),
                    }),
                    other => other.into(),
                })?;

            Span::current().record("coupon_usage", usage_count);
        }

        let order = tx.create_order(order).await?;

        tx.clear_cart(cart.id, cart.version).await?;

        tx.commit().await?;

        Ok(order)
    }
}

impl fmt::Debug for DefaultCheckoutService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultCheckoutService")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CheckoutService for DefaultCheckoutService {
    #[tracing::instrument(
        name = "checkout.service.finalize",
        skip(self),
        fields(
            owner = %owner,
            payment_method = payment_method.as_str(),
            cart_id = tracing::field::Empty,
            order_id = tracing::field::Empty,
            total = tracing::field::Empty,
            coupon_usage = tracing::field::Empty
        ),
        err
    )]
    async fn finalize(
        &self,
        owner: CartOwner,
        payment_method: PaymentMethod,
        point_in_time: Timestamp,
    ) -> Result<Order, CheckoutError> {
        let cart = self
            .carts
            .find_cart(&owner)
            .await?
            .ok_or(CheckoutError::Validation(ValidationReason::EmptyCart))?;

        let span = Span::current();
        span.record("cart_id", tracing::field::display(cart.id));

        let restaurant_id = match cart.restaurant {
            Some(id) if !cart.is_empty() => id,
            _ => return Err(CheckoutError::Validation(ValidationReason::EmptyCart)),
        };

        let restaurant = self
            .catalog
            .get_restaurant(restaurant_id)
            .await
            .map_err(CheckoutError::or_missing(Missing::Restaurant(restaurant_id)))?;

        let items = self.current_items(&cart).await?;
        let coupon = self.current_coupon(&cart).await?;

        let order = build_order(
            &cart,
            &CheckoutSnapshot {
                restaurant: &restaurant,
                items: &items,
                coupon: coupon.as_ref(),
            },
            payment_method,
            point_in_time,
        )?;

        let order = self.persist(&cart, order).await?;

        span.record("order_id", tracing::field::display(order.id));
        span.record("total", order.totals.total);

        info!(
            order_id = %order.id,
            cart_id = %cart.id,
            total = order.totals.total,
            "created order"
        );

        Ok(order)
    }
}

/// Turns carts into orders.
#[automock]
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Re-validate the owner's cart against current catalog and coupon state and turn it
    /// into a pending order.
    ///
    /// The order, the coupon redemption and the cart clear are committed together or not
    /// at all.
    async fn finalize(
        &self,
        owner: CartOwner,
        payment_method: PaymentMethod,
        point_in_time: Timestamp,
    ) -> Result<Order, CheckoutError>;
}
