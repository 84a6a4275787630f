//! Carts service.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use platter::prelude::*;
use tracing::{Span, info};

use crate::{
    domain::{carts::errors::CartsServiceError, errors::Missing},
    stores::{CartStore, Catalog, CouponStore, StoreError},
};

/// [`CartsService`] over the catalog, coupon and cart collaborators.
#[derive(Clone)]
pub struct DefaultCartsService {
    catalog: Arc<dyn Catalog>,
    coupons: Arc<dyn CouponStore>,
    carts: Arc<dyn CartStore>,
}

impl DefaultCartsService {
    /// Wire the service to its collaborators.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn Catalog>,
        coupons: Arc<dyn CouponStore>,
        carts: Arc<dyn CartStore>,
    ) -> Self {
        Self {
            catalog,
            coupons,
            carts,
        }
    }

    async fn load_cart(&self, owner: &CartOwner) -> Result<Cart, CartsServiceError> {
        self.carts
            .find_cart(owner)
            .await?
            .ok_or(CartsServiceError::NotFound(Missing::Cart))
    }

    async fn menu_item(&self, id: MenuItemId) -> Result<MenuItem, CartsServiceError> {
        self.catalog
            .get_menu_item(id)
            .await
            .map_err(CartsServiceError::or_missing(Missing::MenuItem(id)))
    }

    /// Recompute totals against current restaurant settings and coupon state.
    async fn price(&self, cart: Cart, now: Timestamp) -> Result<PricedCart, CartsServiceError> {
        let restaurant = match cart.restaurant {
            Some(id) => Some(
                self.catalog
                    .get_restaurant(id)
                    .await
                    .map_err(CartsServiceError::or_missing(Missing::Restaurant(id)))?,
            ),
            None => None,
        };

        let coupon = match cart.coupon_code.as_deref() {
            Some(code) => match self.coupons.get_coupon_by_code(code).await {
                Ok(coupon) => Some(coupon),
                Err(StoreError::NotFound) => None,
                Err(error) => return Err(error.into()),
            },
            None => None,
        };

        let priced = price_cart(cart, restaurant.as_ref(), coupon.as_ref(), now)?;

        let span = Span::current();
        span.record("cart_id", tracing::field::display(priced.cart.id));
        span.record("total", priced.totals.total);

        Ok(priced)
    }

    async fn save_and_price(
        &self,
        cart: Cart,
        now: Timestamp,
    ) -> Result<PricedCart, CartsServiceError> {
        let cart = self.carts.save_cart(cart).await?;

        self.price(cart, now).await
    }
}

impl fmt::Debug for DefaultCartsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultCartsService").finish_non_exhaustive()
    }
}

#[async_trait]
impl CartsService for DefaultCartsService {
    #[tracing::instrument(
        name = "carts.service.get_cart",
        skip(self),
        fields(
            owner = %owner,
            cart_id = tracing::field::Empty,
            total = tracing::field::Empty
        ),
        err
    )]
    async fn get_cart(
        &self,
        owner: CartOwner,
        point_in_time: Timestamp,
    ) -> Result<PricedCart, CartsServiceError> {
        let cart = match self.carts.find_cart(&owner).await? {
            Some(cart) => cart,
            None => Cart::new(owner, point_in_time),
        };

        self.price(cart, point_in_time).await
    }

    #[tracing::instrument(
        name = "carts.service.add_line",
        skip(self, line),
        fields(
            owner = %owner,
            menu_item = %line.menu_item,
            quantity = line.quantity,
            cart_id = tracing::field::Empty,
            line_id = tracing::field::Empty,
            total = tracing::field::Empty
        ),
        err
    )]
    async fn add_line(
        &self,
        owner: CartOwner,
        line: NewCartLine,
        point_in_time: Timestamp,
    ) -> Result<PricedCart, CartsServiceError> {
        let item = self.menu_item(line.menu_item).await?;

        let mut cart = match self.carts.find_cart(&owner).await? {
            Some(cart) => cart,
            None => Cart::new(owner, point_in_time),
        };

        let line_id = cart.add_line(&item, line, point_in_time)?;

        Span::current().record("line_id", tracing::field::display(line_id));

        let priced = self.save_and_price(cart, point_in_time).await?;

        info!(cart_id = %priced.cart.id, line_id = %line_id, "added cart line");

        Ok(priced)
    }

    #[tracing::instrument(
        name = "carts.service.update_line",
        skip(self, update),
        fields(
            owner = %owner,
            line_id = %line,
            cart_id = tracing::field::Empty,
            total = tracing::field::Empty
        ),
        err
    )]
    async fn update_line(
        &self,
        owner: CartOwner,
        line: CartLineId,
        update: CartLineUpdate,
        point_in_time: Timestamp,
    ) -> Result<PricedCart, CartsServiceError> {
        let mut cart = self.load_cart(&owner).await?;

        let menu_item = cart
            .line(line)
            .map(|existing| existing.menu_item)
            .ok_or(CartsServiceError::NotFound(Missing::CartLine(line)))?;

        let item = self.menu_item(menu_item).await?;

        cart.update_line(line, &item, update, point_in_time)?;

        let priced = self.save_and_price(cart, point_in_time).await?;

        info!(cart_id = %priced.cart.id, line_id = %line, "updated cart line");

        Ok(priced)
    }

    #[tracing::instrument(
        name = "carts.service.remove_line",
        skip(self),
        fields(
            owner = %owner,
            line_id = %line,
            cart_id = tracing::field::Empty,
            total = tracing::field::Empty
        ),
        err
    )]
    async fn remove_line(
        &self,
        owner: CartOwner,
        line: CartLineId,
        point_in_time: Timestamp,
    ) -> Result<PricedCart, CartsServiceError> {
        let mut cart = self.load_cart(&owner).await?;

        cart.remove_line(line, point_in_time)?;

        let priced = self.save_and_price(cart, point_in_time).await?;

        info!(cart_id = %priced.cart.id, line_id = %line, "removed cart line");

        Ok(priced)
    }

    #[tracing::instrument(
        name = "carts.service.clear_cart",
        skip(self),
        fields(
            owner = %owner,
            cart_id = tracing::field::Empty,
            total = tracing::field::Empty
        ),
        err
    )]
    async fn clear_cart(
        &self,
        owner: CartOwner,
        point_in_time: Timestamp,
    ) -> Result<PricedCart, CartsServiceError> {
        let mut cart = self.load_cart(&owner).await?;

        cart.clear(point_in_time);

        let priced = self.save_and_price(cart, point_in_time).await?;

        info!(cart_id = %priced.cart.id, "cleared cart");

        Ok(priced)
    }

    #[tracing::instrument(
        name = "carts.service.set_delivery_type",
        skip(self),
        fields(
            owner = %owner,
            delivery_type = delivery_type.as_str(),
            cart_id = tracing::field::Empty,
            total = tracing::field::Empty
        ),
        err
    )]
    async fn set_delivery_type(
        &self,
        owner: CartOwner,
        delivery_type: DeliveryType,
        point_in_time: Timestamp,
    ) -> Result<PricedCart, CartsServiceError> {
        let mut cart = self.load_cart(&owner).await?;

        cart.set_delivery_type(delivery_type, point_in_time);

        self.save_and_price(cart, point_in_time).await
    }

    #[tracing::instrument(
        name = "carts.service.apply_coupon",
        skip(self, code),
        fields(
            owner = %owner,
            coupon_code = tracing::field::Empty,
            cart_id = tracing::field::Empty,
            total = tracing::field::Empty
        ),
        err
    )]
    async fn apply_coupon(
        &self,
        owner: CartOwner,
        code: String,
        point_in_time: Timestamp,
    ) -> Result<PricedCart, CartsServiceError> {
        let code = normalize_code(&code);

        Span::current().record("coupon_code", code.as_str());

        let mut cart = self.load_cart(&owner).await?;

        let coupon = self
            .coupons
            .get_coupon_by_code(&code)
            .await
            .map_err(CartsServiceError::or_missing(Missing::InvalidCoupon {
                code: code.clone(),
            }))?;

        let discount = coupon.redeem(&cart, point_in_time)?;

        cart.set_coupon(coupon.code, point_in_time);

        let priced = self.save_and_price(cart, point_in_time).await?;

        info!(cart_id = %priced.cart.id, coupon_code = %code, discount, "applied coupon");

        Ok(priced)
    }

    #[tracing::instrument(
        name = "carts.service.remove_coupon",
        skip(self),
        fields(
            owner = %owner,
            cart_id = tracing::field::Empty,
            total = tracing::field::Empty
        ),
        err
    )]
    async fn remove_coupon(
        &self,
        owner: CartOwner,
        point_in_time: Timestamp,
    ) -> Result<PricedCart, CartsServiceError> {
        let mut cart = self.load_cart(&owner).await?;

        cart.remove_coupon(point_in_time);

        self.save_and_price(cart, point_in_time).await
    }
}

/// Cart operations for a single owner. Every result is priced on the way out.
#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// The owner's cart with freshly computed totals. An owner without a cart gets an empty,
    /// unsaved one.
    async fn get_cart(
        &self,
        owner: CartOwner,
        point_in_time: Timestamp,
    ) -> Result<PricedCart, CartsServiceError>;

    /// Add a line, creating the cart on first use.
    async fn add_line(
        &self,
        owner: CartOwner,
        line: NewCartLine,
        point_in_time: Timestamp,
    ) -> Result<PricedCart, CartsServiceError>;

    /// Change a line's quantity, selections or instructions.
    async fn update_line(
        &self,
        owner: CartOwner,
        line: CartLineId,
        update: CartLineUpdate,
        point_in_time: Timestamp,
    ) -> Result<PricedCart, CartsServiceError>;

    /// Remove a line.
    async fn remove_line(
        &self,
        owner: CartOwner,
        line: CartLineId,
        point_in_time: Timestamp,
    ) -> Result<PricedCart, CartsServiceError>;

    /// Remove every line and the applied coupon.
    async fn clear_cart(
        &self,
        owner: CartOwner,
        point_in_time: Timestamp,
    ) -> Result<PricedCart, CartsServiceError>;

    /// Switch between delivery and collection.
    async fn set_delivery_type(
        &self,
        owner: CartOwner,
        delivery_type: DeliveryType,
        point_in_time: Timestamp,
    ) -> Result<PricedCart, CartsServiceError>;

    /// Validate a coupon against the cart and record it, replacing any previous coupon.
    ///
    /// Usage counts are untouched until checkout.
    async fn apply_coupon(
        &self,
        owner: CartOwner,
        code: String,
        point_in_time: Timestamp,
    ) -> Result<PricedCart, CartsServiceError>;

    /// Drop the applied coupon.
    async fn remove_coupon(
        &self,
        owner: CartOwner,
        point_in_time: Timestamp,
    ) -> Result<PricedCart, CartsServiceError>;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jiff::Timestamp;
    use testresult::TestResult;

    use crate::{
        domain::errors::{ConflictReason, CouponScope, ValidationReason},
        stores::{MockCartStore, MockCatalog, MockCouponStore, StoreError},
        test::{TestContext, owner},
    };

    use super::*;

    #[tokio::test]
    async fn get_cart_without_cart_is_empty_and_unsaved() -> TestResult {
        let ctx = TestContext::new()?;
        let owner = owner("nobody");

        let priced = ctx.carts.get_cart(owner.clone(), Timestamp::now()).await?;

        assert!(priced.cart.is_empty(), "new cart should be empty");
        assert_eq!(priced.totals, CartTotals::default());
        assert_eq!(priced.delivery, None);
        assert_eq!(ctx.store.find_cart(&owner).await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn add_line_creates_cart_and_prices_it() -> TestResult {
        let ctx = TestContext::new()?;
        let owner = owner("alice");
        let now = Timestamp::now();

        let mut line = ctx.line("margherita", 2)?;
        line.selections = vec![ctx.selection("margherita", "extras", &["burrata"])?];

        let priced = ctx.carts.add_line(owner.clone(), line, now).await?;

        assert_eq!(priced.totals.subtotal, 23_00);
        assert_eq!(priced.totals.total, 23_00);
        assert_eq!(priced.delivery, Some(DeliveryCheck::MET));
        assert_eq!(priced.cart.version, 1);
        assert_eq!(
            ctx.store.find_cart(&owner).await?.map(|cart| cart.lines.len()),
            Some(1)
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_line_rejects_zero_quantity() -> TestResult {
        let ctx = TestContext::new()?;

        let result = ctx
            .carts
            .add_line(owner("alice"), ctx.line("margherita", 0)?, Timestamp::now())
            .await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::Validation(
                    ValidationReason::InvalidQuantity { quantity: 0 }
                ))
            ),
            "expected InvalidQuantity, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_line_from_another_restaurant_is_not_found() -> TestResult {
        let ctx = TestContext::new()?;
        let owner = owner("alice");
        let now = Timestamp::now();

        ctx.carts
            .add_line(owner.clone(), ctx.line("margherita", 1)?, now)
            .await?;

        let mapo = ctx.fixture.menu_item("mapo_tofu")?.id;
        let result = ctx
            .carts
            .add_line(owner, ctx.line("mapo_tofu", 1)?, now)
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound(Missing::MenuItem(item))) if item == mapo),
            "expected NotFound(MenuItem), got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_line_missing_required_selection_is_rejected() -> TestResult {
        let ctx = TestContext::new()?;
        let diavola = ctx.fixture.menu_item("diavola")?.clone();
        let crust = ctx.fixture.option_group("diavola", "crust")?;

        // Drop the default so the required crust group is left empty.
        let mut changed = diavola;
        for group in &mut changed.option_groups {
            for option in &mut group.options {
                option.is_default = false;
            }
        }
        ctx.store.upsert_menu_item(changed).await;

        let result = ctx
            .carts
            .add_line(owner("alice"), ctx.line("diavola", 1)?, Timestamp::now())
            .await;

        assert!(
            matches!(
                &result,
                Err(CartsServiceError::Validation(ValidationReason::Selection(
                    SelectionError::MissingRequiredSelection { group, .. }
                ))) if *group == crust
            ),
            "expected MissingRequiredSelection, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn update_line_changes_quantity() -> TestResult {
        let ctx = TestContext::new()?;
        let owner = owner("alice");
        let now = Timestamp::now();

        let priced = ctx
            .carts
            .add_line(owner.clone(), ctx.line("margherita", 1)?, now)
            .await?;
        let line = priced.cart.lines.first().map(|line| line.id).ok_or("no line")?;

        let priced = ctx
            .carts
            .update_line(
                owner,
                line,
                CartLineUpdate {
                    quantity: Some(3),
                    ..CartLineUpdate::default()
                },
                now,
            )
            .await?;

        assert_eq!(priced.totals.subtotal, 30_00);
        assert_eq!(priced.cart.version, 2);

        Ok(())
    }

    #[tokio::test]
    async fn update_unknown_line_is_not_found() -> TestResult {
        let ctx = TestContext::new()?;
        let owner = owner("alice");
        let now = Timestamp::now();

        ctx.carts
            .add_line(owner.clone(), ctx.line("margherita", 1)?, now)
            .await?;

        let line = CartLineId::generate();
        let result = ctx
            .carts
            .update_line(owner, line, CartLineUpdate::default(), now)
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound(Missing::CartLine(id))) if id == line),
            "expected NotFound(CartLine), got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn removing_last_line_unbinds_restaurant_on_next_add() -> TestResult {
        let ctx = TestContext::new()?;
        let owner = owner("alice");
        let now = Timestamp::now();

        let priced = ctx
            .carts
            .add_line(owner.clone(), ctx.line("margherita", 1)?, now)
            .await?;
        let line = priced.cart.lines.first().map(|line| line.id).ok_or("no line")?;

        let priced = ctx.carts.remove_line(owner.clone(), line, now).await?;

        assert!(priced.cart.is_empty(), "cart should be empty");

        let priced = ctx
            .carts
            .add_line(owner, ctx.line("mapo_tofu", 1)?, now)
            .await?;

        assert_eq!(
            priced.cart.restaurant,
            Some(ctx.fixture.restaurant("sichuan")?.id)
        );

        Ok(())
    }

    #[tokio::test]
    async fn apply_coupon_is_idempotent_and_leaves_usage_alone() -> TestResult {
        let ctx = TestContext::new()?;
        let owner = owner("alice");
        let now = Timestamp::now();
        let tenoff = ctx.fixture.coupon("tenoff")?;

        let mut line = ctx.line("margherita", 2)?;
        line.selections = vec![ctx.selection("margherita", "extras", &["burrata"])?];
        ctx.carts.add_line(owner.clone(), line, now).await?;

        let first = ctx
            .carts
            .apply_coupon(owner.clone(), " tenoff ".to_string(), now)
            .await?;
        let second = ctx
            .carts
            .apply_coupon(owner, "TENOFF".to_string(), now)
            .await?;

        assert_eq!(first.totals.discount, 2_30);
        assert_eq!(second.totals, first.totals);
        assert_eq!(
            ctx.store.coupon(tenoff.id).await.map(|c| c.usage_count),
            Some(tenoff.usage_count)
        );

        Ok(())
    }

    #[tokio::test]
    async fn apply_unknown_or_inactive_coupon_is_not_found() -> TestResult {
        let ctx = TestContext::new()?;
        let owner = owner("alice");
        let now = Timestamp::now();

        ctx.carts
            .add_line(owner.clone(), ctx.line("margherita", 2)?, now)
            .await?;

        for code in ["NOPE", "retired"] {
            let result = ctx
                .carts
                .apply_coupon(owner.clone(), code.to_string(), now)
                .await;

            assert!(
                matches!(result, Err(CartsServiceError::NotFound(Missing::InvalidCoupon { .. }))),
                "expected InvalidCoupon for {code}, got {result:?}"
            );
        }

        Ok(())
    }

    #[tokio::test]
    async fn apply_scoped_coupon_without_item_is_not_applicable() -> TestResult {
        let ctx = TestContext::new()?;
        let owner = owner("alice");
        let now = Timestamp::now();
        let tiramisu = ctx.fixture.menu_item("tiramisu")?.id;

        ctx.carts
            .add_line(owner.clone(), ctx.line("margherita", 3)?, now)
            .await?;

        let result = ctx
            .carts
            .apply_coupon(owner.clone(), "SWEET".to_string(), now)
            .await;

        assert!(
            matches!(
                &result,
                Err(CartsServiceError::Validation(ValidationReason::CouponNotApplicable {
                    scope: CouponScope::MenuItem(item),
                    ..
                })) if *item == tiramisu
            ),
            "expected CouponNotApplicable, got {result:?}"
        );

        let cart = ctx.store.find_cart(&owner).await?.ok_or("cart missing")?;

        assert_eq!(cart.coupon_code, None);

        Ok(())
    }

    #[tokio::test]
    async fn get_cart_reports_coupon_that_stopped_applying() -> TestResult {
        let ctx = TestContext::new()?;
        let owner = owner("alice");
        let now = Timestamp::now();

        ctx.carts
            .add_line(owner.clone(), ctx.line("margherita", 2)?, now)
            .await?;
        ctx.carts
            .apply_coupon(owner.clone(), "TENOFF".to_string(), now)
            .await?;

        let mut tenoff = ctx.fixture.coupon("tenoff")?.clone();
        tenoff.is_active = false;
        ctx.store.upsert_coupon(tenoff).await;

        let priced = ctx.carts.get_cart(owner, now).await?;

        assert_eq!(priced.totals.discount, 0);
        assert_eq!(priced.totals.total, 20_00);
        assert!(
            matches!(
                priced.coupon,
                Some(AppliedCoupon {
                    rejection: Some(CouponRejection::Ineligible(CouponError::Inactive { .. })),
                    ..
                })
            ),
            "expected an inactive rejection, got {:?}",
            priced.coupon
        );
        assert_eq!(priced.cart.coupon_code.as_deref(), Some("TENOFF"));

        Ok(())
    }

    #[tokio::test]
    async fn set_delivery_type_to_collection_drops_fee_and_minimum() -> TestResult {
        let ctx = TestContext::new()?;
        let owner = owner("alice");
        let now = Timestamp::now();

        let priced = ctx
            .carts
            .add_line(owner.clone(), ctx.line("mapo_tofu", 1)?, now)
            .await?;

        assert_eq!(priced.totals.delivery_fee, 2_50);
        assert_eq!(
            priced.delivery,
            Some(DeliveryCheck {
                met: false,
                shortfall: 10_20
            })
        );

        let priced = ctx
            .carts
            .set_delivery_type(owner, DeliveryType::Collection, now)
            .await?;

        assert_eq!(priced.totals.delivery_fee, 0);
        assert_eq!(priced.totals.total, 9_80);
        assert_eq!(priced.delivery, Some(DeliveryCheck::MET));

        Ok(())
    }

    #[tokio::test]
    async fn get_cart_uses_current_restaurant_settings() -> TestResult {
        let ctx = TestContext::new()?;
        let owner = owner("alice");
        let now = Timestamp::now();

        let priced = ctx
            .carts
            .add_line(owner.clone(), ctx.line("margherita", 2)?, now)
            .await?;

        assert_eq!(priced.totals.delivery_fee, 0);
        assert_eq!(priced.delivery, Some(DeliveryCheck::MET));

        let mut napoli = ctx.fixture.restaurant("napoli")?.clone();
        napoli.minimum_delivery = 25_00;
        napoli.delivery_fee = 1_99;
        ctx.store.upsert_restaurant(napoli).await;

        let priced = ctx.carts.get_cart(owner, now).await?;

        assert_eq!(priced.totals.delivery_fee, 1_99);
        assert_eq!(priced.totals.total, 21_99);
        assert_eq!(
            priced.delivery,
            Some(DeliveryCheck {
                met: false,
                shortfall: 5_00
            })
        );

        Ok(())
    }

    #[tokio::test]
    async fn clear_cart_removes_lines_and_coupon() -> TestResult {
        let ctx = TestContext::new()?;
        let owner = owner("alice");
        let now = Timestamp::now();

        ctx.carts
            .add_line(owner.clone(), ctx.line("margherita", 2)?, now)
            .await?;
        ctx.carts
            .apply_coupon(owner.clone(), "TENOFF".to_string(), now)
            .await?;

        let priced = ctx.carts.clear_cart(owner, now).await?;

        assert!(priced.cart.is_empty(), "cart should be empty");
        assert_eq!(priced.cart.coupon_code, None);
        assert_eq!(priced.coupon, None);
        assert_eq!(priced.totals, CartTotals::default());

        Ok(())
    }

    #[tokio::test]
    async fn mutations_without_cart_are_not_found() -> TestResult {
        let ctx = TestContext::new()?;

        let result = ctx
            .carts
            .remove_coupon(owner("ghost"), Timestamp::now())
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound(Missing::Cart))),
            "expected NotFound(Cart), got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_adds_never_lose_a_write() -> TestResult {
        let ctx = TestContext::new()?;
        let owner = owner("alice");
        let now = Timestamp::now();

        ctx.carts
            .add_line(owner.clone(), ctx.line("margherita", 1)?, now)
            .await?;

        let carts = Arc::new(ctx.carts.clone());
        let mut tasks = Vec::new();

        for _ in 0..4 {
            let carts = Arc::clone(&carts);
            let owner = owner.clone();
            let line = ctx.line("tiramisu", 1)?;

            tasks.push(tokio::spawn(async move {
                carts.add_line(owner, line, now).await
            }));
        }

        let mut succeeded = 0;
        for task in tasks {
            match task.await? {
                Ok(_) => succeeded += 1,
                Err(CartsServiceError::Conflict(ConflictReason::CartModified)) => {}
                Err(error) => return Err(error.into()),
            }
        }

        let cart = ctx.store.find_cart(&owner).await?.ok_or("cart missing")?;

        assert_eq!(cart.lines.len(), 1 + succeeded);

        Ok(())
    }

    #[tokio::test]
    async fn lost_save_race_is_a_conflict() -> TestResult {
        let ctx = TestContext::new()?;
        let item = ctx.fixture.menu_item("margherita")?.clone();
        let restaurant = ctx.fixture.restaurant("napoli")?.clone();
        let existing = ctx.cart_with("margherita", 1)?;

        let mut catalog = MockCatalog::new();
        catalog
            .expect_get_menu_item()
            .returning(move |_| Ok(item.clone()));
        catalog
            .expect_get_restaurant()
            .returning(move |_| Ok(restaurant.clone()));

        let mut carts = MockCartStore::new();
        carts
            .expect_find_cart()
            .returning(move |_| Ok(Some(existing.clone())));
        carts
            .expect_save_cart()
            .times(1)
            .returning(|_| Err(StoreError::Conflict));

        let service = DefaultCartsService::new(
            Arc::new(catalog),
            Arc::new(MockCouponStore::new()),
            Arc::new(carts),
        );

        let result = service
            .add_line(owner("alice"), ctx.line("margherita", 1)?, Timestamp::now())
            .await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::Conflict(ConflictReason::CartModified))
            ),
            "expected CartModified, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn storage_failures_pass_through() -> TestResult {
        let mut carts = MockCartStore::new();
        carts
            .expect_find_cart()
            .returning(|_| Err(StoreError::Unavailable("connection reset".to_string())));

        let service = DefaultCartsService::new(
            Arc::new(MockCatalog::new()),
            Arc::new(MockCouponStore::new()),
            Arc::new(carts),
        );

        let result = service.get_cart(owner("alice"), Timestamp::now()).await;

        assert!(
            matches!(
                &result,
                Err(CartsServiceError::Storage(StoreError::Unavailable(reason))) if reason == "connection reset"
            ),
            "expected Storage, got {result:?}"
        );

        Ok(())
    }
}
