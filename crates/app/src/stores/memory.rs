//! In-memory storage backend.
//!
//! All state sits behind one `tokio` mutex. A checkout transaction owns the lock from
//! `begin` until it is dropped, so finalisation is serialisable and the usage and version
//! guards are checked against the state that commit will write to.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use platter::prelude::*;
use rustc_hash::FxHashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::stores::{
    CartStore, Catalog, CheckoutTransaction, CouponStore, OrderStore, StoreError, UnitOfWork,
};

#[derive(Debug, Default)]
struct State {
    restaurants: FxHashMap<RestaurantId, Restaurant>,
    items: FxHashMap<MenuItemId, MenuItem>,
    coupons: FxHashMap<CouponId, Coupon>,
    coupon_codes: FxHashMap<String, CouponId>,
    carts: FxHashMap<CartId, Cart>,
    owners: FxHashMap<CartOwner, CartId>,
    orders: FxHashMap<OrderId, Order>,
}

impl State {
    fn upsert_coupon(&mut self, coupon: Coupon) {
        if let Some(previous) = self.coupons.get(&coupon.id) {
            self.coupon_codes.remove(&previous.code);
        }

        self.coupon_codes.insert(coupon.code.clone(), coupon.id);
        self.coupons.insert(coupon.id, coupon);
    }
}

/// Process-local implementation of every storage collaborator.
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with every restaurant, menu item and coupon loaded into `fixture`.
    #[must_use]
    pub fn from_fixture(fixture: &Fixture) -> Self {
        let mut state = State::default();

        for restaurant in fixture.restaurants() {
            state.restaurants.insert(restaurant.id, restaurant.clone());
        }

        for item in fixture.menu_items() {
            state.items.insert(item.id, item.clone());
        }

        for coupon in fixture.coupons() {
            state.upsert_coupon(coupon.clone());
        }

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Insert or replace restaurant settings.
    pub async fn upsert_restaurant(&self, restaurant: Restaurant) {
        self.state
            .lock()
            .await
            .restaurants
            .insert(restaurant.id, restaurant);
    }

    /// Insert or replace a menu item.
    pub async fn upsert_menu_item(&self, item: MenuItem) {
        self.state.lock().await.items.insert(item.id, item);
    }

    /// Delete a menu item, returning it if it existed.
    pub async fn remove_menu_item(&self, id: MenuItemId) -> Option<MenuItem> {
        self.state.lock().await.items.remove(&id)
    }

    /// Insert or replace a coupon, re-indexing its code.
    pub async fn upsert_coupon(&self, coupon: Coupon) {
        self.state.lock().await.upsert_coupon(coupon);
    }

    /// Current stored state of a coupon.
    pub async fn coupon(&self, id: CouponId) -> Option<Coupon> {
        self.state.lock().await.coupons.get(&id).cloned()
    }

    /// Every order placed by `owner`, oldest first.
    pub async fn orders_for(&self, owner: &CartOwner) -> Vec<Order> {
        let state = self.state.lock().await;

        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|order| &order.owner == owner)
            .cloned()
            .collect();

        orders.sort_by_key(|order| order.id);

        orders
    }
}

#[async_trait]
impl Catalog for MemoryStore {
    async fn get_menu_item(&self, id: MenuItemId) -> Result<MenuItem, StoreError> {
        self.state
            .lock()
            .await
            .items
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_restaurant(&self, id: RestaurantId) -> Result<Restaurant, StoreError> {
        self.state
            .lock()
            .await
            .restaurants
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl CouponStore for MemoryStore {
    async fn get_coupon_by_code(&self, code: &str) -> Result<Coupon, StoreError> {
        let state = self.state.lock().await;

        state
            .coupon_codes
            .get(code)
            .and_then(|id| state.coupons.get(id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn find_cart(&self, owner: &CartOwner) -> Result<Option<Cart>, StoreError> {
        let state = self.state.lock().await;

        Ok(state
            .owners
            .get(owner)
            .and_then(|id| state.carts.get(id))
            .cloned())
    }

    async fn get_cart(&self, id: CartId) -> Result<Cart, StoreError> {
        self.state
            .lock()
            .await
            .carts
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn save_cart(&self, mut cart: Cart) -> Result<Cart, StoreError> {
        let mut state = self.state.lock().await;

        match state.carts.get(&cart.id) {
            Some(stored) if stored.version != cart.version => return Err(StoreError::Conflict),
            Some(_) => {}
            None if cart.version != 0 => return Err(StoreError::NotFound),
            None if state.owners.contains_key(&cart.owner) => return Err(StoreError::Conflict),
            None => {}
        }

        cart.version += 1;

        state.owners.insert(cart.owner.clone(), cart.id);
        state.carts.insert(cart.id, cart.clone());

        Ok(cart)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn get_order(&self, id: OrderId) -> Result<Order, StoreError> {
        self.state
            .lock()
            .await
            .orders
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl UnitOfWork for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn CheckoutTransaction>, StoreError> {
        let state = Arc::clone(&self.state).lock_owned().await;

        Ok(Box::new(MemoryTransaction {
            state,
            usage: FxHashMap::default(),
            orders: Vec::new(),
            cleared: Vec::new(),
        }))
    }
}

/// Staged checkout writes, holding the store lock until dropped.
#[derive(Debug)]
pub struct MemoryTransaction {
    state: OwnedMutexGuard<State>,
    usage: FxHashMap<CouponId, u32>,
    orders: Vec<Order>,
    cleared: Vec<CartId>,
}

#[async_trait]
impl CheckoutTransaction for MemoryTransaction {
    async fn increment_coupon_usage(
        &mut self,
        coupon: CouponId,
        max_usage: Option<u32>,
    ) -> Result<u32, StoreError> {
        let stored = self.state.coupons.get(&coupon).ok_or(StoreError::NotFound)?;

        let current = self
            .usage
            .get(&coupon)
            .copied()
            .unwrap_or(stored.usage_count);

        if max_usage.is_some_and(|max| current >= max) {
            return Err(StoreError::Conflict);
        }

        let next = current.checked_add(1).ok_or(StoreError::Conflict)?;

        self.usage.insert(coupon, next);

        Ok(next)
    }

    async fn create_order(&mut self, order: Order) -> Result<Order, StoreError> {
        let duplicate = self.state.orders.contains_key(&order.id)
            || self.orders.iter().any(|staged| staged.id == order.id);

        if duplicate {
            return Err(StoreError::Conflict);
        }

        self.orders.push(order.clone());

        Ok(order)
    }

    async fn clear_cart(
        &mut self,
        cart: CartId,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        let stored = self.state.carts.get(&cart).ok_or(StoreError::NotFound)?;

        if stored.version != expected_version || self.cleared.contains(&cart) {
            return Err(StoreError::Conflict);
        }

        self.cleared.push(cart);

        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let now = Timestamp::now();

        for (id, usage_count) in self.usage.drain() {
            if let Some(coupon) = self.state.coupons.get_mut(&id) {
                coupon.usage_count = usage_count;
            }
        }

        for order in self.orders.drain(..) {
            self.state.orders.insert(order.id, order);
        }

        for id in self.cleared.drain(..) {
            if let Some(cart) = self.state.carts.get_mut(&id) {
                cart.clear(now);
                cart.version += 1;
            }
        }

        Ok(())
    }
}
