//! App Context

use std::{fmt, sync::Arc};

use platter::prelude::*;

use crate::{
    domain::{
        carts::{CartsService, DefaultCartsService},
        checkout::{CheckoutService, DefaultCheckoutService},
    },
    stores::{CartStore, Catalog, CouponStore, MemoryStore, OrderStore, UnitOfWork},
};

/// Storage collaborators handed to the services.
#[derive(Clone)]
pub struct Stores {
    /// Menu items and restaurant settings
    pub catalog: Arc<dyn Catalog>,

    /// Coupons by code
    pub coupons: Arc<dyn CouponStore>,

    /// Carts by owner
    pub carts: Arc<dyn CartStore>,

    /// Placed orders
    pub orders: Arc<dyn OrderStore>,

    /// Checkout transactions
    pub uow: Arc<dyn UnitOfWork>,
}

impl fmt::Debug for Stores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}

impl From<MemoryStore> for Stores {
    fn from(store: MemoryStore) -> Self {
        let store = Arc::new(store);

        Self {
            catalog: store.clone(),
            coupons: store.clone(),
            carts: store.clone(),
            orders: store.clone(),
            uow: store,
        }
    }
}

/// Services the CLI and scenarios talk to.
#[derive(Clone)]
pub struct AppContext {
    /// Cart operations
    pub carts: Arc<dyn CartsService>,

    /// Order finalisation
    pub checkout: Arc<dyn CheckoutService>,

    /// Order lookup
    pub orders: Arc<dyn OrderStore>,
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext").finish_non_exhaustive()
    }
}

impl AppContext {
    /// Wire the services to the given collaborators.
    #[must_use]
    pub fn new(stores: Stores) -> Self {
        Self {
            carts: Arc::new(DefaultCartsService::new(
                stores.catalog.clone(),
                stores.coupons.clone(),
                stores.carts.clone(),
            )),
            checkout: Arc::new(DefaultCheckoutService::new(
                stores.catalog,
                stores.coupons,
                stores.carts,
                stores.uow,
            )),
            orders: stores.orders,
        }
    }

    /// Build a context over an in-memory store seeded from `fixture`.
    #[must_use]
    pub fn in_memory(fixture: &Fixture) -> Self {
        Self::new(MemoryStore::from_fixture(fixture).into())
    }
}
