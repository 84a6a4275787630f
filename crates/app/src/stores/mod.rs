//! Storage collaborators.
//!
//! Services only talk to storage through these traits. Reads return owned snapshots; the
//! only multi-aggregate write is the checkout transaction.

use async_trait::async_trait;
use mockall::automock;
use platter::prelude::*;
use thiserror::Error;

pub mod memory;

pub use memory::MemoryStore;

/// Errors raised by storage backends.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record with the requested key.
    #[error("record not found")]
    NotFound,

    /// A version or usage guard failed.
    #[error("record was modified concurrently")]
    Conflict,

    /// The backend could not be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Read access to restaurants and menu items as of call time.
#[automock]
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch a menu item with its option groups.
    async fn get_menu_item(&self, id: MenuItemId) -> Result<MenuItem, StoreError>;

    /// Fetch restaurant settings.
    async fn get_restaurant(&self, id: RestaurantId) -> Result<Restaurant, StoreError>;
}

/// Read access to coupons.
#[automock]
#[async_trait]
pub trait CouponStore: Send + Sync {
    /// Look up a coupon by its normalised code.
    async fn get_coupon_by_code(&self, code: &str) -> Result<Coupon, StoreError>;
}

/// Cart persistence with optimistic concurrency.
#[automock]
#[async_trait]
pub trait CartStore: Send + Sync {
    /// The cart owned by `owner`, if one has been saved.
    async fn find_cart(&self, owner: &CartOwner) -> Result<Option<Cart>, StoreError>;

    /// Fetch a cart by id.
    async fn get_cart(&self, id: CartId) -> Result<Cart, StoreError>;

    /// Store `cart` if its version still matches, returning the stored copy with the next
    /// version.
    ///
    /// A version of zero inserts a new cart and conflicts if the owner already has one.
    async fn save_cart(&self, cart: Cart) -> Result<Cart, StoreError>;
}

/// Read access to placed orders.
#[automock]
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fetch an order by id.
    async fn get_order(&self, id: OrderId) -> Result<Order, StoreError>;
}

/// Opens checkout transactions.
#[automock]
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Begin a transaction. Nothing it stages is visible until [`CheckoutTransaction::commit`].
    async fn begin(&self) -> Result<Box<dyn CheckoutTransaction>, StoreError>;
}

/// The all-or-nothing write set of a checkout. Dropping it without committing discards
/// every staged write.
#[automock]
#[async_trait]
pub trait CheckoutTransaction: Send {
    /// Add one redemption while the stored usage count is below `max_usage`.
    ///
    /// Returns the new usage count, or [`StoreError::Conflict`] once the cap is reached.
    async fn increment_coupon_usage(
        &mut self,
        coupon: CouponId,
        max_usage: Option<u32>,
    ) -> Result<u32, StoreError>;

    /// Stage a new order.
    async fn create_order(&mut self, order: Order) -> Result<Order, StoreError>;

    /// Empty the cart if it is still at `expected_version`.
    async fn clear_cart(&mut self, cart: CartId, expected_version: u64)
    -> Result<(), StoreError>;

    /// Apply every staged write.
    async fn commit(&mut self) -> Result<(), StoreError>;
}
