//! Platter
//!
//! Platter is the pricing core of a food-ordering marketplace: it resolves menu option
//! selections, keeps carts consistent as they are edited, redeems coupons, checks delivery
//! minimums and freezes a priced cart into an immutable order snapshot.
//!
//! Everything in this crate is synchronous and side-effect free. Storage, clocks and
//! transactions belong to the caller, which passes catalog snapshots and the current
//! point in time in explicitly.

pub mod cart;
pub mod catalog;
pub mod coupons;
pub mod delivery;
pub mod fixtures;
pub mod ids;
pub mod money;
pub mod options;
pub mod orders;
pub mod prelude;
pub mod receipt;
pub mod totals;
