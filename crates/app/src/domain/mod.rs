//! Platter application services.

pub mod carts;
pub mod checkout;
pub mod errors;
