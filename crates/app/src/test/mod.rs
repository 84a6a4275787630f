//! Shared helpers for service tests.


pub(crate) use context::{TestContext, owner};
