//! Carts service errors.

use platter::prelude::*;
use thiserror::Error;

use crate::{
    domain::errors::{Classified, ConflictReason, Missing, ValidationReason},
    stores::StoreError,
};

/// Errors returned by [`super::CartsService`].
#[derive(Debug, Error)]
pub enum CartsServiceError {
    /// A referenced entity does not exist
    #[error("{0} not found")]
    NotFound(Missing),

    /// The request breaks a business rule
    #[error("invalid request: {0}")]
    Validation(ValidationReason),

    /// State changed underneath the request
    #[error("conflict: {0}")]
    Conflict(ConflictReason),

    /// The storage layer failed
    #[error("storage error")]
    Storage(#[source] StoreError),
}

impl CartsServiceError {
    /// Map a storage not-found onto `missing`, converting anything else as usual.
    pub(crate) fn or_missing(missing: Missing) -> impl FnOnce(StoreError) -> Self {
        move |error| match error {
            StoreError::NotFound => Self::NotFound(missing),
            other => other.into(),
        }
    }
}

impl From<StoreError> for CartsServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => Self::NotFound(Missing::Record),
            StoreError::Conflict => Self::Conflict(ConflictReason::CartModified),
            StoreError::Unavailable(_) => Self::Storage(error),
        }
    }
}

impl From<Classified> for CartsServiceError {
    fn from(classified: Classified) -> Self {
        match classified {
            Classified::NotFound(missing) => Self::NotFound(missing),
            Classified::Validation(reason) => Self::Validation(reason),
            Classified::Conflict(reason) => Self::Conflict(reason),
        }
    }
}

impl From<CartError> for CartsServiceError {
    fn from(error: CartError) -> Self {
        Classified::from(error).into()
    }
}

impl From<CouponError> for CartsServiceError {
    fn from(error: CouponError) -> Self {
        Classified::from(error).into()
    }
}

impl From<AmountError> for CartsServiceError {
    fn from(error: AmountError) -> Self {
        Classified::from(error).into()
    }
}
