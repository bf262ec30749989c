//! Placement error types.

use common::{CartItemId, ProductId};
use domain::DomainError;
use lock::LockError;
use thiserror::Error;

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum PlacementError {
    /// One or more cart item IDs do not exist or belong to another member.
    /// Expected business outcome; nothing was mutated.
    #[error("cart item(s) not found: {0:?}")]
    CartItemNotFound(Vec<CartItemId>),

    /// A reservation was declined for lack of stock. Expected business
    /// outcome; every already-taken reservation was released and no order
    /// was created.
    #[error("insufficient stock for product(s): {0:?}")]
    InsufficientStock(Vec<ProductId>),

    /// Lock acquisition or declaration failure. Infrastructure fault,
    /// fatal to the request; callers choose their own retry policy.
    #[error("lock error: {0}")]
    Lock(#[from] LockError),

    /// Domain-level failure outside the dedicated variants above.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The fulfillment gateway declined or could not be reached; the
    /// placement was fully compensated before this surfaced.
    #[error("fulfillment failed: {reason}")]
    FulfillmentFailed { reason: String },

    /// Compensation itself could not complete. Higher severity than the
    /// failure that triggered it: stock or cart state needs manual
    /// reconciliation, so this is never masked by the original error.
    #[error("compensation failed: {reason}")]
    CompensationFailed { reason: String },
}

impl PlacementError {
    /// Stable external error code for the presentation boundary.
    pub fn code(&self) -> &'static str {
        match self {
            PlacementError::CartItemNotFound(_) => "CART_ITEM_NOT_FOUND",
            PlacementError::InsufficientStock(_) => "INSUFFICIENT_STOCK",
            PlacementError::Lock(e) => e.code(),
            PlacementError::Domain(e) => e.code(),
            PlacementError::FulfillmentFailed { .. } => "FULFILLMENT_FAILED",
            PlacementError::CompensationFailed { .. } => "COMPENSATION_FAILED",
        }
    }

    /// Returns true for expected business outcomes, as opposed to
    /// infrastructure faults. Business outcomes are final; faults are
    /// candidates for caller-side retry.
    pub fn is_business_outcome(&self) -> bool {
        matches!(
            self,
            PlacementError::CartItemNotFound(_) | PlacementError::InsufficientStock(_)
        )
    }
}

/// Convenience type alias for placement results.
pub type Result<T> = std::result::Result<T, PlacementError>;
