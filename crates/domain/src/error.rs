//! Domain error types.

use common::{CartItemId, OrderId, ProductId};
use thiserror::Error;

/// Errors that can occur during domain operations.
///
/// Expected business outcomes carry enough context for the caller to act
/// on; none of these is retried internally.
#[derive(Debug, Error)]
pub enum DomainError {
    /// One or more cart item IDs do not exist or belong to another member.
    #[error("cart item(s) not found: {0:?}")]
    CartItemNotFound(Vec<CartItemId>),

    /// No stock entry exists for the product.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// A cart item or order line quantity was zero.
    #[error("quantity must be greater than zero")]
    InvalidQuantity,

    /// A required address field was blank.
    #[error("address field '{field}' must not be blank")]
    BlankAddressField { field: &'static str },

    /// An order was constructed without any lines.
    #[error("an order must contain at least one line")]
    EmptyOrder,

    /// Order not found.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),
}

impl DomainError {
    /// Stable external error code for the presentation boundary.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::CartItemNotFound(_) => "CART_ITEM_NOT_FOUND",
            DomainError::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            DomainError::InvalidQuantity => "INVALID_QUANTITY",
            DomainError::BlankAddressField { .. } => "INVALID_ADDRESS",
            DomainError::EmptyOrder => "EMPTY_ORDER",
            DomainError::OrderNotFound(_) => "ORDER_NOT_FOUND",
        }
    }
}

/// Convenience type alias for domain results.
pub type Result<T> = std::result::Result<T, DomainError>;
