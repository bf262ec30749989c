//! Shared identifier types used across the checkout workspace.

pub mod types;

pub use types::{CartItemId, MemberId, OrderId, ProductId};
