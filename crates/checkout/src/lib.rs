//! Order placement over named critical sections.
//!
//! This crate orchestrates the cart-to-fulfillment flow: snapshot the
//! member's cart, reserve stock per product inside that product's lock,
//! construct the order, and submit it to the fulfillment gateway. Any
//! failure after stock was decremented triggers compensation in reverse
//! commit order.

pub mod coordinator;
pub mod error;
pub mod fulfillment;
pub mod state;

pub use coordinator::{PlacementCoordinator, PlacementReceipt};
pub use error::PlacementError;
pub use fulfillment::{
    FulfillmentConfirmation, FulfillmentFault, FulfillmentGateway, InMemoryFulfillmentGateway,
};
pub use state::PlacementState;
