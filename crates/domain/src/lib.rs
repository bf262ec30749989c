//! Domain layer for the checkout system.
//!
//! This crate provides the business state the placement flow touches:
//! - Cart items and the cart store (read, remove, restore)
//! - The stock ledger with reserve/release under a product's lock
//! - The order aggregate created once all reservations succeed
//!
//! Persistence collaborators are traits with in-memory implementations;
//! no schema is prescribed beyond point reads and single-entry updates.

pub mod cart;
pub mod error;
pub mod order;
pub mod stock;

pub use cart::{CartItem, CartStore, InMemoryCartStore};
pub use error::DomainError;
pub use order::{Address, InMemoryOrderStore, Order, OrderLine, OrderStore, Orderer};
pub use stock::{InMemoryStockLedger, ReservationFailure, ReservationOutcome, StockLedger};
