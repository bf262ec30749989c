//! Named critical-section locking.
//!
//! This crate serializes units of work that contend for the same named
//! resources (for example `product:{id}`) while leaving unrelated work
//! fully concurrent:
//! - [`LockKey`] / [`LockKeySet`] name the resources; a set is deduplicated
//!   and sorted so overlapping requests always acquire in the same order.
//! - [`LockManager`] acquires every key of a set before the critical
//!   section runs and releases all of them on every exit path.
//! - [`LockDeclaration`] attaches a key-resolution function to an
//!   operation, so business code declares *what* to lock and never touches
//!   the acquisition mechanics.

pub mod config;
pub mod declaration;
pub mod error;
pub mod key;
pub mod manager;
pub mod memory;

pub use config::LockConfig;
pub use declaration::LockDeclaration;
pub use error::LockError;
pub use key::{LockKey, LockKeySet};
pub use manager::LockManager;
pub use memory::{InMemoryLockGuard, InMemoryLockManager};
