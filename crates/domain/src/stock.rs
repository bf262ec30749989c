//! Per-product stock ledger.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Why a reservation was not granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationFailure {
    /// Fewer units available than requested.
    InsufficientStock { available: u64 },
}

/// Transient per-product record of one reservation attempt.
///
/// Drives the caller's compensation decisions; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationOutcome {
    pub product_id: ProductId,
    pub requested_quantity: u32,
    pub reserved: bool,
    pub reason: Option<ReservationFailure>,
}

impl ReservationOutcome {
    /// The reservation was granted and stock decremented.
    pub fn granted(product_id: ProductId, requested_quantity: u32) -> Self {
        Self {
            product_id,
            requested_quantity,
            reserved: true,
            reason: None,
        }
    }

    /// The reservation was declined for lack of stock. This is a normal
    /// business outcome, not a fault.
    pub fn insufficient(product_id: ProductId, requested_quantity: u32, available: u64) -> Self {
        Self {
            product_id,
            requested_quantity,
            reserved: false,
            reason: Some(ReservationFailure::InsufficientStock { available }),
        }
    }
}

/// Owns per-product available-quantity state.
///
/// `reserve` and `release` must only be invoked while the caller holds
/// the critical section for that product's lock key; calling them
/// unlocked is a programming error, not a runtime business error.
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Checks availability and, if sufficient, decrements within the same
    /// critical section. Insufficiency is reported in the outcome, never
    /// as an error.
    async fn reserve(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<ReservationOutcome, DomainError>;

    /// Compensating re-credit of a prior reservation.
    async fn release(&self, product_id: &ProductId, quantity: u32) -> Result<(), DomainError>;

    /// Point read of the available quantity.
    async fn available(&self, product_id: &ProductId) -> Result<u64, DomainError>;
}

type LockProbe = dyn Fn(&ProductId) -> bool + Send + Sync;

#[derive(Default)]
struct LedgerState {
    entries: HashMap<ProductId, u64>,
}

/// In-memory stock ledger for testing.
///
/// An optional lock probe turns the "must hold the product's lock"
/// precondition into a hard assertion: when installed, `reserve` and
/// `release` panic if the probe reports the lock as not held.
#[derive(Clone, Default)]
pub struct InMemoryStockLedger {
    state: Arc<RwLock<LedgerState>>,
    probe: Arc<RwLock<Option<Arc<LockProbe>>>>,
}

impl InMemoryStockLedger {
    /// Creates a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds or overwrites a product's available quantity.
    pub fn set_entry(&self, product_id: ProductId, available: u64) {
        self.state
            .write()
            .unwrap()
            .entries
            .insert(product_id, available);
    }

    /// Installs the critical-section assertion hook.
    pub fn set_lock_probe(&self, probe: impl Fn(&ProductId) -> bool + Send + Sync + 'static) {
        *self.probe.write().unwrap() = Some(Arc::new(probe));
    }

    fn assert_locked(&self, product_id: &ProductId) {
        let probe = self.probe.read().unwrap().clone();
        if let Some(probe) = probe {
            assert!(
                probe(product_id),
                "stock for {product_id} mutated outside its critical section"
            );
        }
    }
}

#[async_trait]
impl StockLedger for InMemoryStockLedger {
    async fn reserve(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<ReservationOutcome, DomainError> {
        self.assert_locked(product_id);

        let mut state = self.state.write().unwrap();
        let available = state
            .entries
            .get_mut(product_id)
            .ok_or_else(|| DomainError::ProductNotFound(product_id.clone()))?;

        if *available >= u64::from(quantity) {
            *available -= u64::from(quantity);
            tracing::debug!(product = %product_id, quantity, remaining = *available, "stock reserved");
            Ok(ReservationOutcome::granted(product_id.clone(), quantity))
        } else {
            Ok(ReservationOutcome::insufficient(
                product_id.clone(),
                quantity,
                *available,
            ))
        }
    }

    async fn release(&self, product_id: &ProductId, quantity: u32) -> Result<(), DomainError> {
        self.assert_locked(product_id);

        let mut state = self.state.write().unwrap();
        let available = state
            .entries
            .get_mut(product_id)
            .ok_or_else(|| DomainError::ProductNotFound(product_id.clone()))?;

        *available += u64::from(quantity);
        tracing::debug!(product = %product_id, quantity, remaining = *available, "stock released");
        Ok(())
    }

    async fn available(&self, product_id: &ProductId) -> Result<u64, DomainError> {
        self.state
            .read()
            .unwrap()
            .entries
            .get(product_id)
            .copied()
            .ok_or_else(|| DomainError::ProductNotFound(product_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sku(s: &str) -> ProductId {
        ProductId::new(s)
    }

    #[tokio::test]
    async fn test_reserve_decrements_available() {
        let ledger = InMemoryStockLedger::new();
        ledger.set_entry(sku("SKU-001"), 10);

        let outcome = ledger.reserve(&sku("SKU-001"), 3).await.unwrap();
        assert!(outcome.reserved);
        assert_eq!(outcome.requested_quantity, 3);
        assert_eq!(ledger.available(&sku("SKU-001")).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_insufficient_stock_is_an_outcome_not_an_error() {
        let ledger = InMemoryStockLedger::new();
        ledger.set_entry(sku("SKU-001"), 2);

        let outcome = ledger.reserve(&sku("SKU-001"), 3).await.unwrap();
        assert!(!outcome.reserved);
        assert_eq!(
            outcome.reason,
            Some(ReservationFailure::InsufficientStock { available: 2 })
        );
        // Declined reservations leave the quantity untouched.
        assert_eq!(ledger.available(&sku("SKU-001")).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_release_restores_quantity() {
        let ledger = InMemoryStockLedger::new();
        ledger.set_entry(sku("SKU-001"), 5);

        ledger.reserve(&sku("SKU-001"), 5).await.unwrap();
        assert_eq!(ledger.available(&sku("SKU-001")).await.unwrap(), 0);

        ledger.release(&sku("SKU-001"), 5).await.unwrap();
        assert_eq!(ledger.available(&sku("SKU-001")).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_unknown_product_is_an_error() {
        let ledger = InMemoryStockLedger::new();
        let result = ledger.reserve(&sku("SKU-MISSING"), 1).await;
        assert!(matches!(result, Err(DomainError::ProductNotFound(_))));
    }

    #[tokio::test]
    #[should_panic(expected = "outside its critical section")]
    async fn test_lock_probe_catches_unlocked_mutation() {
        let ledger = InMemoryStockLedger::new();
        ledger.set_entry(sku("SKU-001"), 10);
        ledger.set_lock_probe(|_| false);

        let _ = ledger.reserve(&sku("SKU-001"), 1).await;
    }

    #[test]
    fn test_outcome_serialization_roundtrip() {
        let outcome = ReservationOutcome::insufficient(sku("SKU-001"), 3, 2);
        let json = serde_json::to_string(&outcome).unwrap();
        let deserialized: ReservationOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(outcome, deserialized);
    }

    #[tokio::test]
    async fn test_lock_probe_passes_when_lock_reported_held() {
        let ledger = InMemoryStockLedger::new();
        ledger.set_entry(sku("SKU-001"), 10);
        ledger.set_lock_probe(|_| true);

        let outcome = ledger.reserve(&sku("SKU-001"), 1).await.unwrap();
        assert!(outcome.reserved);
    }
}
