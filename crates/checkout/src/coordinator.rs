//! Placement coordinator for the cart-to-fulfillment flow.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use common::{CartItemId, MemberId, OrderId, ProductId};
use domain::{
    Address, CartItem, CartStore, DomainError, Order, OrderLine, OrderStore, Orderer,
    ReservationOutcome, StockLedger,
};
use lock::{LockDeclaration, LockKey, LockManager};

use crate::error::PlacementError;
use crate::fulfillment::FulfillmentGateway;
use crate::state::PlacementState;

/// Lock keys for a stock operation: the product's critical section.
fn stock_keys(product_id: &ProductId) -> Vec<LockKey> {
    vec![LockKey::for_product(product_id)]
}

/// Outcome of a confirmed placement.
#[derive(Debug, Clone)]
pub struct PlacementReceipt {
    pub order_id: OrderId,
    pub fulfillment_reference: String,
    pub lines: Vec<OrderLine>,
}

/// Collaborators shared between the coordinator and in-flight attempts.
struct Shared<L, C, S, O, G> {
    locks: L,
    cart: C,
    stock: S,
    orders: O,
    gateway: G,
    stock_section: LockDeclaration<ProductId, fn(&ProductId) -> Vec<LockKey>>,
}

impl<L, C, S, O, G> Shared<L, C, S, O, G>
where
    L: LockManager,
    C: CartStore,
    S: StockLedger,
    O: OrderStore,
    G: FulfillmentGateway,
{
    /// Reserves one product's demand inside its critical section.
    async fn reserve(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<ReservationOutcome, PlacementError> {
        let stock = &self.stock;
        let outcome = self
            .stock_section
            .invoke(&self.locks, product_id.clone(), move |id| async move {
                stock.reserve(&id, quantity).await
            })
            .await??;
        Ok(outcome)
    }

    /// Undoes committed effects in reverse commit order: discard the
    /// order, restore the cart snapshot, release the reservations (each
    /// inside its own product critical section, newest first).
    ///
    /// Failures are collected rather than short-circuited and escalate as
    /// [`PlacementError::CompensationFailed`]: a half-finished rollback
    /// leaves state needing manual reconciliation and must never be
    /// masked by the error that triggered it.
    async fn rollback(
        &self,
        reservations: Vec<(ProductId, u32)>,
        removed_items: Option<Vec<CartItem>>,
        order_id: Option<OrderId>,
    ) -> Result<(), PlacementError> {
        let mut failures = Vec::new();

        if let Some(order_id) = order_id {
            if let Err(e) = self.orders.remove(order_id).await {
                failures.push(format!("discard order {order_id}: {e}"));
            }
        }

        if let Some(items) = removed_items {
            if let Err(e) = self.cart.restore(items).await {
                failures.push(format!("restore cart: {e}"));
            }
        }

        for (product_id, quantity) in reservations.iter().rev() {
            let stock = &self.stock;
            let quantity = *quantity;
            let result = self
                .stock_section
                .invoke(&self.locks, product_id.clone(), move |id| async move {
                    stock.release(&id, quantity).await
                })
                .await;
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => failures.push(format!("release {product_id}: {e}")),
                Err(e) => failures.push(format!("release {product_id}: {e}")),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            tracing::error!(reason = %failures.join("; "), "compensation failed");
            metrics::counter!("placement_compensation_failed_total").increment(1);
            Err(PlacementError::CompensationFailed {
                reason: failures.join("; "),
            })
        }
    }
}

/// Tracks one placement request: its state machine position and the
/// effects committed so far, which drive compensation.
///
/// An attempt dropped while it still holds uncompensated effects was
/// cancelled mid-flight (for example its task was aborted while parked in
/// the gateway call); the drop handler hands the rollback to a detached
/// task, so no exit path leaves stock decremented without either a
/// confirmed order or a compensating release.
struct PlacementAttempt<L, C, S, O, G>
where
    L: LockManager + 'static,
    C: CartStore + 'static,
    S: StockLedger + 'static,
    O: OrderStore + 'static,
    G: FulfillmentGateway + 'static,
{
    shared: Arc<Shared<L, C, S, O, G>>,
    state: PlacementState,
    reservations: Vec<(ProductId, u32)>,
    removed_items: Option<Vec<CartItem>>,
    order_id: Option<OrderId>,
}

impl<L, C, S, O, G> PlacementAttempt<L, C, S, O, G>
where
    L: LockManager + 'static,
    C: CartStore + 'static,
    S: StockLedger + 'static,
    O: OrderStore + 'static,
    G: FulfillmentGateway + 'static,
{
    fn new(shared: Arc<Shared<L, C, S, O, G>>) -> Self {
        Self {
            shared,
            state: PlacementState::default(),
            reservations: Vec::new(),
            removed_items: None,
            order_id: None,
        }
    }

    fn transition(&mut self, next: PlacementState) {
        debug_assert!(
            self.state.may_transition_to(next),
            "illegal placement transition {} -> {next}",
            self.state
        );
        tracing::debug!(from = %self.state, to = %next, "placement state transition");
        self.state = next;
    }

    fn record_reservation(&mut self, product_id: ProductId, quantity: u32) {
        self.reservations.push((product_id, quantity));
    }

    fn record_cart_removal(&mut self, items: Vec<CartItem>) {
        self.removed_items = Some(items);
    }

    fn record_order(&mut self, order_id: OrderId) {
        self.order_id = Some(order_id);
    }

    fn has_effects(&self) -> bool {
        !self.reservations.is_empty() || self.removed_items.is_some() || self.order_id.is_some()
    }

    /// Marks the terminal success; committed effects are final.
    fn confirm(&mut self) {
        self.reservations.clear();
        self.removed_items = None;
        self.order_id = None;
    }

    /// Compensates every recorded effect and disarms the drop handler.
    ///
    /// The rollback runs on an owned task where a runtime is available,
    /// so it completes even if the future awaiting it is dropped.
    async fn rollback(&mut self) -> Result<(), PlacementError> {
        let shared = Arc::clone(&self.shared);
        let reservations = std::mem::take(&mut self.reservations);
        let removed_items = self.removed_items.take();
        let order_id = self.order_id.take();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let task = handle
                    .spawn(async move { shared.rollback(reservations, removed_items, order_id).await });
                match task.await {
                    Ok(result) => result,
                    Err(join_error) => Err(PlacementError::CompensationFailed {
                        reason: format!("compensation task failed: {join_error}"),
                    }),
                }
            }
            Err(_) => shared.rollback(reservations, removed_items, order_id).await,
        }
    }
}

impl<L, C, S, O, G> Drop for PlacementAttempt<L, C, S, O, G>
where
    L: LockManager + 'static,
    C: CartStore + 'static,
    S: StockLedger + 'static,
    O: OrderStore + 'static,
    G: FulfillmentGateway + 'static,
{
    fn drop(&mut self) {
        if !self.has_effects() {
            return;
        }
        let shared = Arc::clone(&self.shared);
        let reservations = std::mem::take(&mut self.reservations);
        let removed_items = self.removed_items.take();
        let order_id = self.order_id.take();

        tracing::warn!(state = %self.state, "placement dropped mid-flight, compensating in a detached task");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = shared.rollback(reservations, removed_items, order_id).await {
                        tracing::error!(error = %e, "compensation for an aborted placement failed");
                    }
                });
            }
            Err(_) => {
                tracing::error!("no runtime available to compensate an aborted placement");
            }
        }
    }
}

/// Orchestrates order placement: cart snapshot, per-product stock
/// reservation under the product's lock, order construction, fulfillment
/// submission, and compensation on failure.
///
/// Locking is per product, so purchases of unrelated products proceed in
/// parallel; the lock scope covers only check-and-decrement, never the
/// gateway round trip. Compensation therefore re-acquires locks instead
/// of holding them across the external call.
pub struct PlacementCoordinator<L, C, S, O, G>
where
    L: LockManager + 'static,
    C: CartStore + 'static,
    S: StockLedger + 'static,
    O: OrderStore + 'static,
    G: FulfillmentGateway + 'static,
{
    shared: Arc<Shared<L, C, S, O, G>>,
}

impl<L, C, S, O, G> PlacementCoordinator<L, C, S, O, G>
where
    L: LockManager + 'static,
    C: CartStore + 'static,
    S: StockLedger + 'static,
    O: OrderStore + 'static,
    G: FulfillmentGateway + 'static,
{
    /// Creates a new placement coordinator.
    pub fn new(locks: L, cart: C, stock: S, orders: O, gateway: G) -> Self {
        Self {
            shared: Arc::new(Shared {
                locks,
                cart,
                stock,
                orders,
                gateway,
                stock_section: LockDeclaration::new(stock_keys),
            }),
        }
    }

    /// Places an order from the given cart items.
    ///
    /// Either the placement reaches fulfillment-confirmed, with cart items
    /// deleted, stock decremented, and the order stored, or every partial
    /// effect is undone before the error surfaces. There is no exit with
    /// stock decremented but neither a confirmed order nor a release;
    /// that holds even when the returned future is dropped mid-flight,
    /// in which case the rollback runs on a detached task.
    #[tracing::instrument(skip(self, cart_item_ids, address), fields(member = %member_id))]
    pub async fn place(
        &self,
        member_id: MemberId,
        cart_item_ids: Vec<CartItemId>,
        address: Address,
    ) -> Result<PlacementReceipt, PlacementError> {
        metrics::counter!("placement_attempts_total").increment(1);
        let start = std::time::Instant::now();

        if cart_item_ids.is_empty() {
            return Err(DomainError::EmptyOrder.into());
        }
        let mut seen = HashSet::new();
        let cart_item_ids: Vec<CartItemId> = cart_item_ids
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect();

        let shared = &self.shared;
        let mut attempt = PlacementAttempt::new(Arc::clone(shared));

        // 1. Cart snapshot; ownership is enforced by the store.
        let items = match shared.cart.find_for_member(member_id, &cart_item_ids).await {
            Ok(items) => items,
            Err(DomainError::CartItemNotFound(ids)) => {
                metrics::counter!("placement_rejected_total").increment(1);
                return Err(PlacementError::CartItemNotFound(ids));
            }
            Err(e) => return Err(e.into()),
        };

        // 2. Group demand by product. BTreeMap iteration is ascending,
        // matching the lock manager's canonical key order, so concurrent
        // placements over overlapping products cannot deadlock.
        let mut demand: BTreeMap<ProductId, u32> = BTreeMap::new();
        for item in &items {
            let quantity = demand.entry(item.product_id().clone()).or_insert(0);
            *quantity = quantity
                .checked_add(item.quantity())
                .ok_or(DomainError::InvalidQuantity)?;
        }

        attempt.transition(PlacementState::StockReserving);
        for (product_id, &quantity) in &demand {
            match shared.reserve(product_id, quantity).await {
                Ok(outcome) if outcome.reserved => {
                    attempt.record_reservation(product_id.clone(), quantity);
                }
                Ok(outcome) => {
                    tracing::info!(
                        product = %product_id,
                        requested = quantity,
                        reason = ?outcome.reason,
                        "reservation declined"
                    );
                    attempt.transition(PlacementState::StockInsufficient);
                    attempt.rollback().await?;
                    metrics::counter!("placement_insufficient_stock_total").increment(1);
                    metrics::histogram!("placement_duration_seconds")
                        .record(start.elapsed().as_secs_f64());
                    return Err(PlacementError::InsufficientStock(vec![product_id.clone()]));
                }
                Err(e) => {
                    attempt.rollback().await?;
                    return Err(e);
                }
            }
        }
        attempt.transition(PlacementState::StockReserved);

        let mut lines = Vec::with_capacity(demand.len());
        for (product_id, &quantity) in &demand {
            match OrderLine::new(product_id.clone(), quantity) {
                Ok(line) => lines.push(line),
                Err(e) => {
                    attempt.rollback().await?;
                    return Err(e.into());
                }
            }
        }

        // 3. Consume the cart and construct the immutable order.
        if let Err(e) = shared.cart.remove(&cart_item_ids).await {
            attempt.rollback().await?;
            return Err(e.into());
        }
        attempt.record_cart_removal(items);

        let order = match Order::place(Orderer::new(member_id, address), lines) {
            Ok(order) => order,
            Err(e) => {
                attempt.rollback().await?;
                return Err(e.into());
            }
        };
        if let Err(e) = shared.orders.insert(order.clone()).await {
            attempt.rollback().await?;
            return Err(e.into());
        }
        attempt.record_order(order.id());
        attempt.transition(PlacementState::OrderCreated);

        // 4. All product locks are free again; the external call runs
        // outside any critical section.
        match shared.gateway.submit(&order).await {
            Ok(confirmation) => {
                attempt.transition(PlacementState::FulfillmentConfirmed);
                attempt.confirm();
                metrics::counter!("placement_confirmed_total").increment(1);
                metrics::histogram!("placement_duration_seconds")
                    .record(start.elapsed().as_secs_f64());
                tracing::info!(
                    order = %order.id(),
                    reference = %confirmation.reference,
                    "placement confirmed"
                );
                Ok(PlacementReceipt {
                    order_id: order.id(),
                    fulfillment_reference: confirmation.reference,
                    lines: order.lines().to_vec(),
                })
            }
            Err(fault) => {
                attempt.transition(PlacementState::FulfillmentFailed);
                tracing::warn!(order = %order.id(), reason = %fault, "fulfillment failed, compensating");
                attempt.transition(PlacementState::Compensating);
                attempt.rollback().await?;
                attempt.transition(PlacementState::CompensatedFailure);
                metrics::counter!("placement_fulfillment_failed_total").increment(1);
                metrics::histogram!("placement_duration_seconds")
                    .record(start.elapsed().as_secs_f64());
                Err(PlacementError::FulfillmentFailed {
                    reason: fault.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fulfillment::{FulfillmentConfirmation, FulfillmentFault, InMemoryFulfillmentGateway};
    use async_trait::async_trait;
    use domain::{InMemoryCartStore, InMemoryOrderStore, InMemoryStockLedger};
    use lock::{InMemoryLockManager, LockError, LockKeySet};
    use std::time::Duration;

    type TestCoordinator = PlacementCoordinator<
        InMemoryLockManager,
        InMemoryCartStore,
        InMemoryStockLedger,
        InMemoryOrderStore,
        InMemoryFulfillmentGateway,
    >;

    struct Harness {
        coordinator: TestCoordinator,
        locks: InMemoryLockManager,
        cart: InMemoryCartStore,
        stock: InMemoryStockLedger,
        orders: InMemoryOrderStore,
        gateway: InMemoryFulfillmentGateway,
    }

    fn setup() -> Harness {
        let locks = InMemoryLockManager::new();
        let cart = InMemoryCartStore::new();
        let stock = InMemoryStockLedger::new();
        let orders = InMemoryOrderStore::new();
        let gateway = InMemoryFulfillmentGateway::new();

        // Every ledger mutation in these tests must happen inside the
        // product's critical section.
        let probe = locks.clone();
        stock.set_lock_probe(move |product_id| {
            probe.is_held_by_current_task(&LockKey::for_product(product_id))
        });

        let coordinator = PlacementCoordinator::new(
            locks.clone(),
            cart.clone(),
            stock.clone(),
            orders.clone(),
            gateway.clone(),
        );

        Harness {
            coordinator,
            locks,
            cart,
            stock,
            orders,
            gateway,
        }
    }

    fn address() -> Address {
        Address::new("04524", "100 Sejong-daero", None).unwrap()
    }

    async fn seed_cart(
        harness: &Harness,
        member_id: MemberId,
        sku: &str,
        quantity: u32,
    ) -> CartItemId {
        let item = CartItem::new(member_id, ProductId::new(sku), quantity).unwrap();
        let id = item.id();
        harness.cart.add(item).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_happy_path() {
        let harness = setup();
        let member_id = MemberId::new();
        harness.stock.set_entry(ProductId::new("SKU-001"), 10);
        harness.stock.set_entry(ProductId::new("SKU-002"), 10);
        let id1 = seed_cart(&harness, member_id, "SKU-001", 2).await;
        let id2 = seed_cart(&harness, member_id, "SKU-002", 1).await;

        let receipt = harness
            .coordinator
            .place(member_id, vec![id1, id2], address())
            .await
            .unwrap();

        assert_eq!(receipt.lines.len(), 2);
        assert_eq!(receipt.fulfillment_reference, "FUL-0001");

        // Cart consumed, stock decremented, order stored, gateway called.
        assert!(harness.cart.is_empty());
        assert_eq!(
            harness
                .stock
                .available(&ProductId::new("SKU-001"))
                .await
                .unwrap(),
            8
        );
        assert_eq!(
            harness
                .stock
                .available(&ProductId::new("SKU-002"))
                .await
                .unwrap(),
            9
        );
        assert_eq!(harness.orders.len(), 1);
        assert!(harness.gateway.has_submission(receipt.order_id));
        assert_eq!(harness.locks.active_hold_count(), 0);
    }

    #[tokio::test]
    async fn test_same_product_cart_items_group_into_one_line() {
        let harness = setup();
        let member_id = MemberId::new();
        harness.stock.set_entry(ProductId::new("SKU-001"), 10);
        let id1 = seed_cart(&harness, member_id, "SKU-001", 2).await;
        let id2 = seed_cart(&harness, member_id, "SKU-001", 3).await;

        let receipt = harness
            .coordinator
            .place(member_id, vec![id1, id2], address())
            .await
            .unwrap();

        assert_eq!(receipt.lines.len(), 1);
        assert_eq!(receipt.lines[0].quantity(), 5);
        assert_eq!(
            harness
                .stock
                .available(&ProductId::new("SKU-001"))
                .await
                .unwrap(),
            5
        );
    }

    #[tokio::test]
    async fn test_insufficient_stock_mutates_nothing() {
        let harness = setup();
        let member_id = MemberId::new();
        harness.stock.set_entry(ProductId::new("SKU-001"), 1);
        let id = seed_cart(&harness, member_id, "SKU-001", 2).await;
        let cart_before = harness.cart.snapshot();

        let result = harness
            .coordinator
            .place(member_id, vec![id], address())
            .await;
        match result {
            Err(PlacementError::InsufficientStock(products)) => {
                assert_eq!(products, vec![ProductId::new("SKU-001")]);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        assert_eq!(harness.cart.snapshot(), cart_before);
        assert_eq!(
            harness
                .stock
                .available(&ProductId::new("SKU-001"))
                .await
                .unwrap(),
            1
        );
        assert!(harness.orders.is_empty());
        assert_eq!(harness.gateway.submission_count(), 0);
        assert_eq!(harness.locks.active_hold_count(), 0);
    }

    #[tokio::test]
    async fn test_insufficient_second_product_releases_the_first() {
        let harness = setup();
        let member_id = MemberId::new();
        harness.stock.set_entry(ProductId::new("SKU-001"), 10);
        harness.stock.set_entry(ProductId::new("SKU-002"), 0);
        let id1 = seed_cart(&harness, member_id, "SKU-001", 2).await;
        let id2 = seed_cart(&harness, member_id, "SKU-002", 1).await;

        let result = harness
            .coordinator
            .place(member_id, vec![id1, id2], address())
            .await;
        assert!(matches!(result, Err(PlacementError::InsufficientStock(_))));

        // The first product's reservation was rolled back under its lock.
        assert_eq!(
            harness
                .stock
                .available(&ProductId::new("SKU-001"))
                .await
                .unwrap(),
            10
        );
        assert_eq!(harness.cart.len(), 2);
        assert!(harness.orders.is_empty());
        assert_eq!(harness.locks.active_hold_count(), 0);
    }

    #[tokio::test]
    async fn test_fulfillment_failure_restores_pre_request_state() {
        let harness = setup();
        let member_id = MemberId::new();
        harness.stock.set_entry(ProductId::new("SKU-001"), 10);
        let id = seed_cart(&harness, member_id, "SKU-001", 2).await;
        let cart_before = harness.cart.snapshot();
        harness.gateway.set_fail_on_submit(true);

        let result = harness
            .coordinator
            .place(member_id, vec![id], address())
            .await;
        assert!(matches!(
            result,
            Err(PlacementError::FulfillmentFailed { .. })
        ));

        // Post-compensation state is identical to pre-request state.
        assert_eq!(harness.cart.snapshot(), cart_before);
        assert_eq!(
            harness
                .stock
                .available(&ProductId::new("SKU-001"))
                .await
                .unwrap(),
            10
        );
        assert!(harness.orders.is_empty());
        assert_eq!(harness.locks.active_hold_count(), 0);
    }

    #[tokio::test]
    async fn test_foreign_cart_item_rejected_without_mutation() {
        let harness = setup();
        let owner = MemberId::new();
        let stranger = MemberId::new();
        harness.stock.set_entry(ProductId::new("SKU-001"), 10);
        let id = seed_cart(&harness, owner, "SKU-001", 2).await;

        let result = harness
            .coordinator
            .place(stranger, vec![id], address())
            .await;
        match result {
            Err(PlacementError::CartItemNotFound(ids)) => assert_eq!(ids, vec![id]),
            other => panic!("expected CartItemNotFound, got {other:?}"),
        }

        assert_eq!(
            harness
                .stock
                .available(&ProductId::new("SKU-001"))
                .await
                .unwrap(),
            10
        );
        assert_eq!(harness.cart.len(), 1);
        assert!(harness.orders.is_empty());
    }

    #[tokio::test]
    async fn test_empty_request_rejected() {
        let harness = setup();
        let result = harness
            .coordinator
            .place(MemberId::new(), Vec::new(), address())
            .await;
        assert!(matches!(
            result,
            Err(PlacementError::Domain(DomainError::EmptyOrder))
        ));
    }

    /// Gateway that parks forever, so a placement can be aborted while
    /// waiting on fulfillment.
    #[derive(Clone)]
    struct HangingGateway;

    #[async_trait]
    impl FulfillmentGateway for HangingGateway {
        async fn submit(
            &self,
            _order: &Order,
        ) -> Result<FulfillmentConfirmation, FulfillmentFault> {
            std::future::pending().await
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_aborted_placement_compensates_in_the_background() {
        let locks = InMemoryLockManager::new();
        let cart = InMemoryCartStore::new();
        let stock = InMemoryStockLedger::new();
        let orders = InMemoryOrderStore::new();
        let probe = locks.clone();
        stock.set_lock_probe(move |product_id| {
            probe.is_held_by_current_task(&LockKey::for_product(product_id))
        });

        let member_id = MemberId::new();
        stock.set_entry(ProductId::new("SKU-001"), 10);
        let item = CartItem::new(member_id, ProductId::new("SKU-001"), 2).unwrap();
        let id = item.id();
        cart.add(item).await.unwrap();
        let cart_before = cart.snapshot();

        let coordinator = Arc::new(PlacementCoordinator::new(
            locks.clone(),
            cart.clone(),
            stock.clone(),
            orders.clone(),
            HangingGateway,
        ));

        let task = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.place(member_id, vec![id], address()).await })
        };

        // Wait until the reservation landed and the task is parked in the
        // gateway call.
        let mut reserved = false;
        for _ in 0..200 {
            if stock.available(&ProductId::new("SKU-001")).await.unwrap() == 8 {
                reserved = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(reserved, "placement never reached the gateway");

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        // The detached rollback restores pre-request state.
        let mut restored = false;
        for _ in 0..200 {
            if stock.available(&ProductId::new("SKU-001")).await.unwrap() == 10
                && cart.len() == 1
                && orders.is_empty()
            {
                restored = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(restored, "aborted placement was not compensated");
        assert_eq!(cart.snapshot(), cart_before);
        assert_eq!(locks.active_hold_count(), 0);
    }

    /// Lock manager standing in for an unreachable coordination backend.
    struct UnavailableLockManager;

    #[async_trait]
    impl LockManager for UnavailableLockManager {
        type Guard = ();

        async fn acquire(&self, _keys: &LockKeySet) -> Result<(), LockError> {
            Err(LockError::BackendUnavailable(
                "coordination service unreachable".to_string(),
            ))
        }
    }

    #[tokio::test]
    async fn test_lock_backend_outage_surfaces_with_its_own_code() {
        let cart = InMemoryCartStore::new();
        let stock = InMemoryStockLedger::new();
        let orders = InMemoryOrderStore::new();
        stock.set_entry(ProductId::new("SKU-001"), 10);

        let member_id = MemberId::new();
        let item = CartItem::new(member_id, ProductId::new("SKU-001"), 1).unwrap();
        let id = item.id();
        cart.add(item).await.unwrap();

        let coordinator = PlacementCoordinator::new(
            UnavailableLockManager,
            cart.clone(),
            stock.clone(),
            orders.clone(),
            InMemoryFulfillmentGateway::new(),
        );

        let err = coordinator
            .place(member_id, vec![id], address())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PlacementError::Lock(LockError::BackendUnavailable(_))
        ));
        assert_eq!(err.code(), "LOCK_BACKEND_UNAVAILABLE");
        assert!(!err.is_business_outcome());

        // The outage aborted the placement before any mutation.
        assert_eq!(
            stock.available(&ProductId::new("SKU-001")).await.unwrap(),
            10
        );
        assert_eq!(cart.len(), 1);
        assert!(orders.is_empty());
    }
}
