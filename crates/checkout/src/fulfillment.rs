//! Fulfillment gateway trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;
use domain::Order;
use thiserror::Error;

/// Opaque failure from the fulfillment gateway.
///
/// Timeouts, rejections, and transport errors all collapse into this one
/// shape; the placement flow treats them uniformly.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct FulfillmentFault(pub String);

/// Result of a successful fulfillment submission.
#[derive(Debug, Clone)]
pub struct FulfillmentConfirmation {
    /// The reference assigned by the fulfillment provider.
    pub reference: String,
}

/// External order-fulfillment API, treated as a black box.
///
/// The gateway owns its own timeout contract. Callers must not hold any
/// lock across `submit`; the placement flow releases all product locks
/// before invoking it.
#[async_trait]
pub trait FulfillmentGateway: Send + Sync {
    /// Submits a confirmed order for fulfillment.
    async fn submit(&self, order: &Order) -> Result<FulfillmentConfirmation, FulfillmentFault>;
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    submitted: Vec<OrderId>,
    next_ref: u32,
    fail_on_submit: bool,
}

/// In-memory fulfillment gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFulfillmentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryFulfillmentGateway {
    /// Creates a new in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to fail submissions.
    pub fn set_fail_on_submit(&self, fail: bool) {
        self.state.write().unwrap().fail_on_submit = fail;
    }

    /// Returns the number of accepted submissions.
    pub fn submission_count(&self) -> usize {
        self.state.read().unwrap().submitted.len()
    }

    /// Returns true if the given order was accepted.
    pub fn has_submission(&self, order_id: OrderId) -> bool {
        self.state.read().unwrap().submitted.contains(&order_id)
    }
}

#[async_trait]
impl FulfillmentGateway for InMemoryFulfillmentGateway {
    async fn submit(&self, order: &Order) -> Result<FulfillmentConfirmation, FulfillmentFault> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_submit {
            return Err(FulfillmentFault("gateway rejected the order".to_string()));
        }

        state.next_ref += 1;
        let reference = format!("FUL-{:04}", state.next_ref);
        state.submitted.push(order.id());

        Ok(FulfillmentConfirmation { reference })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{MemberId, ProductId};
    use domain::{Address, OrderLine, Orderer};

    fn order() -> Order {
        let orderer = Orderer::new(
            MemberId::new(),
            Address::new("04524", "100 Sejong-daero", None).unwrap(),
        );
        let lines = vec![OrderLine::new(ProductId::new("SKU-001"), 1).unwrap()];
        Order::place(orderer, lines).unwrap()
    }

    #[tokio::test]
    async fn test_submit_assigns_sequential_references() {
        let gateway = InMemoryFulfillmentGateway::new();

        let c1 = gateway.submit(&order()).await.unwrap();
        let c2 = gateway.submit(&order()).await.unwrap();

        assert_eq!(c1.reference, "FUL-0001");
        assert_eq!(c2.reference, "FUL-0002");
        assert_eq!(gateway.submission_count(), 2);
    }

    #[tokio::test]
    async fn test_fail_on_submit() {
        let gateway = InMemoryFulfillmentGateway::new();
        gateway.set_fail_on_submit(true);

        let result = gateway.submit(&order()).await;
        assert!(result.is_err());
        assert_eq!(gateway.submission_count(), 0);
    }
}
