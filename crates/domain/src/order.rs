//! The order aggregate and its value objects.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{MemberId, OrderId, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Delivery address for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    postal_code: String,
    street_address: String,
    detail_address: Option<String>,
}

impl Address {
    /// Creates an address; postal code and street address are required.
    pub fn new(
        postal_code: impl Into<String>,
        street_address: impl Into<String>,
        detail_address: Option<String>,
    ) -> Result<Self, DomainError> {
        let postal_code = postal_code.into();
        let street_address = street_address.into();
        if postal_code.trim().is_empty() {
            return Err(DomainError::BlankAddressField {
                field: "postal_code",
            });
        }
        if street_address.trim().is_empty() {
            return Err(DomainError::BlankAddressField {
                field: "street_address",
            });
        }
        Ok(Self {
            postal_code,
            street_address,
            detail_address,
        })
    }

    pub fn postal_code(&self) -> &str {
        &self.postal_code
    }

    pub fn street_address(&self) -> &str {
        &self.street_address
    }

    pub fn detail_address(&self) -> Option<&str> {
        self.detail_address.as_deref()
    }

    /// Single-line rendering: `[postal] street, detail`.
    pub fn full_address(&self) -> String {
        match &self.detail_address {
            Some(detail) if !detail.trim().is_empty() => {
                format!("[{}] {}, {detail}", self.postal_code, self.street_address)
            }
            _ => format!("[{}] {}", self.postal_code, self.street_address),
        }
    }
}

/// The member placing an order, with their delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Orderer {
    pub member_id: MemberId,
    pub address: Address,
}

impl Orderer {
    pub fn new(member_id: MemberId, address: Address) -> Self {
        Self { member_id, address }
    }
}

/// One product/quantity pair within an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    product_id: ProductId,
    quantity: u32,
}

impl OrderLine {
    pub fn new(product_id: ProductId, quantity: u32) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(Self {
            product_id,
            quantity,
        })
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// An order as produced by the placement flow.
///
/// Constructed only after every constituent stock reservation succeeded;
/// immutable once created. Later lifecycle (payment, shipment) lives
/// outside this workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    orderer: Orderer,
    lines: Vec<OrderLine>,
    placed_at: DateTime<Utc>,
}

impl Order {
    /// Creates an order from its orderer and lines.
    pub fn place(orderer: Orderer, lines: Vec<OrderLine>) -> Result<Self, DomainError> {
        if lines.is_empty() {
            return Err(DomainError::EmptyOrder);
        }
        Ok(Self {
            id: OrderId::new(),
            orderer,
            lines,
            placed_at: Utc::now(),
        })
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn orderer(&self) -> &Orderer {
        &self.orderer
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn placed_at(&self) -> DateTime<Utc> {
        self.placed_at
    }
}

/// Persistence boundary for placed orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Stores a newly placed order.
    async fn insert(&self, order: Order) -> Result<(), DomainError>;

    /// Discards an order during compensation.
    async fn remove(&self, order_id: OrderId) -> Result<(), DomainError>;

    /// Point read by ID.
    async fn get(&self, order_id: OrderId) -> Result<Option<Order>, DomainError>;
}

/// In-memory order store for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders.
    pub fn len(&self) -> usize {
        self.orders.read().unwrap().len()
    }

    /// Returns true if no orders are stored.
    pub fn is_empty(&self) -> bool {
        self.orders.read().unwrap().is_empty()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<(), DomainError> {
        self.orders.write().unwrap().insert(order.id(), order);
        Ok(())
    }

    async fn remove(&self, order_id: OrderId) -> Result<(), DomainError> {
        self.orders
            .write()
            .unwrap()
            .remove(&order_id)
            .map(|_| ())
            .ok_or(DomainError::OrderNotFound(order_id))
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>, DomainError> {
        Ok(self.orders.read().unwrap().get(&order_id).cloned())
    }
}
