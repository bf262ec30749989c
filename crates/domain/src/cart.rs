//! Cart items and the cart store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{CartItemId, MemberId, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A member's intent to buy a quantity of one product.
///
/// Owned by the member's cart; physically removed (not flagged) once
/// consumed by a successful order, and re-inserted by compensation if the
/// order falls through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    id: CartItemId,
    member_id: MemberId,
    product_id: ProductId,
    quantity: u32,
}

impl CartItem {
    /// Creates a cart item; quantity must be at least 1.
    pub fn new(
        member_id: MemberId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(Self {
            id: CartItemId::new(),
            member_id,
            product_id,
            quantity,
        })
    }

    pub fn id(&self) -> CartItemId {
        self.id
    }

    pub fn member_id(&self) -> MemberId {
        self.member_id
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Replaces the quantity, re-validating the lower bound.
    pub fn update_quantity(&mut self, quantity: u32) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        self.quantity = quantity;
        Ok(())
    }
}

/// Point reads and mutations over cart items.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Loads the given items, requiring every ID to exist and belong to
    /// `member_id`. Any miss fails the whole read with
    /// [`DomainError::CartItemNotFound`] naming the offending IDs.
    async fn find_for_member(
        &self,
        member_id: MemberId,
        ids: &[CartItemId],
    ) -> Result<Vec<CartItem>, DomainError>;

    /// Adds an item to its owner's cart.
    async fn add(&self, item: CartItem) -> Result<(), DomainError>;

    /// Physically removes the given items.
    async fn remove(&self, ids: &[CartItemId]) -> Result<(), DomainError>;

    /// Re-inserts previously removed items (compensation path).
    async fn restore(&self, items: Vec<CartItem>) -> Result<(), DomainError>;
}

/// In-memory cart store for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartStore {
    items: Arc<RwLock<HashMap<CartItemId, CartItem>>>,
}

impl InMemoryCartStore {
    /// Creates a new empty in-memory cart store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored cart items, across all members.
    pub fn len(&self) -> usize {
        self.items.read().unwrap().len()
    }

    /// Returns true if no cart items are stored.
    pub fn is_empty(&self) -> bool {
        self.items.read().unwrap().is_empty()
    }

    /// Returns true if an item with the given ID exists.
    pub fn contains(&self, id: CartItemId) -> bool {
        self.items.read().unwrap().contains_key(&id)
    }

    /// Snapshot of all items, sorted by ID for stable comparison.
    pub fn snapshot(&self) -> Vec<CartItem> {
        let mut items: Vec<CartItem> = self.items.read().unwrap().values().cloned().collect();
        items.sort_by_key(|item| item.id().as_uuid());
        items
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn find_for_member(
        &self,
        member_id: MemberId,
        ids: &[CartItemId],
    ) -> Result<Vec<CartItem>, DomainError> {
        let items = self.items.read().unwrap();

        let mut found = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();
        for id in ids {
            match items.get(id) {
                Some(item) if item.member_id() == member_id => found.push(item.clone()),
                _ => missing.push(*id),
            }
        }

        if missing.is_empty() {
            Ok(found)
        } else {
            Err(DomainError::CartItemNotFound(missing))
        }
    }

    async fn add(&self, item: CartItem) -> Result<(), DomainError> {
        self.items.write().unwrap().insert(item.id(), item);
        Ok(())
    }

    async fn remove(&self, ids: &[CartItemId]) -> Result<(), DomainError> {
        let mut items = self.items.write().unwrap();
        for id in ids {
            items.remove(id);
        }
        Ok(())
    }

    async fn restore(&self, restored: Vec<CartItem>) -> Result<(), DomainError> {
        let mut items = self.items.write().unwrap();
        for item in restored {
            items.insert(item.id(), item);
        }
        Ok(())
    }
}
