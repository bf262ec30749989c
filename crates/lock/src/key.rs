//! Lock keys and canonically ordered key sets.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::error::LockError;

/// Name of a single resource to serialize on.
///
/// Keys are plain non-empty strings; convention is `{kind}:{id}`,
/// e.g. `product:SKU-001`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockKey(String);

impl LockKey {
    /// Creates a lock key, rejecting blank input.
    pub fn new(key: impl Into<String>) -> Result<Self, LockError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(LockError::InvalidDeclaration(
                "lock key must not be blank".to_string(),
            ));
        }
        Ok(Self(key))
    }

    /// The key guarding a product's stock entry.
    pub fn for_product(product_id: &ProductId) -> Self {
        Self(format!("product:{product_id}"))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deduplicated, lexicographically sorted set of lock keys.
///
/// The sort order is the canonical acquisition order: two requests whose
/// key sets overlap always acquire the shared keys in the same sequence,
/// which rules out the classic AB/BA deadlock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockKeySet(Vec<LockKey>);

impl LockKeySet {
    /// Builds a key set from the given keys, sorting and deduplicating.
    ///
    /// An empty result is rejected: an operation that declares locking but
    /// resolves zero keys must not silently run unlocked.
    pub fn new(keys: impl IntoIterator<Item = LockKey>) -> Result<Self, LockError> {
        let mut keys: Vec<LockKey> = keys.into_iter().collect();
        keys.sort();
        keys.dedup();
        if keys.is_empty() {
            return Err(LockError::InvalidDeclaration(
                "lock declaration resolved zero keys".to_string(),
            ));
        }
        Ok(Self(keys))
    }

    /// Builds a single-key set.
    pub fn single(key: LockKey) -> Self {
        Self(vec![key])
    }

    /// Iterates keys in canonical acquisition order.
    pub fn iter(&self) -> std::slice::Iter<'_, LockKey> {
        self.0.iter()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a constructed set; kept for API completeness.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the keys as a slice, in canonical order.
    pub fn as_slice(&self) -> &[LockKey] {
        &self.0
    }
}

impl std::fmt::Display for LockKeySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for key in &self.0 {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{key}")?;
            first = false;
        }
        Ok(())
    }
}
