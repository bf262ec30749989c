//! Lock manager trait.

use std::future::Future;

use async_trait::async_trait;

use crate::error::LockError;
use crate::key::LockKeySet;

/// Maps named keys to mutually exclusive critical sections.
///
/// An implementation must acquire every key of a set in the set's
/// canonical order before the critical section runs, block only callers
/// contending for the same keys, and release every acquired key on every
/// exit path. Release is carried by the returned guard: dropping it frees
/// the keys exactly once, whether the drop happens normally, on panic, or
/// when the owning future is cancelled.
#[async_trait]
pub trait LockManager: Send + Sync {
    /// Scoped handle over the acquired keys; releases them on drop.
    type Guard: Send;

    /// Acquires every key in the set, waiting for contended keys up to the
    /// implementation's configured bound.
    async fn acquire(&self, keys: &LockKeySet) -> Result<Self::Guard, LockError>;

    /// Runs `action` inside the critical section for `keys`.
    ///
    /// All keys are released before this returns, on the success path as
    /// well as the failure path; the action's own outcome is passed
    /// through untouched.
    async fn execute_with_lock<T, F, Fut>(
        &self,
        keys: &LockKeySet,
        action: F,
    ) -> Result<T, LockError>
    where
        T: Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = T> + Send,
    {
        let guard = self.acquire(keys).await?;
        let value = action().await;
        drop(guard);
        Ok(value)
    }
}
