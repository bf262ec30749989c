//! Declarative lock declarations.
//!
//! A [`LockDeclaration`] marks an operation as requiring named locks
//! derived from its own arguments. The declaration owns only the
//! key-resolution function; acquisition mechanics stay with the
//! [`LockManager`].

use std::future::Future;
use std::marker::PhantomData;

use crate::error::LockError;
use crate::key::{LockKey, LockKeySet};
use crate::manager::LockManager;

/// Binds a key-resolution function to an operation's argument type.
///
/// At call time the declared resolver runs against the actual arguments,
/// the resulting keys are canonicalized into a [`LockKeySet`], and the
/// operation body is routed through the manager's critical section. A
/// resolver that produces zero keys fails the call with
/// [`LockError::InvalidDeclaration`] before any business logic runs.
pub struct LockDeclaration<A, R>
where
    R: Fn(&A) -> Vec<LockKey>,
{
    resolver: R,
    _args: PhantomData<fn(&A)>,
}

impl<A, R> LockDeclaration<A, R>
where
    R: Fn(&A) -> Vec<LockKey> + Send + Sync,
{
    /// Creates a declaration from a key-resolution function.
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            _args: PhantomData,
        }
    }

    /// Resolves the declared keys against concrete arguments.
    pub fn resolve(&self, args: &A) -> Result<LockKeySet, LockError> {
        LockKeySet::new((self.resolver)(args))
    }

    /// Invokes `body(args)` inside the critical section for the resolved keys.
    pub async fn invoke<M, T, F, Fut>(
        &self,
        manager: &M,
        args: A,
        body: F,
    ) -> Result<T, LockError>
    where
        M: LockManager,
        A: Send + Sync,
        T: Send,
        F: FnOnce(A) -> Fut + Send,
        Fut: Future<Output = T> + Send,
    {
        let keys = self.resolve(&args)?;
        manager.execute_with_lock(&keys, move || body(args)).await
    }
}
