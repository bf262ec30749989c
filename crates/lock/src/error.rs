//! Lock error types.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while declaring or acquiring locks.
#[derive(Debug, Error)]
pub enum LockError {
    /// Waiting for a contended key exceeded the configured bound.
    #[error("timed out after {waited:?} waiting for lock '{key}'")]
    AcquireTimeout { key: String, waited: Duration },

    /// The coordination backend cannot be reached. Fatal to the calling
    /// operation; never retried internally.
    #[error("lock backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A lock declaration resolved to zero keys, or a key was blank.
    #[error("invalid lock declaration: {0}")]
    InvalidDeclaration(String),

    /// The current task already holds one of the requested keys.
    ///
    /// Re-entrant acquisition is rejected rather than granted, so the
    /// mistake surfaces as an error instead of a deadlock.
    #[error("lock '{key}' is already held by the current task")]
    ReentrantAcquisition { key: String },
}

impl LockError {
    /// Stable external error code for the presentation boundary.
    pub fn code(&self) -> &'static str {
        match self {
            LockError::AcquireTimeout { .. } => "LOCK_ACQUISITION_TIMEOUT",
            LockError::BackendUnavailable(_) => "LOCK_BACKEND_UNAVAILABLE",
            LockError::InvalidDeclaration(_) => "INVALID_LOCK_DECLARATION",
            LockError::ReentrantAcquisition { .. } => "LOCK_REENTRANT_ACQUISITION",
        }
    }
}

/// Convenience type alias for lock results.
pub type Result<T> = std::result::Result<T, LockError>;
