//! Typed failure kinds of the engine.
//!
//! Propagation policy:
//! - invariant violations and capacity overruns are internal bugs; they abort
//!   the enclosing transaction and are never retried;
//! - second-tier I/O failures are surfaced verbatim (the anyhow context names
//!   the file and operation).
//!
//! Everything travels through `anyhow::Result`; callers that need to branch on
//! the kind use `err.downcast_ref::<StoreError>()`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A strategy precondition failed (wrong fragment count, empty input,
    /// mismatched page keys). Abort the current transaction.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// An insert would push a page past its configured capacity.
    #[error("capacity exceeded on page {page_key}: limit is {capacity} entries")]
    CapacityExceeded { page_key: u64, capacity: usize },

    /// Persistent tier returned corrupt or unreadable data.
    #[error("storage i/o: {0}")]
    StorageIo(String),
}
