//! txlog — the two-tier transaction log.
//!
//! In-progress page containers live in a bounded RAM tier; overflow spills
//! to a persistent per-(revision, log_type) partition, and commit drains
//! the RAM snapshot into the same partition.
//!
//! Decomposition:
//! - cache.rs      — first tier: page-key LRU with eviction spill
//! - codec.rs      — container frame codec for the spill files
//! - persistent.rs — second tier: store.bin + index.bin + meta.json
//! - log.rs        — SynchronizedTransactionLog: reader/writer facade

pub mod cache;
pub mod codec;
pub mod log;
pub mod persistent;

use serde::{Deserialize, Serialize};

pub use cache::LruCache;
pub use log::SynchronizedTransactionLog;
pub use persistent::PersistentCache;

/// Which transaction log a partition belongs to. One log exists per index
/// family of an open resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogType {
    Records,
    Names,
    Paths,
    Indexes,
}

impl LogType {
    /// Stable name used in partition directories and sidecar metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::Records => "records",
            LogType::Names => "names",
            LogType::Paths => "paths",
            LogType::Indexes => "indexes",
        }
    }
}
