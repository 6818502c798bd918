//! Centralized configuration and builder for StrataDB.
//!
//! Goals:
//! - Single place to collect tunables instead of scattering env lookups.
//! - `StoreConfig::from_env()` reads `SDB_*` variables; fluent `with_*`
//!   setters override specific fields on top.
//! - `validate()` is called once by the transaction log before any tier is
//!   opened; the versioning parameters are immutable per database afterwards.

use anyhow::{bail, Result};

use crate::consts::{DEFAULT_LOG_CACHE_SLOTS, DEFAULT_REVS_TO_RESTORE, NDP_NODE_COUNT};
use crate::version::Versioning;

/// Top-level configuration for a StrataDB resource.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Reconstruction strategy. Immutable per database.
    /// Env: SDB_VERSIONING (full|differential|incremental|sliding)
    pub versioning: Versioning,

    /// Window `w`: how many revisions a fold may range across. Must be >= 1.
    /// Env: SDB_REVS_TO_RESTORE (default 3)
    pub revs_to_restore: u32,

    /// Page capacity: maximum entries per record page, both keyspaces
    /// combined. Immutable per database.
    /// Env: SDB_NODE_COUNT (default 512)
    pub node_count: usize,

    /// First-tier slots per transaction log (containers held in RAM before
    /// eviction spills them to the persistent tier).
    /// Env: SDB_LOG_CACHE_SLOTS (default 1024)
    pub log_cache_slots: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            versioning: Versioning::SlidingSnapshot,
            revs_to_restore: DEFAULT_REVS_TO_RESTORE,
            node_count: NDP_NODE_COUNT,
            log_cache_slots: DEFAULT_LOG_CACHE_SLOTS,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("SDB_VERSIONING") {
            if let Ok(kind) = v.trim().parse::<Versioning>() {
                cfg.versioning = kind;
            }
        }

        if let Ok(v) = std::env::var("SDB_REVS_TO_RESTORE") {
            if let Ok(n) = v.trim().parse::<u32>() {
                cfg.revs_to_restore = n;
            }
        }

        if let Ok(v) = std::env::var("SDB_NODE_COUNT") {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.node_count = n;
            }
        }

        if let Ok(v) = std::env::var("SDB_LOG_CACHE_SLOTS") {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.log_cache_slots = n;
            }
        }

        cfg
    }

    /// Fluent setters (builder-style) to override specific fields.

    pub fn with_versioning(mut self, kind: Versioning) -> Self {
        self.versioning = kind;
        self
    }

    pub fn with_revs_to_restore(mut self, window: u32) -> Self {
        self.revs_to_restore = window;
        self
    }

    pub fn with_node_count(mut self, capacity: usize) -> Self {
        self.node_count = capacity;
        self
    }

    pub fn with_log_cache_slots(mut self, slots: usize) -> Self {
        self.log_cache_slots = slots;
        self
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.revs_to_restore < 1 {
            bail!("revs_to_restore must be >= 1");
        }
        if self.node_count < 1 {
            bail!("node_count must be >= 1");
        }
        if self.log_cache_slots < 1 {
            bail!("log_cache_slots must be >= 1");
        }
        Ok(())
    }
}
