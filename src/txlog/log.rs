//! SynchronizedTransactionLog — thread-safe facade over the two tiers.
//!
//! One reader/writer lock guards both tiers: shared for lookups, exclusive
//! for every mutation. Second-tier I/O happens only under the exclusive
//! lock (eviction inside put, explicit drain), except for reads of already
//! spilled frames, which the shared lock permits because the store file is
//! append-only. No lock is held across a return.
//!
//! `get` hands out `Arc` snapshots: a reader either sees the EMPTY sentinel
//! or a structurally complete container, never a torn one. Writers
//! clone-on-write and `put` a fresh container back.

use anyhow::Result;
use log::info;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::config::StoreConfig;
use crate::page::RecordPageContainer;
use crate::txlog::cache::LruCache;
use crate::txlog::persistent::PersistentCache;
use crate::txlog::LogType;

pub struct SynchronizedTransactionLog<K: Ord, V> {
    inner: RwLock<LruCache<K, V>>,
}

impl<K, V> SynchronizedTransactionLog<K, V>
where
    K: Ord + Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    /// Open the log for one `(revision, log_type)` partition under `root`.
    pub fn open(
        root: &Path,
        revision: u64,
        log_type: LogType,
        config: &StoreConfig,
    ) -> Result<Self> {
        config.validate()?;
        let secondary = PersistentCache::open(root, revision, log_type, config.node_count)?;
        Ok(Self {
            inner: RwLock::new(LruCache::new(config.log_cache_slots, secondary)),
        })
    }

    /// The cached container for `page_key`, or the EMPTY sentinel.
    pub fn get(&self, page_key: u64) -> Result<Arc<RecordPageContainer<K, V>>> {
        let guard = self.inner.read();
        match guard.get(page_key)? {
            Some(container) => Ok(container),
            None => Ok(Arc::new(RecordPageContainer::empty())),
        }
    }

    /// RAM-tier snapshot for the subset of `keys` currently resident.
    pub fn get_all(&self, keys: &[u64]) -> HashMap<u64, Arc<RecordPageContainer<K, V>>> {
        let guard = self.inner.read();
        keys.iter()
            .filter_map(|k| guard.get_ram(*k).map(|c| (*k, c)))
            .collect()
    }

    pub fn put(&self, page_key: u64, container: RecordPageContainer<K, V>) -> Result<()> {
        self.inner.write().put(page_key, Arc::new(container))
    }

    pub fn put_all<I>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (u64, RecordPageContainer<K, V>)>,
    {
        let mut guard = self.inner.write();
        for (page_key, container) in entries {
            guard.put(page_key, Arc::new(container))?;
        }
        Ok(())
    }

    /// Drop the key from RAM, and from the persistent tier if present there.
    pub fn remove(&self, page_key: u64) -> Result<bool> {
        self.inner.write().remove(page_key)
    }

    /// Forget every RAM entry; the persistent tier is untouched.
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Copy the RAM snapshot into the persistent tier (commit path). RAM
    /// keeps its entries; aborting afterwards is still possible.
    pub fn drain_to_secondary(&self) -> Result<usize> {
        let count = self.inner.write().drain_to_secondary()?;
        info!("txlog: drained {count} container(s) to the second tier");
        Ok(count)
    }

    /// RAM-resident entry count.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Snapshot of the RAM tier.
    pub fn as_map(&self) -> HashMap<u64, Arc<RecordPageContainer<K, V>>> {
        self.inner.read().as_map()
    }

    /// Close the RAM tier, which closes the persistent tier and releases
    /// the partition lock.
    pub fn close(self) -> Result<()> {
        self.inner.into_inner().close()
    }
}
