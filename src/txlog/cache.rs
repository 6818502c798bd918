//! First-tier cache of in-progress page containers.
//!
//! Design:
//! - HashMap<page_key, Entry> stores the container and doubly-linked
//!   pointers (prev/next by page_key).
//! - head = MRU, tail = LRU.
//! - put() updates existing (move to head) or inserts a new head; inserting
//!   past capacity evicts the tail into the persistent second tier.
//! - get() does not reorder the list, so it works through a shared
//!   reference (and under the log's read lock); recency moves on put.
//! - Lookups fall through to the second tier on RAM miss: an evicted
//!   container stays reachable for the rest of its transaction.
//!
//! The cache owns the second tier; `close()` closes through.

use anyhow::Result;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::metrics::{record_drained, record_txlog_eviction, record_txlog_hit, record_txlog_miss};
use crate::page::RecordPageContainer;
use crate::txlog::persistent::PersistentCache;

pub struct LruCache<K: Ord, V> {
    cap: usize,
    map: HashMap<u64, Entry<K, V>>,
    head: Option<u64>, // Most-recently used
    tail: Option<u64>, // Least-recently used
    secondary: PersistentCache<K, V>,
}

struct Entry<K: Ord, V> {
    container: Arc<RecordPageContainer<K, V>>,
    prev: Option<u64>,
    next: Option<u64>,
}

impl<K, V> LruCache<K, V>
where
    K: Ord + Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    /// Cache with `cap` RAM slots spilling to `secondary`.
    pub fn new(cap: usize, secondary: PersistentCache<K, V>) -> Self {
        debug_assert!(cap >= 1);
        Self {
            cap,
            map: HashMap::with_capacity(cap.max(1)),
            head: None,
            tail: None,
            secondary,
        }
    }

    /// RAM lookup only; no recency bump, no I/O.
    pub fn get_ram(&self, page_key: u64) -> Option<Arc<RecordPageContainer<K, V>>> {
        self.map.get(&page_key).map(|e| e.container.clone())
    }

    /// Lookup across both tiers.
    pub fn get(&self, page_key: u64) -> Result<Option<Arc<RecordPageContainer<K, V>>>> {
        if let Some(container) = self.get_ram(page_key) {
            record_txlog_hit();
            return Ok(Some(container));
        }
        record_txlog_miss();
        Ok(self.secondary.get(page_key)?.map(Arc::new))
    }

    /// Insert or update, moving the entry to MRU. Evicts the LRU entry into
    /// the second tier when the RAM tier is full.
    pub fn put(&mut self, page_key: u64, container: Arc<RecordPageContainer<K, V>>) -> Result<()> {
        if let Some(entry) = self.map.get_mut(&page_key) {
            entry.container = container;
            self.detach(page_key);
            self.attach_front(page_key);
            return Ok(());
        }

        if self.map.len() >= self.cap {
            if let Some(victim) = self.tail {
                self.detach(victim);
                if let Some(entry) = self.map.remove(&victim) {
                    self.secondary.put(victim, &entry.container)?;
                    record_txlog_eviction();
                    debug!("txlog: spilled page {victim} to the second tier");
                }
            }
        }

        self.map.insert(
            page_key,
            Entry {
                container,
                prev: None,
                next: None,
            },
        );
        self.attach_front(page_key);
        Ok(())
    }

    pub fn put_all<I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (u64, Arc<RecordPageContainer<K, V>>)>,
    {
        for (page_key, container) in entries {
            self.put(page_key, container)?;
        }
        Ok(())
    }

    /// Drop the key from RAM and from the second tier if present there.
    pub fn remove(&mut self, page_key: u64) -> Result<bool> {
        let in_ram = self.map.contains_key(&page_key);
        if in_ram {
            self.detach(page_key);
            self.map.remove(&page_key);
        }
        let in_secondary = self.secondary.remove(page_key)?;
        Ok(in_ram || in_secondary)
    }

    /// Forget every RAM entry. The second tier is untouched.
    pub fn clear(&mut self) {
        self.map.clear();
        self.head = None;
        self.tail = None;
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Snapshot of the RAM tier.
    pub fn as_map(&self) -> HashMap<u64, Arc<RecordPageContainer<K, V>>> {
        self.map
            .iter()
            .map(|(k, e)| (*k, e.container.clone()))
            .collect()
    }

    /// Copy the RAM snapshot into the second tier. RAM keeps its entries.
    pub fn drain_to_secondary(&mut self) -> Result<usize> {
        let entries: Vec<(u64, Arc<RecordPageContainer<K, V>>)> = self
            .map
            .iter()
            .map(|(k, e)| (*k, e.container.clone()))
            .collect();
        let count = self
            .secondary
            .put_all(entries.iter().map(|(k, c)| (*k, c.as_ref())))?;
        record_drained(count as u64);
        Ok(count)
    }

    pub fn secondary(&self) -> &PersistentCache<K, V> {
        &self.secondary
    }

    /// Close the second tier; RAM contents are dropped.
    pub fn close(self) -> Result<()> {
        self.secondary.close()
    }

    // ---------------- internal helpers ----------------

    fn detach(&mut self, page_key: u64) {
        let (prev, next) = match self.map.get(&page_key) {
            Some(e) => (e.prev, e.next),
            None => return,
        };

        if self.head == Some(page_key) {
            self.head = next;
        }
        if self.tail == Some(page_key) {
            self.tail = prev;
        }

        if let Some(p) = prev {
            if let Some(pe) = self.map.get_mut(&p) {
                pe.next = next;
            }
        }
        if let Some(n) = next {
            if let Some(ne) = self.map.get_mut(&n) {
                ne.prev = prev;
            }
        }

        if let Some(e) = self.map.get_mut(&page_key) {
            e.prev = None;
            e.next = None;
        }
    }

    fn attach_front(&mut self, page_key: u64) {
        if self.head == Some(page_key) {
            return;
        }

        if let Some(e) = self.map.get_mut(&page_key) {
            e.prev = None;
            e.next = self.head;
        }

        if let Some(old_head) = self.head {
            if let Some(he) = self.map.get_mut(&old_head) {
                he.prev = Some(page_key);
            }
        }

        self.head = Some(page_key);

        if self.tail.is_none() {
            self.tail = Some(page_key);
        }
    }
}
