//! KeyValuePage — fixed-capacity record page.
//!
//! A page carries two independent keyspaces under one capacity bound:
//! record entries (`K -> V`) and reference entries (`K -> PageReference`,
//! for indirect pages). `size()` counts both. Fragments of the same logical
//! page share `page_key` and `page_kind`; the optional `previous` reference
//! points at an older fragment of the same page and is never dereferenced
//! here.
//!
//! Pages handed into strategy folds are read-only inputs; folds build fresh
//! outputs via `new_instance`.

use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::page::record::{PageKind, PageReference};
use crate::trx::PageReadTrx;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValuePage<K: Ord, V> {
    page_key: u64,
    page_kind: PageKind,
    revision: u64,
    previous: Option<PageReference>,
    capacity: usize,
    dirty: bool,
    records: BTreeMap<K, V>,
    references: BTreeMap<K, PageReference>,
}

impl<K: Ord, V> KeyValuePage<K, V> {
    /// Fresh empty page. `capacity` bounds both keyspaces combined and is
    /// fixed for the lifetime of the page.
    pub fn new(
        page_key: u64,
        page_kind: PageKind,
        previous: Option<PageReference>,
        capacity: usize,
        revision: u64,
    ) -> Self {
        Self {
            page_key,
            page_kind,
            revision,
            previous,
            capacity,
            dirty: false,
            records: BTreeMap::new(),
            references: BTreeMap::new(),
        }
    }

    /// Empty sibling of this page: same page key, kind and capacity, revision
    /// taken from the transaction, back-reference supplied by the caller.
    pub fn new_instance(
        &self,
        previous: Option<PageReference>,
        trx: &impl PageReadTrx,
    ) -> KeyValuePage<K, V> {
        KeyValuePage::new(
            self.page_key,
            self.page_kind,
            previous,
            self.capacity,
            trx.revision(),
        )
    }

    pub fn page_key(&self) -> u64 {
        self.page_key
    }

    pub fn page_kind(&self) -> PageKind {
        self.page_kind
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn previous(&self) -> Option<PageReference> {
        self.previous
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries present across both keyspaces.
    pub fn size(&self) -> usize {
        self.records.len() + self.references.len()
    }

    pub fn is_full(&self) -> bool {
        self.size() >= self.capacity
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    pub fn get_record(&self, key: &K) -> Option<&V> {
        self.records.get(key)
    }

    pub fn contains_record(&self, key: &K) -> bool {
        self.records.contains_key(key)
    }

    pub fn get_reference(&self, key: &K) -> Option<&PageReference> {
        self.references.get(key)
    }

    pub fn contains_reference(&self, key: &K) -> bool {
        self.references.contains_key(key)
    }

    pub fn records(&self) -> impl Iterator<Item = (&K, &V)> {
        self.records.iter()
    }

    pub fn references(&self) -> impl Iterator<Item = (&K, &PageReference)> {
        self.references.iter()
    }

    /// Insert or replace a record entry. Inserting a new key into a full
    /// page is a `CapacityExceeded` bug.
    pub fn put_record(&mut self, key: K, value: V) -> Result<()> {
        if !self.records.contains_key(&key) && self.is_full() {
            return Err(StoreError::CapacityExceeded {
                page_key: self.page_key,
                capacity: self.capacity,
            }
            .into());
        }
        self.records.insert(key, value);
        Ok(())
    }

    /// Insert or replace a reference entry, same capacity rule as records.
    pub fn put_reference(&mut self, key: K, reference: PageReference) -> Result<()> {
        if !self.references.contains_key(&key) && self.is_full() {
            return Err(StoreError::CapacityExceeded {
                page_key: self.page_key,
                capacity: self.capacity,
            }
            .into());
        }
        self.references.insert(key, reference);
        Ok(())
    }

    /// First-writer-wins install: keeps an existing entry, skips when the
    /// page is full. Returns true iff the entry was installed.
    pub fn put_record_if_absent(&mut self, key: K, value: V) -> bool {
        if self.records.contains_key(&key) {
            return false;
        }
        if self.is_full() {
            return false;
        }
        self.records.insert(key, value);
        true
    }

    /// Reference-keyspace twin of `put_record_if_absent`.
    pub fn put_reference_if_absent(&mut self, key: K, reference: PageReference) -> bool {
        if self.references.contains_key(&key) {
            return false;
        }
        if self.is_full() {
            return false;
        }
        self.references.insert(key, reference);
        true
    }
}
