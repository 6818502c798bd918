//! RecordPageContainer — the (complete, modified) pair a writer works on.
//!
//! `complete` is the fully materialized view of the logical page; `modified`
//! holds exactly the entries that will be serialized as the next on-disk
//! fragment. Both share page key and back-reference. The distinguished EMPTY
//! sentinel is what cache misses return.
//!
//! Lifecycle: built by `Versioning::combine_for_modify` (or by hand for a
//! brand-new page), mutated only by the owning writer transaction through
//! the write-through API below, then drained to the persistent tier at
//! commit or dropped on abort.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::page::kv::KeyValuePage;
use crate::page::record::PageReference;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPageContainer<K: Ord, V> {
    complete: Option<KeyValuePage<K, V>>,
    modified: Option<KeyValuePage<K, V>>,
}

impl<K: Ord, V> RecordPageContainer<K, V> {
    pub fn new(complete: KeyValuePage<K, V>, modified: KeyValuePage<K, V>) -> Self {
        debug_assert_eq!(complete.page_key(), modified.page_key());
        debug_assert_eq!(complete.page_kind(), modified.page_kind());
        Self {
            complete: Some(complete),
            modified: Some(modified),
        }
    }

    /// The EMPTY sentinel returned on cache miss.
    pub fn empty() -> Self {
        Self {
            complete: None,
            modified: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.complete.is_none()
    }

    pub fn page_key(&self) -> Option<u64> {
        self.complete.as_ref().map(|p| p.page_key())
    }

    pub fn complete(&self) -> Option<&KeyValuePage<K, V>> {
        self.complete.as_ref()
    }

    pub fn modified(&self) -> Option<&KeyValuePage<K, V>> {
        self.modified.as_ref()
    }

    /// Split the container back into its pages (commit serialization path).
    pub fn into_pages(self) -> Option<(KeyValuePage<K, V>, KeyValuePage<K, V>)> {
        match (self.complete, self.modified) {
            (Some(c), Some(m)) => Some((c, m)),
            _ => None,
        }
    }
}

impl<K: Ord + Clone, V: Clone> RecordPageContainer<K, V> {
    /// Land a record write in both pages: the complete view picks up the new
    /// value, and the delta page will carry it to disk at commit.
    pub fn put_record(&mut self, key: K, value: V) -> Result<()> {
        let (complete, modified) = self.pages_mut()?;
        complete.put_record(key.clone(), value.clone())?;
        complete.set_dirty(true);
        modified.put_record(key, value)?;
        modified.set_dirty(true);
        Ok(())
    }

    /// Reference-keyspace twin of `put_record`.
    pub fn put_reference(&mut self, key: K, reference: PageReference) -> Result<()> {
        let (complete, modified) = self.pages_mut()?;
        complete.put_reference(key.clone(), reference)?;
        complete.set_dirty(true);
        modified.put_reference(key, reference)?;
        modified.set_dirty(true);
        Ok(())
    }

    fn pages_mut(&mut self) -> Result<(&mut KeyValuePage<K, V>, &mut KeyValuePage<K, V>)> {
        match (self.complete.as_mut(), self.modified.as_mut()) {
            (Some(c), Some(m)) => Ok((c, m)),
            _ => Err(StoreError::InvariantViolation(
                "write into the EMPTY container".to_string(),
            )
            .into()),
        }
    }
}
