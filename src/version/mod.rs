//! version — the reconstruction-policy algebra.
//!
//! A policy answers three questions for a logical page:
//! - which prior revision roots a reader must fetch (`fetch_plan`),
//! - how their fragments fold into one materialized page (`combine_for_read`),
//! - what the next on-disk delta must contain so every record stays
//!   recoverable within the configured window (`combine_for_modify`).
//!
//! Decomposition:
//! - full.rs         — every commit writes the whole page
//! - differential.rs — delta against the last full dump, at most two fragments
//! - incremental.rs  — delta chain, full dump once the chain spans the window
//! - sliding.rs      — no dumps; keys aging out of the window are rescued
//!                     into the current delta (plan/read shared with
//!                     incremental)
//!
//! All folds run newest-first with first-writer-wins, stop at page capacity,
//! and treat the record and reference keyspaces independently. Inputs are
//! read-only; outputs are fresh pages.

pub mod differential;
pub mod full;
pub mod incremental;
pub mod sliding;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::page::{KeyValuePage, PageReference, RecordPageContainer};
use crate::trx::PageReadTrx;

/// Closed family of reconstruction policies. Selection is immutable per
/// database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Versioning {
    Full,
    Differential,
    Incremental,
    SlidingSnapshot,
}

impl Versioning {
    /// Revision roots whose fragments the caller must load, newest first.
    /// `previous_revision` is the latest committed revision.
    pub fn fetch_plan(&self, previous_revision: u64, revs_to_restore: u32) -> Vec<u64> {
        debug_assert!(revs_to_restore >= 1);
        match self {
            Versioning::Full => full::fetch_plan(previous_revision),
            Versioning::Differential => {
                differential::fetch_plan(previous_revision, revs_to_restore)
            }
            Versioning::Incremental | Versioning::SlidingSnapshot => {
                incremental::fetch_plan(previous_revision, revs_to_restore)
            }
        }
    }

    /// Fold `fragments` (in `fetch_plan` order) into a single page suitable
    /// for reading. The result is dirty iff more than one fragment was
    /// supplied.
    pub fn combine_for_read<K, V>(
        &self,
        fragments: Vec<KeyValuePage<K, V>>,
        revs_to_restore: u32,
        trx: &impl PageReadTrx,
    ) -> Result<KeyValuePage<K, V>>
    where
        K: Ord + Clone,
        V: Clone,
    {
        match self {
            Versioning::Full => full::combine_for_read(fragments),
            Versioning::Differential => differential::combine_for_read(fragments, trx),
            Versioning::Incremental | Versioning::SlidingSnapshot => {
                incremental::combine_for_read(fragments, revs_to_restore, trx)
            }
        }
    }

    /// Fold `fragments` into the `(complete, modified)` pair a writer needs:
    /// the full view for reads plus the subset that must be serialized as
    /// the next delta. `back_ref` becomes the back-reference of both pages.
    pub fn combine_for_modify<K, V>(
        &self,
        fragments: Vec<KeyValuePage<K, V>>,
        revs_to_restore: u32,
        trx: &impl PageReadTrx,
        back_ref: Option<PageReference>,
    ) -> Result<RecordPageContainer<K, V>>
    where
        K: Ord + Clone,
        V: Clone,
    {
        match self {
            Versioning::Full => full::combine_for_modify(fragments, trx, back_ref),
            Versioning::Differential => {
                differential::combine_for_modify(fragments, revs_to_restore, trx, back_ref)
            }
            Versioning::Incremental => {
                incremental::combine_for_modify(fragments, revs_to_restore, trx, back_ref)
            }
            Versioning::SlidingSnapshot => {
                sliding::combine_for_modify(fragments, revs_to_restore, trx, back_ref)
            }
        }
    }
}

impl FromStr for Versioning {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Versioning::Full),
            "differential" => Ok(Versioning::Differential),
            "incremental" => Ok(Versioning::Incremental),
            "sliding" | "sliding_snapshot" => Ok(Versioning::SlidingSnapshot),
            other => Err(anyhow::anyhow!("unknown versioning kind: {other}")),
        }
    }
}

impl fmt::Display for Versioning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Versioning::Full => "full",
            Versioning::Differential => "differential",
            Versioning::Incremental => "incremental",
            Versioning::SlidingSnapshot => "sliding",
        };
        f.write_str(s)
    }
}

// ---------------- shared fold helpers ----------------

/// Newest fragment of a non-empty fold input, or the empty-input invariant
/// error every strategy shares.
pub(crate) fn first_fragment<'a, K: Ord, V>(
    fragments: &'a [KeyValuePage<K, V>],
) -> Result<&'a KeyValuePage<K, V>> {
    fragments.first().ok_or_else(|| {
        StoreError::InvariantViolation("combine called with an empty fragment list".to_string())
            .into()
    })
}

/// Install every entry of `frag` that is not yet present in `out`,
/// first-writer-wins, stopping each keyspace once `out` is at capacity.
pub(crate) fn fold_fragment<K, V>(out: &mut KeyValuePage<K, V>, frag: &KeyValuePage<K, V>)
where
    K: Ord + Clone,
    V: Clone,
{
    debug_assert_eq!(out.page_key(), frag.page_key());
    for (key, value) in frag.records() {
        if out.is_full() {
            break;
        }
        out.put_record_if_absent(key.clone(), value.clone());
    }
    for (key, reference) in frag.references() {
        if out.is_full() {
            break;
        }
        out.put_reference_if_absent(key.clone(), *reference);
    }
}
