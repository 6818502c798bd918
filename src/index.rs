//! Seam to the revision-root index, plus the read-path glue that drives it.
//!
//! The engine does not define how fragments are stored; it only says which
//! revisions to ask for (`Versioning::fetch_plan`) and how to fold whatever
//! comes back. `RevisionIndex` is the consumed half of that contract; the
//! two free functions below spell the data flow out so callers (and the
//! test suite) get plan -> load -> fold in one call.

use anyhow::Result;

use crate::page::{KeyValuePage, PageReference, RecordPageContainer};
use crate::trx::PageReadTrx;
use crate::version::Versioning;

/// Maps a `(page_key, revision)` pair to the fragment that commit wrote for
/// the page, if it touched the page at all.
pub trait RevisionIndex<K: Ord, V> {
    fn fragment(&self, page_key: u64, revision: u64) -> Result<Option<KeyValuePage<K, V>>>;
}

/// Materialize a logical page for reading: plan, load, fold.
pub fn restore_page<K, V, I, T>(
    versioning: Versioning,
    index: &I,
    page_key: u64,
    previous_revision: u64,
    revs_to_restore: u32,
    trx: &T,
) -> Result<KeyValuePage<K, V>>
where
    K: Ord + Clone,
    V: Clone,
    I: RevisionIndex<K, V>,
    T: PageReadTrx,
{
    let fragments = load_fragments(versioning, index, page_key, previous_revision, revs_to_restore)?;
    versioning.combine_for_read(fragments, revs_to_restore, trx)
}

/// Same load path, folded into the `(complete, modified)` pair a writer
/// transaction needs before it lands its own changes.
pub fn prepare_modification<K, V, I, T>(
    versioning: Versioning,
    index: &I,
    page_key: u64,
    previous_revision: u64,
    revs_to_restore: u32,
    trx: &T,
    back_ref: Option<PageReference>,
) -> Result<RecordPageContainer<K, V>>
where
    K: Ord + Clone,
    V: Clone,
    I: RevisionIndex<K, V>,
    T: PageReadTrx,
{
    let fragments = load_fragments(versioning, index, page_key, previous_revision, revs_to_restore)?;
    versioning.combine_for_modify(fragments, revs_to_restore, trx, back_ref)
}

fn load_fragments<K, V, I>(
    versioning: Versioning,
    index: &I,
    page_key: u64,
    previous_revision: u64,
    revs_to_restore: u32,
) -> Result<Vec<KeyValuePage<K, V>>>
where
    K: Ord,
    I: RevisionIndex<K, V>,
{
    let mut fragments = Vec::new();
    for revision in versioning.fetch_plan(previous_revision, revs_to_restore) {
        if let Some(fragment) = index.fragment(page_key, revision)? {
            fragments.push(fragment);
        }
    }
    Ok(fragments)
}
