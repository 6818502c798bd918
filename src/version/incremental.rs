//! Incremental versioning: a chain of per-revision deltas.
//!
//! Each commit writes only the keys it changed. Once the delta chain spans
//! the whole window (`fragments.len() == w`) the commit writes a full
//! redundant dump instead, which bounds every future reconstruction to at
//! most `w` fragments.

use anyhow::Result;

use crate::page::{KeyValuePage, PageReference, RecordPageContainer};
use crate::trx::PageReadTrx;

use super::{first_fragment, fold_fragment};

pub(super) fn fetch_plan(previous_revision: u64, revs_to_restore: u32) -> Vec<u64> {
    let window = u64::from(revs_to_restore);
    let lowest = previous_revision.saturating_sub(window - 1);
    (lowest..=previous_revision).rev().collect()
}

pub(super) fn combine_for_read<K, V>(
    fragments: Vec<KeyValuePage<K, V>>,
    _revs_to_restore: u32,
    trx: &impl PageReadTrx,
) -> Result<KeyValuePage<K, V>>
where
    K: Ord + Clone,
    V: Clone,
{
    let first = first_fragment(&fragments)?;

    let mut page = first.new_instance(first.previous(), trx);
    for fragment in &fragments {
        if page.is_full() {
            break;
        }
        fold_fragment(&mut page, fragment);
    }
    page.set_dirty(fragments.len() > 1);
    Ok(page)
}

pub(super) fn combine_for_modify<K, V>(
    fragments: Vec<KeyValuePage<K, V>>,
    revs_to_restore: u32,
    trx: &impl PageReadTrx,
    back_ref: Option<PageReference>,
) -> Result<RecordPageContainer<K, V>>
where
    K: Ord + Clone,
    V: Clone,
{
    let first = first_fragment(&fragments)?;

    // The chain spans the whole window: write a full dump so readers past
    // this revision never have to look further back.
    let is_full_dump = fragments.len() == revs_to_restore as usize;

    let mut complete = first.new_instance(back_ref, trx);
    let mut modified = first.new_instance(back_ref, trx);

    for fragment in &fragments {
        if complete.is_full() {
            break;
        }
        for (key, value) in fragment.records() {
            if complete.is_full() {
                break;
            }
            if complete.put_record_if_absent(key.clone(), value.clone()) && is_full_dump {
                modified.put_record_if_absent(key.clone(), value.clone());
            }
        }
        for (key, reference) in fragment.references() {
            if complete.is_full() {
                break;
            }
            if complete.put_reference_if_absent(key.clone(), *reference) && is_full_dump {
                modified.put_reference_if_absent(key.clone(), *reference);
            }
        }
    }

    complete.set_dirty(fragments.len() > 1);
    Ok(RecordPageContainer::new(complete, modified))
}
