//! Differential versioning: deltas anchored to the last full dump.
//!
//! Every `w`-th revision writes the whole page (a full dump); the revisions
//! in between write only their changed keys, accumulated since the dump. A
//! reader therefore needs at most two fragments: the latest delta and the
//! dump it leans on.

use anyhow::Result;

use crate::errors::StoreError;
use crate::page::{KeyValuePage, PageReference, RecordPageContainer};
use crate::trx::PageReadTrx;

use super::{first_fragment, fold_fragment};

pub(super) fn fetch_plan(previous_revision: u64, revs_to_restore: u32) -> Vec<u64> {
    let window = u64::from(revs_to_restore);
    let last_full = previous_revision - previous_revision % window;
    if last_full == previous_revision {
        vec![last_full]
    } else {
        vec![previous_revision, last_full]
    }
}

pub(super) fn combine_for_read<K, V>(
    fragments: Vec<KeyValuePage<K, V>>,
    trx: &impl PageReadTrx,
) -> Result<KeyValuePage<K, V>>
where
    K: Ord + Clone,
    V: Clone,
{
    ensure_fragment_count(&fragments)?;
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
    ensure_fragment_count(&fragments)?;
    let first = first_fragment(&fragments)?;

    let window = u64::from(revs_to_restore);
    // trx carries the revision this commit will create; a dump revision
    // resets the delta chain.
    let is_full_dump = trx.revision() % window == 0;

    let mut complete = first.new_instance(back_ref, trx);
    let mut modified = first.new_instance(back_ref, trx);

    // The latest delta seeds both pages: intermediate deltas carry every
    // change since the dump, so the next delta starts from the current one.
    fold_fragment(&mut complete, first);
    fold_fragment(&mut modified, first);

    if let Some(dump) = fragments.get(1) {
        fold_fragment(&mut complete, dump);
        if is_full_dump {
            fold_fragment(&mut modified, dump);
        }
    }

    complete.set_dirty(fragments.len() > 1);
    Ok(RecordPageContainer::new(complete, modified))
}

fn ensure_fragment_count<K: Ord, V>(fragments: &[KeyValuePage<K, V>]) -> Result<()> {
    if fragments.is_empty() || fragments.len() > 2 {
        return Err(StoreError::InvariantViolation(format!(
            "differential versioning expects one or two fragments, got {}",
            fragments.len()
        ))
        .into());
    }
    Ok(())
}
