//! Full versioning: every commit serializes the entire page.
//!
//! Zero read amplification (one fragment per read), maximal write
//! amplification. No dependence on prior fragments, so the fetch plan is a
//! single revision and the fold is the identity.

use anyhow::Result;

use crate::errors::StoreError;
use crate::page::{KeyValuePage, PageReference, RecordPageContainer};
use crate::trx::PageReadTrx;

use super::{first_fragment, fold_fragment};

pub(super) fn fetch_plan(previous_revision: u64) -> Vec<u64> {
    vec![previous_revision]
}

pub(super) fn combine_for_read<K, V>(
    mut fragments: Vec<KeyValuePage<K, V>>,
) -> Result<KeyValuePage<K, V>>
where
    K: Ord,
{
    if fragments.len() != 1 {
        return Err(StoreError::InvariantViolation(format!(
            "full versioning expects exactly one fragment, got {}",
            fragments.len()
        ))
        .into());
    }
    Ok(fragments.remove(0))
}

pub(super) fn combine_for_modify<K, V>(
    fragments: Vec<KeyValuePage<K, V>>,
    trx: &impl PageReadTrx,
    back_ref: Option<PageReference>,
) -> Result<RecordPageContainer<K, V>>
where
    K: Ord + Clone,
    V: Clone,
{
    if fragments.len() != 1 {
        return Err(StoreError::InvariantViolation(format!(
            "full versioning expects exactly one fragment, got {}",
            fragments.len()
        ))
        .into());
    }
    let fragment = first_fragment(&fragments)?;

    // Every commit rewrites the page, so the complete view and the page to
    // serialize start out identical.
    let mut complete = fragment.new_instance(back_ref, trx);
    let mut modified = fragment.new_instance(back_ref, trx);
    fold_fragment(&mut complete, fragment);
    fold_fragment(&mut modified, fragment);

    Ok(RecordPageContainer::new(complete, modified))
}
