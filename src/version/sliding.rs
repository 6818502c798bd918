//! Sliding-snapshot versioning: no periodic dumps, aging keys are rescued.
//!
//! The fetch plan and read fold are the incremental ones. The write side
//! differs: instead of a full dump every `w`-th commit, each commit inspects
//! the fragment about to age out of the window and copies into the current
//! delta exactly those of its keys that no newer in-window fragment still
//! carries. Write amplification stays bounded by the per-commit churn plus
//! that rescued set.

use anyhow::Result;

use crate::page::{KeyValuePage, PageReference, RecordPageContainer};
use crate::trx::PageReadTrx;

use super::first_fragment;

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
    let count = fragments.len();
    let window = revs_to_restore as usize;

    let mut complete = first.new_instance(back_ref, trx);
    let mut modified = first.new_instance(back_ref, trx);
    // The window's view once the oldest fragment has left: everything the
    // newer fragments still carry. Keys of the evicted fragment missing from
    // it would become unreachable, so they go into the delta instead.
    let mut reconstructed = first.new_instance(None, trx);

    for (i, fragment) in fragments.iter().enumerate() {
        if complete.is_full() {
            break;
        }
        let evicting = i + 1 == count && count == window;

        for (key, value) in fragment.records() {
            if complete.is_full() {
                break;
            }
            if evicting {
                if !reconstructed.contains_record(key) {
                    modified.put_record_if_absent(key.clone(), value.clone());
                }
            } else {
                reconstructed.put_record_if_absent(key.clone(), value.clone());
            }
            complete.put_record_if_absent(key.clone(), value.clone());
        }
        for (key, reference) in fragment.references() {
            if complete.is_full() {
                break;
            }
            if evicting {
                if !reconstructed.contains_reference(key) {
                    modified.put_reference_if_absent(key.clone(), *reference);
                }
            } else {
                reconstructed.put_reference_if_absent(key.clone(), *reference);
            }
            complete.put_reference_if_absent(key.clone(), *reference);
        }
    }

    complete.set_dirty(count > 1);
    Ok(RecordPageContainer::new(complete, modified))
}
