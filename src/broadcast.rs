//! Broadcast-join filter: a stateless membership predicate over a key set
//! shared read-only by every parallel worker.
//!
//! Precondition (documented, not enforced): the key set fits in one worker's
//! memory. Duplicates in the data pass through one-for-one; output order is
//! unconstrained.

use log::debug;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

pub fn filter(data: &[i64], keys: &FxHashSet<i64>) -> Vec<i64> {
    let kept: Vec<i64> = data
        .par_iter()
        .copied()
        .filter(|value| !keys.contains(value))
        .collect();
    debug!("broadcast filter kept {} of {} records", kept.len(), data.len());
    kept
}
