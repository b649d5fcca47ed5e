//! Key-set materialization: reduce the keys dataset to one deduplicated set.
//!
//! The reduction is a parallel fold/reduce over mergeable accumulators.
//! Because `merge` is a true set union — idempotent, commutative,
//! associative — partial accumulators built on arbitrary rayon splits
//! combine to the same set regardless of split count or order.

use std::hash::Hash;
use std::path::Path;

use log::info;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::dataset;
use crate::error::Result;

/// Mergeable partial set: empty / add one / merge two / extract.
#[derive(Debug, Default)]
pub struct KeySetAccumulator<T> {
    values: FxHashSet<T>,
}

impl<T: Eq + Hash> KeySetAccumulator<T> {
    pub fn new() -> Self {
        Self {
            values: FxHashSet::default(),
        }
    }

    pub fn add(&mut self, value: T) {
        self.values.insert(value);
    }

    /// Set union. Walks the smaller side.
    pub fn merge(&mut self, mut other: Self) {
        if self.values.len() < other.values.len() {
            std::mem::swap(&mut self.values, &mut other.values);
        }
        self.values.extend(other.values);
    }

    pub fn into_set(self) -> FxHashSet<T> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Materializes the integer key set from a keys location. Empty input yields
/// the empty set; any non-integer line aborts the run.
pub fn materialize_integers(pattern: &str) -> Result<FxHashSet<i64>> {
    let mut acc = KeySetAccumulator::new();
    for path in dataset::expand(pattern)? {
        let lines = dataset::read_file_lines(&path)?;
        acc.merge(fold_integers(&lines, &path)?);
    }
    info!("materialized key set of {} distinct values", acc.len());
    Ok(acc.into_set())
}

fn fold_integers(lines: &[String], path: &Path) -> Result<KeySetAccumulator<i64>> {
    lines
        .par_iter()
        .map(|line| dataset::parse_value(line, path))
        .try_fold(KeySetAccumulator::new, |mut acc, value| {
            acc.add(value?);
            Ok(acc)
        })
        .try_reduce(KeySetAccumulator::new, |mut left, right| {
            left.merge(right);
            Ok(left)
        })
}

/// Same reduction over opaque line values, for the multi-file grouper.
pub fn materialize_lines(lines: Vec<String>) -> FxHashSet<String> {
    lines
        .into_par_iter()
        .fold(KeySetAccumulator::new, |mut acc, line| {
            acc.add(line);
            acc
        })
        .reduce(KeySetAccumulator::new, |mut left, right| {
            left.merge(right);
            left
        })
        .into_set()
}
