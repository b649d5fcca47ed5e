//! Distributed set-difference filter.
//!
//! Neither dataset is held fully in memory. Both sides are streamed once and
//! spilled into hash buckets on disk, so equal values land in the same bucket
//! index on both sides. Each bucket pair is then resolved independently and
//! in parallel: only that bucket's keys are loaded as a set, and that
//! bucket's data records are kept when absent from it. Memory per worker is
//! bounded by the largest single bucket's distinct keys, not by either
//! dataset.
//!
//! Semantics match the broadcast filter exactly: every copy of a keyed value
//! is dropped, every copy of the rest survives.

use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;
use rayon::prelude::*;
use rustc_hash::{FxHashSet, FxHasher};
use tempfile::TempDir;

use crate::dataset::{self, io_err};
use crate::error::Result;

/// Spill buckets per side.
const NUM_BUCKETS: usize = 16;

pub fn filter(data_pattern: &str, keys_pattern: &str) -> Result<Vec<i64>> {
    filter_with_buckets(data_pattern, keys_pattern, NUM_BUCKETS)
}

pub(crate) fn filter_with_buckets(
    data_pattern: &str,
    keys_pattern: &str,
    buckets: usize,
) -> Result<Vec<i64>> {
    let spill_dir =
        TempDir::new().map_err(|e| io_err("create spill dir", &std::env::temp_dir(), e))?;

    let data_buckets = spill(
        dataset::stream_values(data_pattern)?,
        spill_dir.path(),
        "data",
        buckets,
    )?;
    let key_buckets = spill(
        dataset::stream_values(keys_pattern)?,
        spill_dir.path(),
        "keys",
        buckets,
    )?;

    (0..buckets)
        .into_par_iter()
        .map(|index| resolve_bucket(&data_buckets[index], &key_buckets[index]))
        .try_reduce(Vec::new, |mut all, mut part| {
            all.append(&mut part);
            Ok(all)
        })
}

/// FxHasher with its default (fixed) seed, so both sides agree on bucket
/// placement within a run.
fn bucket_index(value: i64, buckets: usize) -> usize {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish() as usize % buckets
}

fn spill<I>(values: I, dir: &Path, side: &str, buckets: usize) -> Result<Vec<PathBuf>>
where
    I: Iterator<Item = Result<i64>>,
{
    let paths: Vec<PathBuf> = (0..buckets)
        .map(|index| dir.join(format!("{side}-{index:02}")))
        .collect();
    let mut writers = Vec::with_capacity(buckets);
    for path in &paths {
        let file = File::create(path).map_err(|e| io_err("create", path, e))?;
        writers.push(BufWriter::new(file));
    }

    let mut spilled = 0u64;
    for value in values {
        let value = value?;
        let index = bucket_index(value, buckets);
        writeln!(writers[index], "{value}").map_err(|e| io_err("write", &paths[index], e))?;
        spilled += 1;
    }
    for (writer, path) in writers.iter_mut().zip(&paths) {
        writer.flush().map_err(|e| io_err("flush", path, e))?;
    }

    debug!("spilled {spilled} {side} records into {buckets} buckets");
    Ok(paths)
}

fn resolve_bucket(data_path: &Path, keys_path: &Path) -> Result<Vec<i64>> {
    let mut keys = FxHashSet::default();
    for value in bucket_reader(keys_path)? {
        keys.insert(value?);
    }

    let mut kept = Vec::new();
    for value in bucket_reader(data_path)? {
        let value = value?;
        if !keys.contains(&value) {
            kept.push(value);
        }
    }
    Ok(kept)
}

fn bucket_reader(path: &Path) -> Result<impl Iterator<Item = Result<i64>>> {
    let file = File::open(path).map_err(|e| io_err("open", path, e))?;
    let path = path.to_path_buf();
    Ok(BufReader::new(file).lines().map(move |line| {
        let line = line.map_err(|e| io_err("read", &path, e))?;
        dataset::parse_value(&line, &path)
    }))
}
