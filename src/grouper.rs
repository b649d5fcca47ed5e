//! Multi-file generalization: group lines across many data files by value,
//! find which files contain keyed values, and rewrite exactly those files.
//!
//! The rewrite is a two-phase commit. Phase 1 writes a `<file>.filtered`
//! artifact for every obligated file; any failure here aborts with every
//! original untouched. Phase 2 (only when replacing) renames each artifact
//! over its original, one file at a time; a rename failure stops the run at
//! that file, leaving a committed prefix and an untouched suffix — never a
//! half-written file. Files containing no keys are never rewritten.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::dataset::{self, FILTERED_SUFFIX};
use crate::error::Result;
use crate::keyset;

/// Distinct line value -> files containing it.
pub type LineGroups = BTreeMap<String, BTreeSet<PathBuf>>;

/// Obligated file -> the line values it must shed.
pub type RewritePlan = BTreeMap<PathBuf, FxHashSet<String>>;

/// Groups every (line, source file) pair across the matched files by line
/// value. Per-file maps are built in parallel and merged by union.
pub fn group_lines(pattern: &str) -> Result<LineGroups> {
    let paths = dataset::expand(pattern)?;
    paths
        .par_iter()
        .map(|path| {
            let mut local = LineGroups::new();
            for line in dataset::read_file_lines(path)? {
                local.entry(line).or_default().insert(path.clone());
            }
            Ok(local)
        })
        .try_reduce(LineGroups::new, |mut left, right| {
            for (value, files) in right {
                left.entry(value).or_default().extend(files);
            }
            Ok(left)
        })
}

/// Restricts the groups to keyed values and inverts them into per-file
/// rewrite obligations.
pub fn rewrite_plan(groups: &LineGroups, keys: &FxHashSet<String>) -> RewritePlan {
    let mut plan = RewritePlan::new();
    for (value, files) in groups {
        if keys.contains(value) {
            for file in files {
                plan.entry(file.clone()).or_default().insert(value.clone());
            }
        }
    }
    plan
}

/// Filters every file matching `files_pattern` against one keys dataset and
/// returns the rewritten paths (the originals when `replace` is set, the
/// `.filtered` artifacts otherwise).
pub fn filter_many(keys_pattern: &str, files_pattern: &str, replace: bool) -> Result<Vec<PathBuf>> {
    let keys = keyset::materialize_lines(dataset::read_lines(keys_pattern)?);
    let groups = group_lines(files_pattern)?;
    let plan = rewrite_plan(&groups, &keys);
    info!(
        "{} of {} distinct values are keys; {} files need rewriting",
        groups.keys().filter(|value| keys.contains(*value)).count(),
        groups.len(),
        plan.len()
    );

    // Phase 1: write every artifact before touching any original.
    let artifacts: Vec<(PathBuf, PathBuf)> = plan
        .par_iter()
        .map(|(path, offending)| {
            let kept: Vec<String> = dataset::read_file_lines(path)?
                .into_iter()
                .filter(|line| !offending.contains(line))
                .collect();
            let artifact = filtered_path(path);
            dataset::write_lines(&kept, &artifact)?;
            Ok((path.clone(), artifact))
        })
        .collect::<Result<_>>()?;

    // Phase 2: commit, one rename at a time.
    let mut rewritten = Vec::with_capacity(artifacts.len());
    for (original, artifact) in artifacts {
        if replace {
            fs::rename(&artifact, &original)
                .map_err(|e| dataset::io_err("rename", &artifact, e))?;
            rewritten.push(original);
        } else {
            rewritten.push(artifact);
        }
    }
    Ok(rewritten)
}

fn filtered_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(FILTERED_SUFFIX);
    PathBuf::from(name)
}
