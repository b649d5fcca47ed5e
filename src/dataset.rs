//! Dataset locations, line readers, and result materialization.
//!
//! A location is a path or a glob; a literal path is its own match. Matches
//! are sorted so multi-file reads are deterministic. The filtered artifact is
//! always a single unsharded text file at `<path>.filtered`; the optional
//! replace step renames that artifact over the original in one step, so the
//! original path holds either the old content or the new content at any
//! point, never nothing.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};

use log::info;
use rayon::prelude::*;

use crate::error::{FilterError, Result};

/// Suffix of the filtered artifact next to the original data file.
pub const FILTERED_SUFFIX: &str = ".filtered";

pub(crate) fn io_err(op: &'static str, path: &Path, source: std::io::Error) -> FilterError {
    FilterError::Io {
        op,
        path: path.to_path_buf(),
        source,
    }
}

pub(crate) fn parse_value(line: &str, path: &Path) -> Result<i64> {
    line.trim().parse().map_err(|_| FilterError::Parse {
        line: line.to_string(),
        path: path.to_path_buf(),
    })
}

/// Expands a dataset location into the sorted list of matching files.
/// Zero matches is fatal: a missing dataset is a configuration mistake, not
/// an empty input.
pub fn expand(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = glob::glob(pattern).map_err(|source| FilterError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            io_err("match", &path, e.into_error())
        })?;
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    if paths.is_empty() {
        return Err(FilterError::NoMatch {
            pattern: pattern.to_string(),
        });
    }
    Ok(paths)
}

pub(crate) fn read_file_lines(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| io_err("open", path, e))?;
    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        lines.push(line.map_err(|e| io_err("read", path, e))?);
    }
    Ok(lines)
}

/// Reads and parses one file, parsing lines in parallel.
pub(crate) fn read_file_values(path: &Path) -> Result<Vec<i64>> {
    let lines = read_file_lines(path)?;
    lines
        .par_iter()
        .map(|line| parse_value(line, path))
        .collect()
}

/// Reads every line of every file matching the location, in match order.
pub fn read_lines(pattern: &str) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for path in expand(pattern)? {
        lines.extend(read_file_lines(&path)?);
    }
    Ok(lines)
}

/// Streams parsed values file by file, line by line, without holding any
/// dataset in memory. Feeds the shuffle strategy's spill pass.
pub fn stream_values(pattern: &str) -> Result<ValueStream> {
    Ok(ValueStream {
        files: expand(pattern)?.into_iter(),
        current: None,
    })
}

pub struct ValueStream {
    files: std::vec::IntoIter<PathBuf>,
    current: Option<(PathBuf, Lines<BufReader<File>>)>,
}

impl Iterator for ValueStream {
    type Item = Result<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((path, lines)) = self.current.as_mut() {
                match lines.next() {
                    Some(Ok(line)) => return Some(parse_value(&line, path)),
                    Some(Err(e)) => {
                        let err = io_err("read", path, e);
                        self.current = None;
                        return Some(Err(err));
                    }
                    None => self.current = None,
                }
            } else {
                let path = self.files.next()?;
                match File::open(&path) {
                    Ok(file) => self.current = Some((path, BufReader::new(file).lines())),
                    Err(e) => return Some(Err(io_err("open", &path, e))),
                }
            }
        }
    }
}

pub(crate) fn write_lines<S: AsRef<str>>(lines: &[S], path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| io_err("create", path, e))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{}", line.as_ref()).map_err(|e| io_err("write", path, e))?;
    }
    writer.flush().map_err(|e| io_err("flush", path, e))
}

/// Writes the filtered records as one unsharded artifact at
/// `<data_path>.filtered` and returns that path.
pub fn write_filtered(values: &[i64], data_path: &str) -> Result<PathBuf> {
    let out_path = PathBuf::from(format!("{data_path}{FILTERED_SUFFIX}"));
    let rendered: Vec<String> = values.iter().map(i64::to_string).collect();
    write_lines(&rendered, &out_path)?;
    info!("wrote {} records to {}", values.len(), out_path.display());
    Ok(out_path)
}

/// Swaps the filtered artifact into place. A single rename: atomic on
/// same-filesystem POSIX renames, and valid only after the filtered write
/// fully succeeded. Failure is fatal with no rollback.
pub fn replace_original(filtered: &Path, original: &str) -> Result<()> {
    fs::rename(filtered, original).map_err(|e| io_err("rename", filtered, e))?;
    info!("replaced {original} with the filtered result");
    Ok(())
}
