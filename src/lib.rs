//! Out-of-core set-difference filtering of line-delimited integer datasets.
//!
//! Removes from a data dataset every value that also appears in a keys
//! dataset, then optionally swaps the filtered result back over the original
//! file. Two strategies are available behind one interface: a broadcast join
//! (key set materialized once, shared read-only by parallel workers) and a
//! hash-partitioned set difference that never holds either dataset fully in
//! memory. A multi-file grouper generalizes the filter to whole directories
//! of data files.
//!
//! ```no_run
//! use keyfilter::{run, Mode, RunConfig};
//!
//! let mut config = RunConfig::new("keys.txt", "data.txt");
//! config.replace = true;
//! config.mode = Mode::Broadcast;
//! run(&config).unwrap();
//! ```

pub mod broadcast;
pub mod config;
pub mod dataset;
pub mod error;
pub mod grouper;
pub mod keyset;
pub mod shuffle;

pub use config::{Mode, RunConfig};
pub use error::{FilterError, Result};

use log::info;

/// Runs one filtering pipeline: validate, filter with the configured
/// strategy, write the single `.filtered` artifact, and swap it over the
/// original when requested. The swap happens only after the write has fully
/// succeeded; any earlier failure leaves the original untouched.
pub fn run(config: &RunConfig) -> Result<()> {
    config.validate()?;

    let filtered = config.mode.filter(config)?;
    info!("{} records survived filtering", filtered.len());

    let artifact = dataset::write_filtered(&filtered, &config.data_path)?;
    if config.replace {
        dataset::replace_original(&artifact, &config.data_path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::{Path, PathBuf};

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    fn sorted_values(content: &str) -> Vec<i64> {
        let mut values: Vec<i64> = content.lines().map(|l| l.parse().unwrap()).collect();
        values.sort_unstable();
        values
    }

    fn replace_run(keys: &Path, data: &Path, mode: Mode) {
        let mut config = RunConfig::new(keys.to_str().unwrap(), data.to_str().unwrap());
        config.replace = true;
        config.mode = mode;
        run(&config).unwrap();
    }

    #[test]
    fn broadcast_run_replaces_the_original_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let keys = write_file(dir.path(), "keys.txt", "2\n4\n6\n");
        let data = write_file(dir.path(), "data.txt", "1\n2\n3\n4\n5\n6\n7\n");

        replace_run(&keys, &data, Mode::Broadcast);

        assert_eq!(sorted_values(&fs::read_to_string(&data).unwrap()), vec![1, 3, 5, 7]);
        assert!(!dir.path().join("data.txt.filtered").exists());
    }

    #[test]
    fn set_difference_run_matches_broadcast() {
        let dir = tempfile::tempdir().unwrap();
        let keys = write_file(dir.path(), "keys.txt", "2\n4\n6\n");
        let data = write_file(dir.path(), "data.txt", "1\n2\n3\n4\n5\n6\n7\n");

        replace_run(&keys, &data, Mode::SetDifference);

        assert_eq!(sorted_values(&fs::read_to_string(&data).unwrap()), vec![1, 3, 5, 7]);
        assert!(!dir.path().join("data.txt.filtered").exists());
    }

    #[test]
    fn filtering_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let keys = write_file(dir.path(), "keys.txt", "2\n4\n");
        let data = write_file(dir.path(), "data.txt", "1\n2\n3\n4\n5\n");

        replace_run(&keys, &data, Mode::Broadcast);
        let first = fs::read_to_string(&data).unwrap();

        replace_run(&keys, &data, Mode::Broadcast);
        let second = fs::read_to_string(&data).unwrap();

        assert_eq!(sorted_values(&first), sorted_values(&second));
    }

    #[test]
    fn without_replace_the_original_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let keys = write_file(dir.path(), "keys.txt", "2\n");
        let data = write_file(dir.path(), "data.txt", "1\n2\n3\n");

        let config = RunConfig::new(keys.to_str().unwrap(), data.to_str().unwrap());
        run(&config).unwrap();

        assert_eq!(fs::read_to_string(&data).unwrap(), "1\n2\n3\n");
        let artifact = dir.path().join("data.txt.filtered");
        assert_eq!(sorted_values(&fs::read_to_string(artifact).unwrap()), vec![1, 3]);
    }

    #[test]
    fn glob_data_location_filters_all_matches_into_one_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let keys = write_file(dir.path(), "keys.txt", "2\n");
        write_file(dir.path(), "data-a.txt", "1\n2\n");
        write_file(dir.path(), "data-b.txt", "2\n3\n");

        let pattern = dir.path().join("data-*.txt");
        let config = RunConfig::new(keys.to_str().unwrap(), pattern.to_str().unwrap());
        run(&config).unwrap();

        let artifact = dir.path().join("data-*.txt.filtered");
        assert_eq!(sorted_values(&fs::read_to_string(artifact).unwrap()), vec![1, 3]);
    }

    #[test]
    fn invalid_configuration_fails_before_any_io() {
        let err = run(&RunConfig::new("", "")).unwrap_err();
        assert!(matches!(err, FilterError::Config(_)));
    }

    #[test]
    fn parse_error_aborts_without_touching_the_original() {
        let dir = tempfile::tempdir().unwrap();
        let keys = write_file(dir.path(), "keys.txt", "1\nbad\n");
        let data = write_file(dir.path(), "data.txt", "1\n2\n");

        let mut config = RunConfig::new(keys.to_str().unwrap(), data.to_str().unwrap());
        config.replace = true;
        let err = run(&config).unwrap_err();

        assert!(matches!(err, FilterError::Parse { .. }));
        assert_eq!(fs::read_to_string(&data).unwrap(), "1\n2\n");
        assert!(!dir.path().join("data.txt.filtered").exists());
    }
}
