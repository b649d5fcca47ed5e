//! Run configuration. Option parsing lives outside the core; collaborators
//! hand over two validated dataset locations, the replace flag, and the
//! strategy selector.

use crate::error::{FilterError, Result};
use crate::{broadcast, dataset, keyset, shuffle};

/// Filtering strategy. Both variants produce identical multisets for any
/// finite inputs; they differ only in memory and I/O trade-offs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Materialize the key set once and share it read-only with every
    /// parallel filter worker. Fast, but the key set must fit in memory.
    #[default]
    Broadcast,
    /// Co-partition both datasets by value into on-disk buckets and discard
    /// matches per bucket. Scales past memory at the cost of a shuffle.
    SetDifference,
}

impl Mode {
    /// Produces the filtered records for the selected strategy. Callers are
    /// strategy-agnostic.
    pub fn filter(self, config: &RunConfig) -> Result<Vec<i64>> {
        match self {
            Mode::Broadcast => {
                let keys = keyset::materialize_integers(&config.keys_path)?;
                let mut kept = Vec::new();
                for path in dataset::expand(&config.data_path)? {
                    let values = dataset::read_file_values(&path)?;
                    kept.extend(broadcast::filter(&values, &keys));
                }
                Ok(kept)
            }
            Mode::SetDifference => shuffle::filter(&config.data_path, &config.keys_path),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Keys dataset location (file or glob).
    pub keys_path: String,
    /// Data dataset location; also the eventual swap target.
    pub data_path: String,
    /// Replace the data file with the filtered result after the run.
    pub replace: bool,
    pub mode: Mode,
}

impl RunConfig {
    pub fn new(keys_path: impl Into<String>, data_path: impl Into<String>) -> Self {
        Self {
            keys_path: keys_path.into(),
            data_path: data_path.into(),
            replace: false,
            mode: Mode::default(),
        }
    }

    /// Rejects unusable configurations before any computation starts.
    pub fn validate(&self) -> Result<()> {
        if self.keys_path.is_empty() {
            return Err(FilterError::Config("keys location is required".into()));
        }
        if self.data_path.is_empty() {
            return Err(FilterError::Config("data location is required".into()));
        }
        if self.replace && self.data_path.contains(&['*', '?', '['][..]) {
            return Err(FilterError::Config(
                "replace-in-place requires a literal data file, not a glob".into(),
            ));
        }
        Ok(())
    }
}
