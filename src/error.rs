use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, FilterError>;

/// Errors surfaced by a filtering run. All of them are fatal: the run aborts
/// at the point of detection with no retry or partial-result policy.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("invalid integer line '{line}' in {}", .path.display())]
    Parse { line: String, path: PathBuf },

    #[error("{op} failed for {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid file pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("no files matched '{pattern}'")]
    NoMatch { pattern: String },

    #[error("invalid run configuration: {0}")]
    Config(String),
}
