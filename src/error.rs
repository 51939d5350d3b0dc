use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the topic model and the ranker
///
/// Degenerate normalization (a zero column total) and query terms missing from the
/// vocabulary are resolved in place and never reach this type.
#[derive(Error, Debug)]
pub enum PlsaError {
    /// Declared dimensions do not match the supplied arrays
    #[error("shape mismatch for {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("empty input: {0}")]
    EmptyCorpus(&'static str),

    #[error("{}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("model snapshot: {0}")]
    Snapshot(#[from] serde_cbor::Error),
}

pub type Result<T> = std::result::Result<T, PlsaError>;

impl PlsaError {
    pub(crate) fn shape(what: &'static str, expected: usize, found: usize) -> Self {
        PlsaError::ShapeMismatch { what, expected, found }
    }
}

/// fail fast when a declared dimension differs from the actual one
#[inline]
pub(crate) fn ensure_dim(what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(PlsaError::shape(what, expected, found));
    }
    Ok(())
}
