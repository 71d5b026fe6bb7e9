/*
 *  File: error.rs
 *  Author: Prasanna Paithankar (21CS30065)
 *  Date: 19/10/2026
 *
 *  Course: Hardware Security (CS60004) Spring 2025
 *  full-key-cpa: full AES-128 key recovery by correlation power analysis
 *
 *  Refer to the README.md for other details.
 */

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CpaError>;

#[derive(Debug, Error)]
pub enum CpaError {
    /// Empty, ragged or otherwise unusable trace dataset. Never retried.
    #[error("malformed trace dataset: {0}")]
    TraceDataset(String),

    /// Zero-variance input to the correlation engine.
    #[error("degenerate correlation input: {0}")]
    DegenerateInput(&'static str),

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("corrupted correlation cache {}: {reason}", .path.display())]
    CacheCorruption { path: PathBuf, reason: String },

    /// Every correlation cell of the byte position was degenerate.
    #[error("byte position {position}: no correlation signal in any cell")]
    AttackInconclusive { position: usize },

    #[error("byte position {position}: {source}")]
    BytePosition {
        position: usize,
        #[source]
        source: Box<CpaError>,
    },

    #[error("cannot assemble key: {0}")]
    KeyAssembly(String),

    #[error("{}", BatchFailures(.failures))]
    Batch { failures: Vec<CpaError> },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    WriteNpy(#[from] ndarray_npy::WriteNpyError),

    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl CpaError {
    pub fn is_cache_corruption(&self) -> bool {
        match self {
            CpaError::CacheCorruption { .. } => true,
            CpaError::BytePosition { source, .. } => source.is_cache_corruption(),
            _ => false,
        }
    }

    /// Byte position attached to the failure, if any.
    pub fn position(&self) -> Option<usize> {
        match self {
            CpaError::BytePosition { position, .. } | CpaError::AttackInconclusive { position } => {
                Some(*position)
            }
            _ => None,
        }
    }

    pub(crate) fn at_position(self, position: usize) -> Self {
        match self {
            already @ CpaError::BytePosition { .. } => already,
            other => CpaError::BytePosition {
                position,
                source: Box::new(other),
            },
        }
    }
}

struct BatchFailures<'a>(&'a [CpaError]);

impl fmt::Display for BatchFailures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} byte position(s) failed", self.0.len())?;
        for failure in self.0 {
            write!(f, "; {failure}")?;
        }
        Ok(())
    }
}
