/*
 *  File: cache.rs
 *  Author: Prasanna Paithankar (21CS30065)
 *  Date: 19/10/2026
 *
 *  Course: Hardware Security (CS60004) Spring 2025
 *  full-key-cpa: full AES-128 key recovery by correlation power analysis
 *
 *  Refer to the README.md for other details.
 */

//! On-disk memoization of correlation matrices, one `.npy` file per byte position.

use std::fs;
use std::path::PathBuf;

use log::debug;
use ndarray::Array2;
use ndarray_npy::{read_npy, write_npy};

use crate::attack::NUM_HYPOTHESES;
use crate::error::{CpaError, Result};

/// Whether a byte attack may read a persisted matrix and/or persist a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub reuse_if_present: bool,
    pub write_on_compute: bool,
}

impl CachePolicy {
    pub const fn disabled() -> Self {
        Self {
            reuse_if_present: false,
            write_on_compute: false,
        }
    }

    pub const fn read_write() -> Self {
        Self {
            reuse_if_present: true,
            write_on_compute: true,
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            reuse_if_present: true,
            write_on_compute: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatrixCache {
    dir: PathBuf,
}

impl MatrixCache {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, position: usize) -> PathBuf {
        self.dir.join(format!("matrix_{position}.npy"))
    }

    pub fn contains(&self, position: usize) -> bool {
        self.path_for(position).is_file()
    }

    /// Reads the matrix for `position`; `Ok(None)` when no entry exists.
    /// An entry that does not parse as a `256 x num_samples` matrix is a
    /// [`CpaError::CacheCorruption`].
    pub fn load(&self, position: usize, num_samples: usize) -> Result<Option<Array2<f64>>> {
        let path = self.path_for(position);
        if !path.is_file() {
            return Ok(None);
        }

        let matrix: Array2<f64> = read_npy(&path).map_err(|e| CpaError::CacheCorruption {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let expected = (NUM_HYPOTHESES, num_samples);
        if matrix.dim() != expected {
            return Err(CpaError::CacheCorruption {
                path,
                reason: format!("shape {:?}, expected {:?}", matrix.dim(), expected),
            });
        }
        if matrix.iter().any(|c| !c.is_finite()) {
            return Err(CpaError::CacheCorruption {
                path,
                reason: "non-finite correlation".into(),
            });
        }

        debug!("loaded {}", path.display());
        Ok(Some(matrix))
    }

    pub fn store(&self, position: usize, matrix: &Array2<f64>) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(position);
        write_npy(&path, matrix)?;
        debug!("stored {}", path.display());
        Ok(path)
    }
}
