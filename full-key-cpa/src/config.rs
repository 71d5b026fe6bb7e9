/*
 *  File: config.rs
 *  Author: Prasanna Paithankar (21CS30065)
 *  Date: 19/10/2026
 *
 *  Course: Hardware Security (CS60004) Spring 2025
 *  full-key-cpa: full AES-128 key recovery by correlation power analysis
 *
 *  Refer to the README.md for other details.
 */

use std::path::PathBuf;

use crate::cache::{CachePolicy, MatrixCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    LessThan,
    GreaterThan,
}

/// A strict comparison against a fixed value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub comparison: Comparison,
    pub value: f64,
}

impl Threshold {
    pub const fn new(comparison: Comparison, value: f64) -> Self {
        Self { comparison, value }
    }

    pub fn holds(&self, x: f64) -> bool {
        match self.comparison {
            Comparison::LessThan => x < self.value,
            Comparison::GreaterThan => x > self.value,
        }
    }
}

/// Everything a full-key run needs besides the dataset. Cloned into each
/// per-byte task.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub cache_dir: PathBuf,
    pub cache_policy: CachePolicy,
    /// Worker pool size; `None` uses every available execution unit.
    pub workers: Option<usize>,
    /// Peak |r| a byte result must satisfy before it is trusted.
    pub confidence: Threshold,
}

impl RunConfig {
    pub fn cache(&self) -> MatrixCache {
        MatrixCache::new(self.cache_dir.clone())
    }

    pub fn worker_count(&self) -> usize {
        self.workers
            .filter(|&w| w > 0)
            .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(1)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("matrices"),
            cache_policy: CachePolicy::default(),
            workers: None,
            confidence: Threshold::new(Comparison::GreaterThan, 0.0),
        }
    }
}
