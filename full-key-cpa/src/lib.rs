/*
 *  File: lib.rs
 *  Author: Prasanna Paithankar (21CS30065)
 *  Date: 19/10/2026
 *
 *  Course: Hardware Security (CS60004) Spring 2025
 *  full-key-cpa: full AES-128 key recovery by correlation power analysis
 *
 *  Refer to the README.md for other details.
 */

//! Correlation power analysis recovering a full AES-128 key from
//! plaintext/trace pairs, one byte position per worker.

pub mod attack;
pub mod batch;
pub mod cache;
pub mod config;
pub mod correlation;
pub mod error;
pub mod leakage;
pub mod traces;

pub use attack::{ByteAttacker, ByteResult, MatrixSource, Peak, NUM_HYPOTHESES};
pub use batch::{
    assemble_key, attack_byte_with_retry, attack_full_key, collect_outcomes, KeyCandidate,
};
pub use cache::{CachePolicy, MatrixCache};
pub use config::{Comparison, RunConfig, Threshold};
pub use error::{CpaError, Result};
pub use traces::{CsvLayout, TraceDataset, DEFAULT_MAX_DATAPOINTS};
