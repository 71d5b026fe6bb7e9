/*
 *  File: batch.rs
 *  Author: Prasanna Paithankar (21CS30065)
 *  Date: 19/10/2026
 *
 *  Course: Hardware Security (CS60004) Spring 2025
 *  full-key-cpa: full AES-128 key recovery by correlation power analysis
 *
 *  Refer to the README.md for other details.
 */

//! Full-key recovery: one byte attack per position on a bounded worker pool.

use std::fmt;
use std::time::Instant;

use log::{debug, error, info, warn};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use rayon::ThreadPoolBuilder;

use crate::attack::{ByteAttacker, ByteResult};
use crate::cache::CachePolicy;
use crate::config::{RunConfig, Threshold};
use crate::error::{CpaError, Result};
use crate::traces::TraceDataset;

/// Recovered key. Byte `i` is the hypothesis that won at byte position `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCandidate {
    results: Vec<ByteResult>,
}

impl KeyCandidate {
    pub fn bytes(&self) -> Vec<u8> {
        self.results.iter().map(|r| r.hypothesis).collect()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes())
    }

    /// Per-position results, ascending by position.
    pub fn results(&self) -> &[ByteResult] {
        &self.results
    }

    pub fn inconclusive_positions(&self) -> Vec<usize> {
        self.results
            .iter()
            .filter(|r| r.is_inconclusive())
            .map(|r| r.position)
            .collect()
    }

    /// Positions whose peak |r| does not satisfy `confidence`.
    pub fn weak_positions(&self, confidence: &Threshold) -> Vec<usize> {
        self.results
            .iter()
            .filter(|r| !r.peak.is_some_and(|p| confidence.holds(p.correlation)))
            .map(|r| r.position)
            .collect()
    }
}

impl fmt::Display for KeyCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Orders results by byte position and checks that each of `0..key_length`
/// appears exactly once. Results may arrive in any order.
pub fn assemble_key(mut results: Vec<ByteResult>, key_length: usize) -> Result<KeyCandidate> {
    results.sort_by_key(|r| r.position);

    if results.len() != key_length {
        return Err(CpaError::KeyAssembly(format!(
            "{} byte results for a {key_length}-byte key",
            results.len()
        )));
    }
    if let Some((expected, r)) = results
        .iter()
        .enumerate()
        .find(|(expected, r)| r.position != *expected)
    {
        return Err(CpaError::KeyAssembly(format!(
            "expected byte position {expected}, found {}",
            r.position
        )));
    }

    Ok(KeyCandidate { results })
}

/// Splits per-position outcomes into results and failures. Any failure
/// turns the whole batch into a [`CpaError::Batch`] listing every failed
/// position; otherwise the results are assembled with [`assemble_key`].
pub fn collect_outcomes(
    outcomes: Vec<Result<ByteResult>>,
    key_length: usize,
) -> Result<KeyCandidate> {
    let (results, failures): (Vec<_>, Vec<_>) = outcomes.into_iter().partition(|o| o.is_ok());
    let results: Vec<ByteResult> = results.into_iter().filter_map(|o| o.ok()).collect();
    let mut failures: Vec<CpaError> = failures.into_iter().filter_map(|o| o.err()).collect();

    if !failures.is_empty() {
        for e in &failures {
            error!("{e}");
        }
        failures.sort_by_key(|e| e.position());
        return Err(CpaError::Batch { failures });
    }

    assemble_key(results, key_length)
}

/// Runs one byte attack. A corrupted cache entry earns a single retry with
/// caching disabled; every failure is tagged with its position.
pub fn attack_byte_with_retry(
    attacker: &ByteAttacker<'_>,
    position: usize,
    policy: CachePolicy,
) -> Result<ByteResult> {
    match attacker.attack_byte(position, policy) {
        Err(e) if e.is_cache_corruption() => {
            warn!("[byte {position}] {e}; recomputing without cache");
            attacker.attack_byte(position, CachePolicy::disabled())
        }
        other => other,
    }
    .map_err(|e| e.at_position(position))
}

/// Recovers bytes `0..key_length` of the key in parallel.
///
/// Every task runs to completion; if any position failed, all failures are
/// returned together in [`CpaError::Batch`].
pub fn attack_full_key(
    dataset: &TraceDataset,
    key_length: usize,
    config: &RunConfig,
) -> Result<KeyCandidate> {
    if key_length == 0 || key_length > dataset.key_length() {
        return Err(CpaError::TraceDataset(format!(
            "cannot recover a {key_length}-byte key from {}-byte plaintexts",
            dataset.key_length()
        )));
    }

    let workers = config.worker_count();
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("cpa-worker-{i}"))
        .build()?;
    info!(
        "attacking {key_length} byte positions on {workers} workers ({} traces x {} samples)",
        dataset.num_traces(),
        dataset.num_samples()
    );
    debug!("run configuration {config:?}");

    let attacker = ByteAttacker::new(dataset, config.cache());
    let policy = config.cache_policy;
    let start = Instant::now();

    let outcomes: Vec<Result<ByteResult>> = pool.install(|| {
        (0..key_length)
            .into_par_iter()
            .map(|position| attack_byte_with_retry(&attacker, position, policy))
            .collect()
    });
    info!("all byte positions finished in {:.2?}", start.elapsed());

    let key = collect_outcomes(outcomes, key_length)?;
    for position in key.inconclusive_positions() {
        warn!("byte position {position} is inconclusive, reported as 00");
    }
    for position in key.weak_positions(&config.confidence) {
        warn!(
            "byte position {position} fails the confidence threshold {:?}",
            config.confidence
        );
    }
    debug!(
        "per-position output {:?}",
        key.results()
            .iter()
            .map(|r| (r.position, r.hypothesis))
            .collect::<Vec<_>>()
    );
    Ok(key)
}
