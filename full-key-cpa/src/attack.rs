/*
 *  File: attack.rs
 *  Author: Prasanna Paithankar (21CS30065)
 *  Date: 19/10/2026
 *
 *  Course: Hardware Security (CS60004) Spring 2025
 *  full-key-cpa: full AES-128 key recovery by correlation power analysis
 *
 *  Refer to the README.md for other details.
 */

//! CPA on a single key byte.
//!
//! For one byte position the 256 key hypotheses are turned into predicted
//! leakages (one row per hypothesis, one column per trace) and every row is
//! correlated against every time sample of the traces. The hypothesis owning
//! the largest |r| anywhere in the resulting `256 x T` matrix wins.

use log::{debug, info, log_enabled, warn, Level};
use ndarray::{Array2, ArrayView2};
use ndarray_stats::QuantileExt;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::cache::{CachePolicy, MatrixCache};
use crate::correlation::pearson;
use crate::error::{CpaError, Result};
use crate::leakage::predict;
use crate::traces::TraceDataset;

pub const NUM_HYPOTHESES: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixSource {
    Cache,
    Computed,
}

/// Location and strength of the winning correlation cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub correlation: f64,
    pub sample: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ByteResult {
    pub position: usize,
    pub hypothesis: u8,
    /// `None` when no cell carried any correlation; `hypothesis` is then 0.
    pub peak: Option<Peak>,
    pub source: MatrixSource,
}

impl ByteResult {
    pub fn is_inconclusive(&self) -> bool {
        self.peak.is_none()
    }

    pub fn require_conclusive(&self) -> Result<u8> {
        match self.peak {
            Some(_) => Ok(self.hypothesis),
            None => Err(CpaError::AttackInconclusive {
                position: self.position,
            }),
        }
    }
}

/// `P[h][i] = HW(SBOX[h ^ plaintext_i[position]])`, shape `256 x N`.
pub fn build_prediction_matrix(dataset: &TraceDataset, position: usize) -> Result<Array2<f64>> {
    check_position(dataset, position)?;
    let plaintext = dataset.plaintext_column(position);
    Ok(Array2::from_shape_fn(
        (NUM_HYPOTHESES, dataset.num_traces()),
        |(h, i)| predict(h as u8, plaintext[i]) as f64,
    ))
}

/// `C[h][t] = |pearson(P[h], traces[.., t])|`, shape `256 x T`.
///
/// Degenerate cells (constant prediction row or constant sample column) are
/// recorded as zero.
pub fn compute_correlation_matrix(
    dataset: &TraceDataset,
    predictions: &Array2<f64>,
) -> Result<Array2<f64>> {
    if predictions.ncols() != dataset.num_traces() {
        return Err(CpaError::DimensionMismatch {
            expected: dataset.num_traces(),
            got: predictions.ncols(),
        });
    }

    let num_rows = predictions.nrows();
    let num_samples = dataset.num_samples();

    let rows = (0..num_rows)
        .into_par_iter()
        .map(|h| {
            let model = predictions.row(h);
            (0..num_samples)
                .map(|t| match pearson(model, dataset.sample_column(t)) {
                    Ok(r) => Ok(r.abs()),
                    Err(CpaError::DegenerateInput(_)) => Ok(0.0),
                    Err(e) => Err(e),
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    Array2::from_shape_vec(
        (num_rows, num_samples),
        rows.into_iter().flatten().collect(),
    )
    .map_err(|e| CpaError::TraceDataset(e.to_string()))
}

/// Row of the cell with the largest |value|. Ties go to the first cell in
/// row-major order (lowest hypothesis, then lowest sample). `None` if every
/// cell is zero.
pub fn select_hypothesis(matrix: ArrayView2<f64>) -> Option<(u8, Peak)> {
    let mut best: Option<(usize, Peak)> = None;
    for ((h, t), &c) in matrix.indexed_iter() {
        let c = c.abs();
        let better = match best {
            Some((_, peak)) => c > peak.correlation,
            None => c > 0.0,
        };
        if better {
            best = Some((
                h,
                Peak {
                    correlation: c,
                    sample: t,
                },
            ));
        }
    }
    best.map(|(h, peak)| (h as u8, peak))
}

/// Hypotheses sorted by their row peak, strongest first.
pub fn rank_hypotheses(matrix: ArrayView2<f64>, top: usize) -> Vec<(u8, f64)> {
    let mut peaks: Vec<(u8, f64)> = matrix
        .outer_iter()
        .enumerate()
        .filter_map(|(h, row)| row.mapv(f64::abs).max().ok().map(|&m| (h as u8, m)))
        .collect();
    peaks.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    peaks.truncate(top);
    peaks
}

fn check_position(dataset: &TraceDataset, position: usize) -> Result<()> {
    if position >= dataset.key_length() {
        return Err(CpaError::TraceDataset(format!(
            "byte position {position} outside plaintexts of {} bytes",
            dataset.key_length()
        )));
    }
    Ok(())
}

/// Attacks single byte positions of one dataset, memoizing correlation
/// matrices in a [`MatrixCache`].
pub struct ByteAttacker<'a> {
    dataset: &'a TraceDataset,
    cache: MatrixCache,
}

impl<'a> ByteAttacker<'a> {
    pub fn new(dataset: &'a TraceDataset, cache: MatrixCache) -> Self {
        Self { dataset, cache }
    }

    pub fn cache(&self) -> &MatrixCache {
        &self.cache
    }

    pub fn attack_byte(&self, position: usize, policy: CachePolicy) -> Result<ByteResult> {
        check_position(self.dataset, position)?;

        let cached = if policy.reuse_if_present {
            self.cache.load(position, self.dataset.num_samples())?
        } else {
            None
        };

        let (matrix, source) = match cached {
            Some(matrix) => {
                info!(
                    "[byte {position}] reading correlation matrix from {}",
                    self.cache.path_for(position).display()
                );
                (matrix, MatrixSource::Cache)
            }
            None => {
                debug!("[byte {position}] no reusable matrix, computing");
                let predictions = build_prediction_matrix(self.dataset, position)?;
                info!("[byte {position}] calculating correlation matrix");
                let matrix = compute_correlation_matrix(self.dataset, &predictions)?;
                if policy.write_on_compute {
                    if let Err(e) = self.cache.store(position, &matrix) {
                        warn!("[byte {position}] could not persist correlation matrix: {e}");
                    }
                }
                (matrix, MatrixSource::Computed)
            }
        };

        if log_enabled!(Level::Debug) {
            debug!("[byte {position}] top hypotheses {:?}", rank_hypotheses(matrix.view(), 5));
        }

        let result = match select_hypothesis(matrix.view()) {
            Some((hypothesis, peak)) => {
                info!(
                    "[byte {position}] key byte {hypothesis:02x} (|r| = {:.4} at sample {})",
                    peak.correlation, peak.sample
                );
                ByteResult {
                    position,
                    hypothesis,
                    peak: Some(peak),
                    source,
                }
            }
            None => {
                warn!("{}", CpaError::AttackInconclusive { position });
                ByteResult {
                    position,
                    hypothesis: 0,
                    peak: None,
                    source,
                }
            }
        };
        Ok(result)
    }
}
