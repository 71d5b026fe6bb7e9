/*
 *  File: traces.rs
 *  Author: Prasanna Paithankar (21CS30065)
 *  Date: 19/10/2026
 *
 *  Course: Hardware Security (CS60004) Spring 2025
 *  full-key-cpa: full AES-128 key recovery by correlation power analysis
 *
 *  Refer to the README.md for other details.
 */

//! Trace dataset: N plaintexts matched with N aligned power traces.

use std::path::Path;

use csv::ReaderBuilder;
use log::{debug, warn};
use ndarray::{Array2, ArrayView1};

use crate::error::{CpaError, Result};

pub const DEFAULT_MAX_DATAPOINTS: usize = 4000;

/// Column layout of a trace CSV file: one header row, then per record
/// `key_length` hex plaintext bytes, `skip_columns` ignored columns
/// (ciphertext bytes in the usual capture format) and the samples.
#[derive(Debug, Clone, Copy)]
pub struct CsvLayout {
    pub key_length: usize,
    pub skip_columns: usize,
}

impl Default for CsvLayout {
    fn default() -> Self {
        Self {
            key_length: 16,
            skip_columns: 16,
        }
    }
}

/// Immutable, validated set of traces. Row `i` of `plaintexts` belongs to
/// row `i` of `traces`.
#[derive(Debug, Clone)]
pub struct TraceDataset {
    plaintexts: Array2<u8>,
    traces: Array2<f64>,
}

impl TraceDataset {
    /// Builds a dataset from owned rows, keeping at most `max_datapoints`
    /// samples of each trace.
    pub fn from_rows(
        plaintexts: Vec<Vec<u8>>,
        traces: Vec<Vec<f64>>,
        max_datapoints: usize,
    ) -> Result<Self> {
        if plaintexts.len() != traces.len() {
            return Err(CpaError::TraceDataset(format!(
                "{} plaintexts but {} traces",
                plaintexts.len(),
                traces.len()
            )));
        }
        if max_datapoints == 0 {
            return Err(CpaError::TraceDataset(
                "max_datapoints must be positive".into(),
            ));
        }

        let key_length = plaintexts.first().map_or(0, Vec::len);
        if let Some(i) = plaintexts.iter().position(|p| p.len() != key_length) {
            return Err(CpaError::TraceDataset(format!(
                "plaintext {i} has {} bytes, expected {key_length}",
                plaintexts[i].len()
            )));
        }

        let available = traces.first().map_or(0, Vec::len);
        let num_samples = available.min(max_datapoints);
        if let Some(i) = traces
            .iter()
            .position(|t| t.len().min(max_datapoints) != num_samples)
        {
            return Err(CpaError::TraceDataset(format!(
                "trace {i} has {} samples, expected {num_samples}",
                traces[i].len().min(max_datapoints)
            )));
        }
        if available > 0 && available < max_datapoints {
            warn!(
                "traces carry {available} samples, fewer than max_datapoints = {max_datapoints}; using {available}"
            );
        }

        let num_traces = traces.len();
        let plaintexts = Array2::from_shape_vec(
            (num_traces, key_length),
            plaintexts.into_iter().flatten().collect(),
        )
        .map_err(|e| CpaError::TraceDataset(e.to_string()))?;
        let traces = Array2::from_shape_vec(
            (num_traces, num_samples),
            traces
                .into_iter()
                .flat_map(|t| t.into_iter().take(num_samples))
                .collect(),
        )
        .map_err(|e| CpaError::TraceDataset(e.to_string()))?;

        Self::new(plaintexts, traces)
    }

    /// Wraps already shaped matrices (`N x key_length` and `N x T`).
    pub fn new(plaintexts: Array2<u8>, traces: Array2<f64>) -> Result<Self> {
        let dataset = Self { plaintexts, traces };
        dataset.validate()?;
        Ok(dataset)
    }

    /// Reads a trace CSV file, see [`CsvLayout`].
    pub fn load_csv<P: AsRef<Path>>(
        path: P,
        layout: CsvLayout,
        max_datapoints: usize,
    ) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CpaError::TraceDataset(format!(
                "file {} does not exist",
                path.display()
            )));
        }

        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;
        let mut plaintexts = Vec::new();
        let mut traces = Vec::new();

        for (row, result) in rdr.records().enumerate() {
            let record = result?;
            let plaintext = record
                .iter()
                .take(layout.key_length)
                .map(|x| {
                    parse_hex_byte(x.trim()).map_err(|e| {
                        CpaError::TraceDataset(format!("record {row}: bad plaintext byte {x:?}: {e}"))
                    })
                })
                .collect::<Result<Vec<u8>>>()?;
            if plaintext.len() != layout.key_length {
                return Err(CpaError::TraceDataset(format!(
                    "record {row} holds {} plaintext bytes, expected {}",
                    plaintext.len(),
                    layout.key_length
                )));
            }
            let trace = record
                .iter()
                .skip(layout.key_length + layout.skip_columns)
                .take(max_datapoints)
                .map(|x| {
                    x.trim().parse::<f64>().map_err(|e| {
                        CpaError::TraceDataset(format!("record {row}: bad sample {x:?}: {e}"))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;

            plaintexts.push(plaintext);
            traces.push(trace);
        }

        debug!("read {} records from {}", traces.len(), path.display());
        Self::from_rows(plaintexts, traces, max_datapoints)
    }

    fn validate(&self) -> Result<()> {
        let (n, key_length) = self.plaintexts.dim();
        let (m, num_samples) = self.traces.dim();
        if n != m {
            return Err(CpaError::TraceDataset(format!(
                "{n} plaintexts but {m} traces"
            )));
        }
        if n < 2 {
            return Err(CpaError::TraceDataset(format!(
                "{n} trace(s), correlation needs at least 2"
            )));
        }
        if key_length == 0 {
            return Err(CpaError::TraceDataset("plaintexts are empty".into()));
        }
        if num_samples == 0 {
            return Err(CpaError::TraceDataset("traces hold no samples".into()));
        }
        if self.traces.iter().any(|s| !s.is_finite()) {
            return Err(CpaError::TraceDataset("non-finite sample value".into()));
        }
        Ok(())
    }

    pub fn num_traces(&self) -> usize {
        self.traces.nrows()
    }

    pub fn num_samples(&self) -> usize {
        self.traces.ncols()
    }

    pub fn key_length(&self) -> usize {
        self.plaintexts.ncols()
    }

    /// Plaintext byte at `position` for every trace, in trace order.
    pub fn plaintext_column(&self, position: usize) -> ArrayView1<'_, u8> {
        self.plaintexts.column(position)
    }

    /// Sample `t` across all traces.
    pub fn sample_column(&self, t: usize) -> ArrayView1<'_, f64> {
        self.traces.column(t)
    }
}

fn parse_hex_byte(s: &str) -> std::result::Result<u8, hex::FromHexError> {
    let s = s.trim_start_matches("0x").trim_start_matches("0X");
    let padded;
    let s = if s.len() == 1 {
        padded = format!("0{s}");
        padded.as_str()
    } else {
        s
    };
    let mut byte = [0u8; 1];
    hex::decode_to_slice(s, &mut byte)?;
    Ok(byte[0])
}
