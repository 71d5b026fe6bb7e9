#![allow(dead_code)]

use full_key_cpa::leakage::predict;
use full_key_cpa::TraceDataset;

/// Deterministic 64-bit LCG so the synthetic traces never change between runs.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 11
    }

    pub fn byte(&mut self) -> u8 {
        (self.next_u64() >> 8) as u8
    }

    /// Uniform in `[0, 8)`, the same range as the leakage model.
    pub fn sample(&mut self) -> f64 {
        (self.next_u64() as f64 / (1u64 << 53) as f64) * 8.0
    }
}

/// `num_traces` random plaintexts of `key.len()` bytes and traces of
/// `num_samples` noise samples, except that sample `leak_at[j]` carries the
/// noiseless leakage of key byte `j`.
pub fn synthetic_dataset(
    key: &[u8],
    leak_at: &[usize],
    num_traces: usize,
    num_samples: usize,
    seed: u64,
) -> TraceDataset {
    assert_eq!(key.len(), leak_at.len());
    let mut rng = Lcg::new(seed);
    let mut plaintexts = Vec::with_capacity(num_traces);
    let mut traces = Vec::with_capacity(num_traces);
    for _ in 0..num_traces {
        let pt: Vec<u8> = (0..key.len()).map(|_| rng.byte()).collect();
        let mut trace: Vec<f64> = (0..num_samples).map(|_| rng.sample()).collect();
        for (j, &t) in leak_at.iter().enumerate() {
            trace[t] = predict(key[j], pt[j]) as f64;
        }
        plaintexts.push(pt);
        traces.push(trace);
    }
    TraceDataset::from_rows(plaintexts, traces, num_samples).expect("valid synthetic dataset")
}
