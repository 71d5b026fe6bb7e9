mod common;

use common::synthetic_dataset;
use full_key_cpa::{
    attack_full_key, CachePolicy, Comparison, CpaError, MatrixCache, MatrixSource, RunConfig,
    Threshold,
};
use std::path::Path;

fn config(dir: &Path, cache_policy: CachePolicy) -> RunConfig {
    RunConfig {
        cache_dir: dir.to_path_buf(),
        cache_policy,
        workers: Some(2),
        confidence: Threshold::new(Comparison::GreaterThan, 0.9),
    }
}

#[test]
fn two_byte_key_in_position_order() {
    let ds = synthetic_dataset(&[0x01, 0xFF], &[3, 5], 50, 8, 11);
    let dir = tempfile::tempdir().unwrap();

    let key = attack_full_key(&ds, 2, &config(dir.path(), CachePolicy::disabled())).unwrap();
    assert_eq!(key.bytes(), vec![0x01, 0xFF]);
    assert_eq!(key.to_hex(), "01ff");
    assert_eq!(key.results()[0].peak.unwrap().sample, 3);
    assert_eq!(key.results()[1].peak.unwrap().sample, 5);
    let confidence = Threshold::new(Comparison::GreaterThan, 0.9);
    assert!(key.weak_positions(&confidence).is_empty());
}

#[test]
fn full_sixteen_byte_key() {
    let key_bytes: Vec<u8> = (0..16u8).map(|i| i.wrapping_mul(29).wrapping_add(0x13)).collect();
    let leak_at: Vec<usize> = (0..16).map(|i| 2 * i + 1).collect();
    let ds = synthetic_dataset(&key_bytes, &leak_at, 60, 34, 12);
    let dir = tempfile::tempdir().unwrap();

    let mut cfg = config(dir.path(), CachePolicy::disabled());
    cfg.workers = None;
    let key = attack_full_key(&ds, 16, &cfg).unwrap();
    assert_eq!(key.bytes(), key_bytes);
    assert_eq!(key.to_hex(), hex::encode(&key_bytes));
}

#[test]
fn shorter_key_uses_leading_positions() {
    let ds = synthetic_dataset(&[0xA0, 0xB1, 0xC2], &[0, 1, 2], 50, 4, 13);
    let dir = tempfile::tempdir().unwrap();
    let key = attack_full_key(&ds, 2, &config(dir.path(), CachePolicy::disabled())).unwrap();
    assert_eq!(key.to_hex(), "a0b1");
}

#[test]
fn batch_populates_then_reuses_cache() {
    let ds = synthetic_dataset(&[0x01, 0xFF], &[3, 5], 50, 8, 14);
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path(), CachePolicy::read_write());

    let first = attack_full_key(&ds, 2, &cfg).unwrap();
    assert!(first
        .results()
        .iter()
        .all(|r| r.source == MatrixSource::Computed));
    let cache = MatrixCache::new(dir.path());
    assert!(cache.contains(0) && cache.contains(1));

    let second = attack_full_key(&ds, 2, &cfg).unwrap();
    assert!(second.results().iter().all(|r| r.source == MatrixSource::Cache));
    assert_eq!(second.bytes(), first.bytes());
}

#[test]
fn corrupted_entry_is_recomputed_once() {
    let ds = synthetic_dataset(&[0x01, 0xFF], &[3, 5], 50, 8, 15);
    let dir = tempfile::tempdir().unwrap();
    let cache = MatrixCache::new(dir.path());
    std::fs::write(cache.path_for(1), b"\x93NUMPY garbage").unwrap();

    let key = attack_full_key(&ds, 2, &config(dir.path(), CachePolicy::default())).unwrap();
    assert_eq!(key.to_hex(), "01ff");
    assert_eq!(key.results()[1].source, MatrixSource::Computed);
}

#[test]
fn key_longer_than_plaintext_is_rejected_up_front() {
    let ds = synthetic_dataset(&[0x01, 0xFF], &[3, 5], 50, 8, 16);
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path(), CachePolicy::read_write());

    assert!(matches!(
        attack_full_key(&ds, 3, &cfg),
        Err(CpaError::TraceDataset(_))
    ));
    assert!(matches!(
        attack_full_key(&ds, 0, &cfg),
        Err(CpaError::TraceDataset(_))
    ));
    assert!(!MatrixCache::new(dir.path()).contains(0));
}
