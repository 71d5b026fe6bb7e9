/*
 *  File: main.rs
 *  Author: Prasanna Paithankar (21CS30065)
 *  Date: 19/10/2026
 *
 *  Course: Hardware Security (CS60004) Spring 2025
 *  full-key-cpa: full AES-128 key recovery by correlation power analysis
 *
 *  Refer to the README.md for other details.
 */

use std::path::{Path, PathBuf};
use std::process;

use full_key_cpa::{
    attack_byte_with_retry, attack_full_key, ByteAttacker, CachePolicy, Comparison, CsvLayout,
    Result, RunConfig, Threshold, TraceDataset, DEFAULT_MAX_DATAPOINTS,
};
use log::{error, LevelFilter};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "full-key-cpa",
    about = "Find an AES-128 key via correlation power analysis"
)]
struct Opt {
    /// Trace CSV: plaintext bytes (hex), skipped columns, then samples
    #[structopt(parse(from_os_str), default_value = "src/trace_data_bootcamp_PT5000.csv")]
    filename: PathBuf,

    /// Samples per trace to keep
    #[structopt(short = "l", long = "max-datapoints", default_value = "4000")]
    max_datapoints: usize,

    /// Attack only this byte position
    #[structopt(short = "b", long = "byte-position")]
    byte_position: Option<usize>,

    /// Persist computed correlation matrices
    #[structopt(short = "s", long = "store")]
    store: bool,

    /// Ignore persisted correlation matrices
    #[structopt(short = "r", long = "recalculate")]
    recalculate: bool,

    #[structopt(short = "k", long = "key-length", default_value = "16")]
    key_length: usize,

    /// Columns between the plaintext bytes and the samples (ciphertext)
    #[structopt(long = "skip-columns", default_value = "16")]
    skip_columns: usize,

    /// Defaults to matrices/<trace file stem>
    #[structopt(long = "cache-dir", parse(from_os_str))]
    cache_dir: Option<PathBuf>,

    /// Worker threads, defaults to the number of available cores
    #[structopt(short = "j", long = "workers")]
    workers: Option<usize>,

    /// Warn about key bytes whose peak |r| is not above this value
    #[structopt(long = "min-correlation", default_value = "0.0")]
    min_correlation: f64,

    /// Show debug logs
    #[structopt(short = "v", long = "verbose")]
    verbose: bool,
}

fn default_cache_dir(filename: &Path) -> PathBuf {
    let stem = filename
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "traces".to_string());
    Path::new("matrices").join(stem)
}

fn run(opt: Opt) -> Result<()> {
    let max_datapoints = if opt.max_datapoints == 0 {
        DEFAULT_MAX_DATAPOINTS
    } else {
        opt.max_datapoints
    };
    let layout = CsvLayout {
        key_length: opt.key_length,
        skip_columns: opt.skip_columns,
    };
    let dataset = TraceDataset::load_csv(&opt.filename, layout, max_datapoints)?;

    let config = RunConfig {
        cache_dir: opt
            .cache_dir
            .clone()
            .unwrap_or_else(|| default_cache_dir(&opt.filename)),
        cache_policy: CachePolicy {
            reuse_if_present: !opt.recalculate,
            write_on_compute: opt.store,
        },
        workers: opt.workers,
        confidence: Threshold::new(Comparison::GreaterThan, opt.min_correlation),
    };

    if let Some(position) = opt.byte_position {
        let attacker = ByteAttacker::new(&dataset, config.cache());
        let result = attack_byte_with_retry(&attacker, position, config.cache_policy)?;
        println!("Recovered key byte {}: {:02X}", result.position, result.hypothesis);
        return Ok(());
    }

    let key = attack_full_key(&dataset, opt.key_length, &config)?;
    println!("Recovered key: {}", key.to_hex().to_uppercase());
    Ok(())
}

fn main() {
    let opt = Opt::from_args();

    env_logger::Builder::new()
        .filter_level(if opt.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_default_env()
        .init();

    if let Err(e) = run(opt) {
        error!("{e}");
        process::exit(1);
    }
}
