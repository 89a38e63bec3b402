//! Synthetic request log generation
//!
//! Produces traces with the shape 2Q is designed for: a small hot working set
//! requested repeatedly, interleaved with scan traffic where every key is
//! requested exactly once. Hot keys follow a Zipf-like popularity curve. Output
//! is one or more CSV files of `timestamp,key,size` rows.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Parameters for generating synthetic traffic logs
#[derive(Debug, Clone)]
pub struct TrafficLogConfig {
    /// Total number of requests across all files
    pub requests: u64,
    /// Number of distinct keys in the hot working set
    pub hot_keys: u32,
    /// Percentage of requests that go to the hot set; the rest are scan keys
    pub hot_traffic_percent: u8,
    /// Minimum object size in bytes
    pub min_size: u64,
    /// Maximum object size in bytes
    pub max_size: u64,
    /// Number of files the trace is split into
    pub files: u32,
    /// Requests per simulated second
    pub rps: u32,
    /// RNG seed, `None` for a fresh trace on every run
    pub seed: Option<u64>,
    /// Timestamp of the first request
    pub start_time: u64,
    /// Output directory
    pub output_dir: PathBuf,
}

impl Default for TrafficLogConfig {
    fn default() -> Self {
        Self {
            requests: 100_000,
            hot_keys: 1_000,
            hot_traffic_percent: 70,
            min_size: 512,
            max_size: 16 * 1024,
            files: 1,
            rps: 100,
            seed: None,
            start_time: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs()),
            output_dir: PathBuf::from("traces"),
        }
    }
}

/// Generator for synthetic traffic logs
pub struct TrafficLogGenerator {
    config: TrafficLogConfig,
}

impl TrafficLogGenerator {
    /// Create a new generator with the given configuration
    pub fn new(config: TrafficLogConfig) -> Self {
        Self { config }
    }

    /// Generate traffic logs according to the configuration, returning the
    /// files written
    pub fn generate(&self) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
        let config = &self.config;
        if config.hot_keys == 0 && config.hot_traffic_percent > 0 {
            return Err("hot_keys must be positive when hot traffic is requested".into());
        }
        if config.hot_traffic_percent > 100 {
            return Err("hot_traffic_percent must be at most 100".into());
        }
        if config.min_size > config.max_size {
            return Err("min_size must not exceed max_size".into());
        }

        fs::create_dir_all(&config.output_dir)?;

        println!("Generating traffic logs with the following parameters:");
        println!("  Requests: {}", config.requests);
        println!(
            "  Hot set: {} keys receiving {}% of traffic",
            config.hot_keys, config.hot_traffic_percent
        );
        println!("  Size range: {} - {} bytes", config.min_size, config.max_size);
        println!("  Files: {}", config.files);
        println!("  Output directory: {}", config.output_dir.display());

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // Hot object sizes are fixed per key so repeated requests agree
        let hot_sizes: Vec<u64> = (0..config.hot_keys)
            .map(|_| rng.gen_range(config.min_size..=config.max_size))
            .collect();

        let files = u64::from(config.files.max(1));
        let per_file = config.requests / files;
        let mut remainder = config.requests % files;
        let mut state = TraceState {
            timestamp: config.start_time,
            emitted: 0,
            next_scan: 0,
        };

        let mut written = Vec::new();
        for index in 0..files {
            let mut count = per_file;
            if remainder > 0 {
                count += 1;
                remainder -= 1;
            }
            let path = config.output_dir.join(format!("trace_{index:02}.csv"));
            self.write_file(&path, count, &hot_sizes, &mut rng, &mut state)?;
            println!("  Wrote {count} requests to {}", path.display());
            written.push(path);
        }

        println!(
            "Traffic log generation complete: {} hot-set keys, {} scan keys",
            config.hot_keys, state.next_scan
        );
        Ok(written)
    }

    fn write_file(
        &self,
        path: &Path,
        count: u64,
        hot_sizes: &[u64],
        rng: &mut StdRng,
        state: &mut TraceState,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let config = &self.config;
        let mut writer = BufWriter::with_capacity(1024 * 1024, File::create(path)?);
        writeln!(writer, "timestamp,key,size")?;

        let hot_probability = f64::from(config.hot_traffic_percent) / 100.0;
        let rps = u64::from(config.rps.max(1));

        for _ in 0..count {
            if !hot_sizes.is_empty() && rng.gen_bool(hot_probability) {
                let rank = zipf_rank(rng, hot_sizes.len());
                writeln!(writer, "{},hot_{rank},{}", state.timestamp, hot_sizes[rank])?;
            } else {
                let size = rng.gen_range(config.min_size..=config.max_size);
                writeln!(writer, "{},scan_{},{size}", state.timestamp, state.next_scan)?;
                state.next_scan += 1;
            }

            state.emitted += 1;
            if state.emitted % rps == 0 {
                state.timestamp += 1;
            }
        }

        writer.flush()?;
        Ok(())
    }
}

/// Position in the trace, carried across output files
struct TraceState {
    timestamp: u64,
    emitted: u64,
    next_scan: u64,
}

/// Draws a rank in `0..n` where rank `r` has weight roughly `1 / (r + 1)`.
fn zipf_rank(rng: &mut StdRng, n: usize) -> usize {
    // inverse CDF of the continuous 1/x density over [1, n + 1)
    let u: f64 = rng.gen();
    let rank = ((n as f64 + 1.0).powf(u) - 1.0) as usize;
    rank.min(n - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::LogReader;
    use std::collections::HashMap;

    fn create_temp_dir(test_name: &str) -> PathBuf {
        let temp_dir = std::env::temp_dir().join(format!("twoq_generator_test_{test_name}"));
        let _ = fs::remove_dir_all(&temp_dir);
        fs::create_dir_all(&temp_dir).expect("Failed to create temp directory");
        temp_dir
    }

    fn test_config(name: &str) -> TrafficLogConfig {
        TrafficLogConfig {
            requests: 5_000,
            hot_keys: 50,
            hot_traffic_percent: 60,
            min_size: 100,
            max_size: 200,
            files: 3,
            rps: 10,
            seed: Some(7),
            start_time: 1_000,
            output_dir: create_temp_dir(name),
        }
    }

    #[test]
    fn test_generates_requested_count_across_files() {
        let config = test_config("count");
        let dir = config.output_dir.clone();
        let files = TrafficLogGenerator::new(config).generate().unwrap();
        assert_eq!(files.len(), 3);

        let requests: Vec<_> = LogReader::new(&dir)
            .stream_requests()
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(requests.len(), 5_000);
        assert!(requests.iter().all(|r| (100..=200).contains(&r.size)));
        assert_eq!(requests[0].timestamp, 1_000);
        assert!(requests.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_scan_keys_are_unique_and_hot_sizes_stable() {
        let config = test_config("shape");
        let dir = config.output_dir.clone();
        TrafficLogGenerator::new(config).generate().unwrap();

        let mut scan_counts: HashMap<String, u32> = HashMap::new();
        let mut hot_sizes: HashMap<String, u64> = HashMap::new();
        let mut hot_requests = 0;
        for request in LogReader::new(&dir).stream_requests().unwrap() {
            let request = request.unwrap();
            if request.key.starts_with("scan_") {
                *scan_counts.entry(request.key).or_default() += 1;
            } else {
                hot_requests += 1;
                let size = *hot_sizes.entry(request.key).or_insert(request.size);
                assert_eq!(size, request.size);
            }
        }

        assert!(scan_counts.values().all(|&c| c == 1));
        assert!(hot_sizes.len() <= 50);
        // 60% of 5000 with generous slack
        assert!((2_500..3_500).contains(&hot_requests), "{hot_requests}");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_same_seed_same_trace() {
        let first = test_config("seed_a");
        let second = TrafficLogConfig {
            output_dir: create_temp_dir("seed_b"),
            ..first.clone()
        };
        let (dir_a, dir_b) = (first.output_dir.clone(), second.output_dir.clone());
        TrafficLogGenerator::new(first).generate().unwrap();
        TrafficLogGenerator::new(second).generate().unwrap();

        let a: Vec<_> = LogReader::new(&dir_a).stream_requests().unwrap().map(Result::unwrap).collect();
        let b: Vec<_> = LogReader::new(&dir_b).stream_requests().unwrap().map(Result::unwrap).collect();
        assert_eq!(a, b);

        let _ = fs::remove_dir_all(&dir_a);
        let _ = fs::remove_dir_all(&dir_b);
    }

    #[test]
    fn test_zipf_rank_favours_low_ranks() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut counts = [0u32; 100];
        for _ in 0..20_000 {
            counts[zipf_rank(&mut rng, 100)] += 1;
        }
        assert!(counts[0] > counts[50] * 5);
        assert!(counts.iter().sum::<u32>() == 20_000);
    }

    #[test]
    fn test_rejects_inverted_size_range() {
        let config = TrafficLogConfig {
            min_size: 10,
            max_size: 5,
            ..test_config("invalid")
        };
        let dir = config.output_dir.clone();
        assert!(TrafficLogGenerator::new(config).generate().is_err());
        let _ = fs::remove_dir_all(&dir);
    }
}
