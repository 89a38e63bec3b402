//! Simulation runner
//!
//! Replays a request log against each selected policy. Every request is a
//! read-through access: `get`, and on a miss `put` the object. Requests are
//! streamed from disk once per policy, so memory use is proportional to the
//! cache budget rather than the trace.
//!
//! ## Byte accounting
//!
//! Both policies charge an entry `key.len() + object size` bytes. The LRU
//! baseline gets the same number of bytes as the two 2Q segments combined.

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use lru::LruCache;
use twoq_cache::metrics::CacheMetrics;
use twoq_cache::TwoQueueCache;

use crate::input::LogReader;
use crate::models::{OpLatencyStats, Payload, Policy, PolicyStats, SimulationConfig, SimulationResult};
use crate::stats::SimulationStats;

/// Byte-budgeted LRU built on the `lru` crate's unbounded map.
pub struct ByteLru {
    cache: LruCache<String, u64>,
    max_bytes: u64,
    current_bytes: u64,
}

impl ByteLru {
    /// Create an empty LRU holding at most `max_bytes` accounted bytes
    pub fn new(max_bytes: u64) -> Self {
        Self {
            cache: LruCache::unbounded(),
            max_bytes,
            current_bytes: 0,
        }
    }

    /// Look up a key, refreshing its recency
    pub fn get(&mut self, key: &str) -> bool {
        self.cache.get(key).is_some()
    }

    /// Insert or replace an object, then evict least recently used entries
    /// until the budget holds
    pub fn put(&mut self, key: String, size: u64) {
        let charge = key.len() as u64 + size;
        if let Some(old) = self.cache.peek(key.as_str()) {
            self.current_bytes = self.current_bytes.saturating_sub(key.len() as u64 + old);
        }
        self.cache.put(key, size);
        self.current_bytes += charge;

        while self.current_bytes > self.max_bytes {
            match self.cache.pop_lru() {
                Some((k, v)) => {
                    self.current_bytes = self.current_bytes.saturating_sub(k.len() as u64 + v)
                }
                None => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn current_bytes(&self) -> u64 {
        self.current_bytes
    }
}

/// Wrapper enum for the simulated policies
enum CacheWrapper {
    TwoQueue(TwoQueueCache<String, Payload>),
    Lru(ByteLru),
}

impl CacheWrapper {
    fn create(policy: Policy, config: &SimulationConfig) -> Result<Self, String> {
        match policy {
            Policy::TwoQueue => {
                TwoQueueCache::try_init(config.cache_config(), None)
                    .map(CacheWrapper::TwoQueue)
                    .map_err(|err| err.to_string())
            }
            Policy::Lru => Ok(CacheWrapper::Lru(ByteLru::new(config.effective_budget()))),
        }
    }

    fn get(&mut self, key: &str) -> bool {
        match self {
            CacheWrapper::TwoQueue(c) => c.get(key).is_some(),
            CacheWrapper::Lru(c) => c.get(key),
        }
    }

    fn put(&mut self, key: String, size: u64) {
        match self {
            CacheWrapper::TwoQueue(c) => {
                let object_size = key.len() as u64 + size;
                c.record_miss(object_size);
                c.put(key, Payload(size));
            }
            CacheWrapper::Lru(c) => c.put(key, size),
        }
    }

    fn len(&self) -> usize {
        match self {
            CacheWrapper::TwoQueue(c) => c.len(),
            CacheWrapper::Lru(c) => c.len(),
        }
    }

    fn current_bytes(&self) -> u64 {
        match self {
            CacheWrapper::TwoQueue(c) => c.current_size(),
            CacheWrapper::Lru(c) => c.current_bytes(),
        }
    }

    fn policy_metrics(&self) -> BTreeMap<String, f64> {
        match self {
            CacheWrapper::TwoQueue(c) => c.metrics(),
            CacheWrapper::Lru(_) => BTreeMap::new(),
        }
    }
}

/// Tracks latency for a single operation type
#[derive(Debug)]
struct OpLatencyTracker {
    total_ns: u64,
    count: u64,
    min_ns: u64,
    max_ns: u64,
    /// Sample reservoir for percentile calculation
    samples: Vec<u64>,
    max_samples: usize,
}

impl OpLatencyTracker {
    fn new() -> Self {
        Self {
            total_ns: 0,
            count: 0,
            min_ns: u64::MAX,
            max_ns: 0,
            samples: Vec::with_capacity(5000),
            max_samples: 5000,
        }
    }

    #[inline]
    fn record(&mut self, latency_ns: u64) {
        self.total_ns += latency_ns;
        self.count += 1;
        self.min_ns = self.min_ns.min(latency_ns);
        self.max_ns = self.max_ns.max(latency_ns);

        // Reservoir sampling for percentiles
        if self.samples.len() < self.max_samples {
            self.samples.push(latency_ns);
        } else {
            let slot = rand::random::<u64>() % self.count;
            if let Ok(slot) = usize::try_from(slot) {
                if slot < self.max_samples {
                    self.samples[slot] = latency_ns;
                }
            }
        }
    }

    fn finalize(mut self) -> OpLatencyStats {
        self.samples.sort_unstable();
        let len = self.samples.len();
        let percentile = |p: usize| {
            if len == 0 {
                0
            } else {
                self.samples[(len * p / 100).min(len - 1)]
            }
        };

        OpLatencyStats {
            total_ns: self.total_ns,
            count: self.count,
            min_ns: if self.min_ns == u64::MAX { 0 } else { self.min_ns },
            max_ns: self.max_ns,
            p50_ns: percentile(50),
            p99_ns: percentile(99),
        }
    }
}

/// Runner for cache simulations
pub struct SimulationRunner {
    config: SimulationConfig,
}

impl SimulationRunner {
    /// Create a new simulation runner
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Run every configured policy over the request log.
    pub fn run(&self) -> Result<SimulationResult, String> {
        let log_reader = LogReader::new(&self.config.input_dir);

        println!("Scanning dataset for statistics...");
        let mut total_requests = 0usize;
        let mut total_bytes = 0u64;
        let mut unique_keys: HashSet<String> = HashSet::new();
        let requests = log_reader
            .stream_requests()
            .map_err(|err| format!("Failed to open log files: {err}"))?;
        for result in requests {
            let request = result.map_err(|err| format!("Failed to parse request: {err}"))?;
            total_requests += 1;
            total_bytes += request.size;
            unique_keys.insert(request.key);
        }

        if total_requests == 0 {
            return Err("No requests found in log files".to_string());
        }
        let unique_objects = unique_keys.len();
        drop(unique_keys);

        println!("\nDataset statistics:");
        println!("  Total requests: {total_requests}");
        println!("  Unique objects: {unique_objects}");
        println!(
            "  Avg requests per object: {:.2}",
            total_requests as f64 / unique_objects as f64
        );

        let mut stats = SimulationStats::new(&self.config.policies);
        let start_time = Instant::now();

        for &policy in &self.config.policies {
            println!("\nRunning {policy}...");
            let policy_stats = self.run_policy(policy, &log_reader)?;
            println!(
                "  Hit rate: {:.2}% (byte hit rate {:.2}%) in {} ms",
                policy_stats.hit_rate(),
                policy_stats.byte_hit_rate(),
                policy_stats.simulation_time_ms
            );
            stats.record(policy, policy_stats);
        }

        Ok(stats.result(start_time.elapsed(), unique_objects, total_requests, total_bytes))
    }

    fn run_policy(&self, policy: Policy, log_reader: &LogReader) -> Result<PolicyStats, String> {
        let mut cache = CacheWrapper::create(policy, &self.config)?;
        let mut stats = PolicyStats::new();
        let mut get_tracker = OpLatencyTracker::new();
        let mut put_tracker = OpLatencyTracker::new();

        let requests = log_reader
            .stream_requests()
            .map_err(|err| format!("Failed to open log files: {err}"))?;

        let policy_start = Instant::now();
        for result in requests {
            let request = result.map_err(|err| format!("Failed to parse request: {err}"))?;

            let get_start = Instant::now();
            let hit = cache.get(&request.key);
            get_tracker.record(elapsed_ns(get_start));

            if hit {
                stats.hits += 1;
                stats.bytes_hit += request.size;
            } else {
                stats.misses += 1;
                stats.bytes_miss += request.size;

                let put_start = Instant::now();
                cache.put(request.key, request.size);
                put_tracker.record(elapsed_ns(put_start));
            }

            stats.peak_bytes = stats.peak_bytes.max(cache.current_bytes());
        }

        stats.simulation_time_ms = u64::try_from(policy_start.elapsed().as_millis()).unwrap_or(u64::MAX);
        stats.final_bytes = cache.current_bytes();
        stats.final_entries = cache.len();
        stats.get_latency = get_tracker.finalize();
        stats.put_latency = put_tracker.finalize();
        stats.policy_metrics = cache.policy_metrics();
        Ok(stats)
    }
}

fn elapsed_ns(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use std::num::NonZeroU64;
    use std::path::{Path, PathBuf};

    fn create_temp_dir(test_name: &str) -> PathBuf {
        let temp_dir = std::env::temp_dir().join(format!("twoq_runner_test_{test_name}"));
        let _ = fs::remove_dir_all(&temp_dir);
        fs::create_dir_all(&temp_dir).expect("Failed to create temp directory");
        temp_dir
    }

    fn write_trace(dir: &Path, rows: &[(&str, u64)]) {
        let mut file = File::create(dir.join("trace.csv")).unwrap();
        writeln!(file, "timestamp,key,size").unwrap();
        for (i, (key, size)) in rows.iter().enumerate() {
            writeln!(file, "{i},{key},{size}").unwrap();
        }
    }

    fn config(dir: PathBuf, max_bytes: u64) -> SimulationConfig {
        SimulationConfig {
            input_dir: dir,
            max_bytes: NonZeroU64::new(max_bytes).unwrap(),
            probationary_ratio: 0.5,
            protected_ratio: 0.5,
            policies: Policy::all(),
        }
    }

    #[test]
    fn test_byte_lru_evicts_least_recent() {
        let mut lru = ByteLru::new(30);
        lru.put("a".to_string(), 9);
        lru.put("b".to_string(), 9);
        lru.put("c".to_string(), 9);
        assert_eq!(lru.current_bytes(), 30);

        assert!(lru.get("a"));
        lru.put("d".to_string(), 9);
        assert!(!lru.get("b"));
        assert!(lru.get("a"));
        assert_eq!(lru.len(), 3);
        assert_eq!(lru.current_bytes(), 30);
    }

    #[test]
    fn test_byte_lru_replacement_and_oversized() {
        let mut lru = ByteLru::new(20);
        lru.put("a".to_string(), 4);
        lru.put("a".to_string(), 9);
        assert_eq!(lru.current_bytes(), 10);

        lru.put("huge".to_string(), 100);
        assert!(lru.is_empty());
        assert_eq!(lru.current_bytes(), 0);
    }

    #[test]
    fn test_two_queue_survives_scan_that_flushes_lru() {
        let dir = create_temp_dir("scan");
        // hot keys a and b are read twice, then a scan passes, then they are read again
        let mut rows = vec![("a", 9), ("b", 9), ("a", 9), ("b", 9)];
        let scan: Vec<String> = (0..10).map(|i| format!("s{i}")).collect();
        rows.extend(scan.iter().map(|k| (k.as_str(), 8)));
        rows.extend([("a", 9), ("b", 9)]);
        write_trace(&dir, &rows);

        let result = SimulationRunner::new(config(dir.clone(), 40)).run().unwrap();
        assert_eq!(result.total_requests, 16);
        assert_eq!(result.unique_objects, 12);

        let two_queue = &result.stats[&Policy::TwoQueue];
        let lru = &result.stats[&Policy::Lru];
        assert_eq!(two_queue.hits, 4);
        assert_eq!(lru.hits, 2);
        assert!(two_queue.final_bytes <= 40);
        assert_eq!(two_queue.policy_metrics["total_promotions"], 2.0);
        assert_eq!(two_queue.policy_metrics["requests"], 16.0);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_empty_trace_is_error() {
        let dir = create_temp_dir("empty");
        write_trace(&dir, &[]);
        assert!(SimulationRunner::new(config(dir.clone(), 100)).run().is_err());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_invalid_ratios_are_reported() {
        let dir = create_temp_dir("ratios");
        write_trace(&dir, &[("a", 1)]);
        let mut bad = config(dir.clone(), 100);
        bad.probationary_ratio = 1.5;
        assert!(SimulationRunner::new(bad).run().is_err());
        let _ = fs::remove_dir_all(&dir);
    }
}
