// Data models for 2Q simulation

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU64;
use std::path::PathBuf;
use std::time::Duration;
use twoq_cache::config::TwoQueueCacheConfig;
use twoq_cache::ByteLen;

/// Represents a single cache request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Unix timestamp of the request in seconds
    pub timestamp: u64,
    /// Cache key
    pub key: String,
    /// Size of the object in bytes
    pub size: u64,
}

impl Request {
    /// Create a new request
    pub fn new(timestamp: u64, key: String, size: u64) -> Self {
        Self {
            timestamp,
            key,
            size,
        }
    }
}

/// Simulated cached object: only its declared size is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payload(pub u64);

impl ByteLen for Payload {
    fn byte_len(&self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

/// Eviction policies supported for simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Policy {
    /// The byte-budgeted 2Q cache under test
    TwoQueue,
    /// Byte-budgeted LRU baseline built on the `lru` crate
    Lru,
}

impl Policy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Policy::TwoQueue => "2Q",
            Policy::Lru => "LRU",
        }
    }

    /// Parse a policy name, case-insensitively
    pub fn parse(name: &str) -> Option<Policy> {
        match name.to_lowercase().as_str() {
            "2q" | "twoq" | "two_queue" => Some(Policy::TwoQueue),
            "lru" => Some(Policy::Lru),
            _ => None,
        }
    }

    /// Get all available policies
    pub fn all() -> Vec<Policy> {
        vec![Policy::TwoQueue, Policy::Lru]
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for a simulation run
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Directory containing input log files
    pub input_dir: PathBuf,
    /// Total byte budget shared by the two 2Q segments
    pub max_bytes: NonZeroU64,
    /// Fraction of `max_bytes` given to the probationary segment
    pub probationary_ratio: f64,
    /// Fraction of `max_bytes` given to the protected segment
    pub protected_ratio: f64,
    /// Policies to simulate
    pub policies: Vec<Policy>,
}

impl SimulationConfig {
    /// The 2Q configuration this run simulates
    pub fn cache_config(&self) -> TwoQueueCacheConfig {
        TwoQueueCacheConfig {
            max_bytes: self.max_bytes,
            probationary_ratio: self.probationary_ratio,
            protected_ratio: self.protected_ratio,
        }
    }

    /// Bytes available to the LRU baseline: the sum of both 2Q budgets
    pub fn effective_budget(&self) -> u64 {
        let config = self.cache_config();
        config.probationary_budget() + config.protected_budget()
    }
}

/// Results of a simulation run
#[derive(Debug)]
pub struct SimulationResult {
    /// Statistics for each policy
    pub stats: BTreeMap<Policy, PolicyStats>,
    /// Total number of requests processed
    pub total_requests: usize,
    /// Total bytes requested
    pub total_bytes: u64,
    /// Number of unique objects in the dataset
    pub unique_objects: usize,
    /// Duration of the simulation
    pub duration: Duration,
}

/// Statistics for a single policy
#[derive(Debug, Default, Clone)]
pub struct PolicyStats {
    /// Number of cache hits
    pub hits: usize,
    /// Number of cache misses
    pub misses: usize,
    /// Bytes served from cache (hits)
    pub bytes_hit: u64,
    /// Bytes served from backend (misses)
    pub bytes_miss: u64,
    /// Simulation time in milliseconds
    pub simulation_time_ms: u64,
    /// Largest accounted size seen after any request
    pub peak_bytes: u64,
    /// Accounted size after the last request
    pub final_bytes: u64,
    /// Entries left in the cache after the last request
    pub final_entries: usize,
    /// Get latency (excludes I/O)
    pub get_latency: OpLatencyStats,
    /// Put latency (excludes I/O)
    pub put_latency: OpLatencyStats,
    /// Policy-specific metrics, for 2Q the cache's own metric map
    pub policy_metrics: BTreeMap<String, f64>,
}

/// Latency statistics for a single operation type
#[derive(Debug, Clone, Default)]
pub struct OpLatencyStats {
    /// Total time spent (nanoseconds)
    pub total_ns: u64,
    /// Number of operations
    pub count: u64,
    /// Minimum latency (nanoseconds)
    pub min_ns: u64,
    /// Maximum latency (nanoseconds)
    pub max_ns: u64,
    /// Median latency from the sample reservoir
    pub p50_ns: u64,
    /// 99th percentile latency from the sample reservoir
    pub p99_ns: u64,
}

impl OpLatencyStats {
    /// Calculate average latency in nanoseconds
    pub fn avg_ns(&self) -> f64 {
        if self.count > 0 {
            self.total_ns as f64 / self.count as f64
        } else {
            0.0
        }
    }

    /// Calculate throughput in operations per second
    pub fn ops_per_sec(&self) -> f64 {
        if self.total_ns > 0 {
            (self.count as f64 * 1_000_000_000.0) / self.total_ns as f64
        } else {
            0.0
        }
    }
}

impl PolicyStats {
    /// Create new empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate hit rate as percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            (self.hits as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Calculate byte hit rate as percentage
    pub fn byte_hit_rate(&self) -> f64 {
        let total = self.bytes_hit + self.bytes_miss;
        if total > 0 {
            (self.bytes_hit as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    fn policy_metric(&self, name: &str) -> f64 {
        self.policy_metrics.get(name).copied().unwrap_or(0.0)
    }
}

/// CSV export row for simulation results
#[derive(Debug, Serialize)]
pub struct CsvResultRow {
    pub policy: String,
    pub hits: usize,
    pub misses: usize,
    pub hit_rate: f64,
    pub byte_hit_rate: f64,
    pub bytes_hit: u64,
    pub bytes_miss: u64,
    pub simulation_time_ms: u64,
    pub peak_bytes: u64,
    pub final_bytes: u64,
    pub final_entries: usize,
    pub get_ops: u64,
    pub get_avg_ns: f64,
    pub get_p50_ns: u64,
    pub get_p99_ns: u64,
    pub put_ops: u64,
    pub put_avg_ns: f64,
    pub put_p50_ns: u64,
    pub put_p99_ns: u64,
    // 2Q only, zero for the baseline
    pub promotions: f64,
    pub probationary_evictions: f64,
    pub protected_evictions: f64,
    pub protection_ratio: f64,
}

impl CsvResultRow {
    /// Build a row from one policy's statistics
    pub fn from_stats(policy: Policy, stats: &PolicyStats) -> Self {
        Self {
            policy: policy.as_str().to_string(),
            hits: stats.hits,
            misses: stats.misses,
            hit_rate: stats.hit_rate(),
            byte_hit_rate: stats.byte_hit_rate(),
            bytes_hit: stats.bytes_hit,
            bytes_miss: stats.bytes_miss,
            simulation_time_ms: stats.simulation_time_ms,
            peak_bytes: stats.peak_bytes,
            final_bytes: stats.final_bytes,
            final_entries: stats.final_entries,
            get_ops: stats.get_latency.count,
            get_avg_ns: stats.get_latency.avg_ns(),
            get_p50_ns: stats.get_latency.p50_ns,
            get_p99_ns: stats.get_latency.p99_ns,
            put_ops: stats.put_latency.count,
            put_avg_ns: stats.put_latency.avg_ns(),
            put_p50_ns: stats.put_latency.p50_ns,
            put_p99_ns: stats.put_latency.p99_ns,
            promotions: stats.policy_metric("total_promotions"),
            probationary_evictions: stats.policy_metric("probationary_evictions"),
            protected_evictions: stats.policy_metric("protected_evictions"),
            protection_ratio: stats.policy_metric("protection_ratio"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parse() {
        assert_eq!(Policy::parse("2Q"), Some(Policy::TwoQueue));
        assert_eq!(Policy::parse("twoq"), Some(Policy::TwoQueue));
        assert_eq!(Policy::parse("LRU"), Some(Policy::Lru));
        assert_eq!(Policy::parse("arc"), None);
    }

    #[test]
    fn test_rates() {
        let stats = PolicyStats {
            hits: 3,
            misses: 1,
            bytes_hit: 100,
            bytes_miss: 300,
            ..PolicyStats::new()
        };
        assert_eq!(stats.hit_rate(), 75.0);
        assert_eq!(stats.byte_hit_rate(), 25.0);
        assert_eq!(PolicyStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_effective_budget_sums_segment_budgets() {
        let config = SimulationConfig {
            input_dir: PathBuf::from("unused"),
            max_bytes: NonZeroU64::new(100).unwrap(),
            probationary_ratio: 0.25,
            protected_ratio: 0.5,
            policies: Policy::all(),
        };
        assert_eq!(config.effective_budget(), 75);
    }

    #[test]
    fn test_payload_reports_declared_size() {
        assert_eq!(Payload(4096).byte_len(), 4096);
    }
}
