//! 2Q Cache Metrics
//!
//! Request, hit and eviction counters for the 2Q cache, split by segment, plus a
//! snapshot of each segment's byte occupancy against its budget.

extern crate alloc;

use super::{ratio, CacheMetrics};
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};

/// Counters kept by a [`TwoQueueCache`](crate::TwoQueueCache).
///
/// Sizes are in bytes, the unit the budgets are enforced in. Totals such as
/// `cache_hits` or `evictions` are derived from the per-segment counters rather
/// than stored twice.
#[derive(Debug, Clone)]
pub struct TwoQueueCacheMetrics {
    /// The configured `max_bytes` both budgets are derived from
    pub max_bytes: u64,

    /// Byte budget of the probationary segment
    pub probationary_budget: u64,

    /// Byte budget of the protected segment
    pub protected_budget: u64,

    /// Bytes currently held by the probationary segment
    pub probationary_bytes: u64,

    /// Bytes currently held by the protected segment
    pub protected_bytes: u64,

    /// Entries currently in the probationary segment
    pub probationary_len: u64,

    /// Entries currently in the protected segment
    pub protected_len: u64,

    /// `get`/`get_mut` calls that found their key in probationary (and promoted it)
    pub probationary_hits: u64,

    /// `get`/`get_mut` calls that found their key in protected
    pub protected_hits: u64,

    /// Misses reported through `record_miss`
    pub misses: u64,

    /// Stored size of every entry served by a hit
    pub bytes_hit: u64,

    /// Object sizes reported with each miss
    pub bytes_missed: u64,

    /// Stored size of every entry written by `put`
    pub bytes_written: u64,

    /// Moves from probationary to protected, by `get` or by `put`
    pub total_promotions: u64,

    /// `put` calls that replaced the value of a protected entry
    pub in_place_updates: u64,

    /// Entries dropped from the front of probationary
    pub probationary_evictions: u64,

    /// Entries dropped from the back of protected
    pub protected_evictions: u64,

    /// Bytes released by evictions from either segment
    pub bytes_evicted: u64,

    /// Times the eviction callback ran
    pub callback_invocations: u64,
}

impl TwoQueueCacheMetrics {
    /// Creates zeroed counters for a cache with the given byte limits.
    pub fn new(max_bytes: u64, probationary_budget: u64, protected_budget: u64) -> Self {
        Self {
            max_bytes,
            probationary_budget,
            protected_budget,
            probationary_bytes: 0,
            protected_bytes: 0,
            probationary_len: 0,
            protected_len: 0,
            probationary_hits: 0,
            protected_hits: 0,
            misses: 0,
            bytes_hit: 0,
            bytes_missed: 0,
            bytes_written: 0,
            total_promotions: 0,
            in_place_updates: 0,
            probationary_evictions: 0,
            protected_evictions: 0,
            bytes_evicted: 0,
            callback_invocations: 0,
        }
    }

    /// Records a hit on a probationary entry, which the cache then promotes.
    pub fn record_probationary_hit(&mut self, size: u64) {
        self.probationary_hits += 1;
        self.bytes_hit += size;
    }

    /// Records a hit on a protected entry.
    pub fn record_protected_hit(&mut self, size: u64) {
        self.protected_hits += 1;
        self.bytes_hit += size;
    }

    /// Records a lookup the caller could not serve. `size` is the size of the
    /// object it had to fetch elsewhere.
    pub fn record_miss(&mut self, size: u64) {
        self.misses += 1;
        self.bytes_missed += size;
    }

    /// Records a move from probationary to protected.
    pub fn record_promotion(&mut self) {
        self.total_promotions += 1;
    }

    /// Records an entry stored by `put`, either a new key or a promoted one.
    pub fn record_write(&mut self, size: u64) {
        self.bytes_written += size;
    }

    /// Records a `put` that replaced a protected value in place.
    pub fn record_update(&mut self, new_size: u64) {
        self.in_place_updates += 1;
        self.bytes_written += new_size;
    }

    /// Records an entry dropped from probationary. No callback runs for these.
    pub fn record_probationary_eviction(&mut self, size: u64) {
        self.probationary_evictions += 1;
        self.bytes_evicted += size;
    }

    /// Records an entry dropped from protected.
    pub fn record_protected_eviction(&mut self, size: u64) {
        self.protected_evictions += 1;
        self.bytes_evicted += size;
    }

    /// Records one run of the eviction callback.
    pub fn record_callback(&mut self) {
        self.callback_invocations += 1;
    }

    /// Replaces the occupancy snapshot with `(bytes, entries)` for each segment.
    pub fn update_segment_sizes(&mut self, probationary: (u64, u64), protected: (u64, u64)) {
        (self.probationary_bytes, self.probationary_len) = probationary;
        (self.protected_bytes, self.protected_len) = protected;
    }

    /// Hits in either segment.
    pub fn cache_hits(&self) -> u64 {
        self.probationary_hits + self.protected_hits
    }

    /// Hits plus reported misses.
    pub fn requests(&self) -> u64 {
        self.cache_hits() + self.misses
    }

    /// Evictions from either segment.
    pub fn evictions(&self) -> u64 {
        self.probationary_evictions + self.protected_evictions
    }

    /// Bytes held by both segments together.
    pub fn cache_size_bytes(&self) -> u64 {
        self.probationary_bytes + self.protected_bytes
    }

    /// Hits over requests, 0.0 before the first request.
    pub fn hit_rate(&self) -> f64 {
        ratio(self.cache_hits(), self.requests())
    }

    /// Hit bytes over hit plus missed bytes.
    pub fn byte_hit_rate(&self) -> f64 {
        ratio(self.bytes_hit, self.bytes_hit + self.bytes_missed)
    }

    /// Share of hits served by protected without a promotion.
    pub fn protection_ratio(&self) -> f64 {
        ratio(self.protected_hits, self.cache_hits())
    }

    /// Probationary bytes over the probationary budget.
    pub fn probationary_utilization(&self) -> f64 {
        ratio(self.probationary_bytes, self.probationary_budget)
    }

    /// Protected bytes over the protected budget.
    ///
    /// Can exceed 1.0 between a promoting `get` and the next `put`.
    pub fn protected_utilization(&self) -> f64 {
        ratio(self.protected_bytes, self.protected_budget)
    }

    /// Every counter and derived rate, keyed by name.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let counters = [
            ("requests", self.requests()),
            ("cache_hits", self.cache_hits()),
            ("cache_misses", self.misses),
            ("bytes_hit", self.bytes_hit),
            ("bytes_missed", self.bytes_missed),
            ("bytes_written", self.bytes_written),
            ("bytes_evicted", self.bytes_evicted),
            ("evictions", self.evictions()),
            ("cache_size_bytes", self.cache_size_bytes()),
            ("max_bytes", self.max_bytes),
            ("probationary_bytes", self.probationary_bytes),
            ("protected_bytes", self.protected_bytes),
            ("probationary_len", self.probationary_len),
            ("protected_len", self.protected_len),
            ("probationary_budget", self.probationary_budget),
            ("protected_budget", self.protected_budget),
            ("probationary_hits", self.probationary_hits),
            ("protected_hits", self.protected_hits),
            ("total_promotions", self.total_promotions),
            ("in_place_updates", self.in_place_updates),
            ("probationary_evictions", self.probationary_evictions),
            ("protected_evictions", self.protected_evictions),
            ("callback_invocations", self.callback_invocations),
        ];
        let rates = [
            ("hit_rate", self.hit_rate()),
            ("byte_hit_rate", self.byte_hit_rate()),
            ("protection_ratio", self.protection_ratio()),
            ("promotion_rate", ratio(self.total_promotions, self.requests())),
            ("probationary_utilization", self.probationary_utilization()),
            ("protected_utilization", self.protected_utilization()),
        ];

        let mut metrics: BTreeMap<String, f64> = counters
            .into_iter()
            .map(|(name, value)| (name.to_string(), value as f64))
            .collect();
        metrics.extend(rates.into_iter().map(|(name, value)| (name.to_string(), value)));
        metrics
    }
}

impl CacheMetrics for TwoQueueCacheMetrics {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.to_btreemap()
    }

    fn algorithm_name(&self) -> &'static str {
        "2Q"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_are_derived_from_segments() {
        let mut metrics = TwoQueueCacheMetrics::new(100, 35, 65);
        metrics.record_write(20);
        metrics.record_write(20);
        metrics.record_probationary_hit(20);
        metrics.record_promotion();
        metrics.record_protected_hit(20);
        metrics.record_miss(40);
        metrics.record_probationary_eviction(20);
        metrics.record_protected_eviction(20);
        metrics.record_callback();

        assert_eq!(metrics.cache_hits(), 2);
        assert_eq!(metrics.requests(), 3);
        assert_eq!(metrics.evictions(), 2);
        assert_eq!(metrics.protection_ratio(), 0.5);
        assert_eq!(metrics.byte_hit_rate(), 0.5);

        let map = metrics.metrics();
        assert_eq!(map["cache_misses"], 1.0);
        assert_eq!(map["bytes_written"], 40.0);
        assert_eq!(map["bytes_evicted"], 40.0);
        assert_eq!(map["total_promotions"], 1.0);
        assert_eq!(map["protected_evictions"], 1.0);
        assert_eq!(map["callback_invocations"], 1.0);
        assert_eq!(map["probationary_budget"], 35.0);
        assert_eq!(metrics.algorithm_name(), "2Q");
    }

    #[test]
    fn test_occupancy_snapshot() {
        let mut metrics = TwoQueueCacheMetrics::new(100, 35, 65);
        metrics.update_segment_sizes((7, 1), (130, 3));
        assert_eq!(metrics.cache_size_bytes(), 137);
        assert_eq!(metrics.probationary_utilization(), 0.2);
        assert_eq!(metrics.protected_utilization(), 2.0);
        assert_eq!(metrics.protected_len, 3);

        metrics.update_segment_sizes((0, 0), (0, 0));
        assert_eq!(metrics.metrics()["cache_size_bytes"], 0.0);
    }

    #[test]
    fn test_update_counts_written_bytes() {
        let mut metrics = TwoQueueCacheMetrics::new(100, 35, 65);
        metrics.record_write(10);
        metrics.record_update(4);
        assert_eq!(metrics.bytes_written, 14);
        assert_eq!(metrics.in_place_updates, 1);
    }

    #[test]
    fn test_empty_metrics_report_zero_rates() {
        let map = TwoQueueCacheMetrics::new(1, 0, 0).metrics();
        assert_eq!(map["hit_rate"], 0.0);
        assert_eq!(map["promotion_rate"], 0.0);
        assert_eq!(map["protected_utilization"], 0.0);
        assert!(map.keys().zip(map.keys().skip(1)).all(|(a, b)| a < b));
    }
}
