//! 2Q Cache Metrics Demonstration
//!
//! Runs the same workload against caches with different probationary/protected
//! splits and prints the request and segment metrics side by side. The workload
//! mixes a small hot set with a long one-time scan, which is where the split
//! matters.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::num::NonZeroU64;
use std::rc::Rc;
use twoq_cache::{config::TwoQueueCacheConfig, metrics::CacheMetrics, TwoQueueCache};

const MAX_BYTES: u64 = 4 * 1024;
const HOT_KEYS: usize = 24;
const SCAN_KEYS: usize = 400;

fn main() {
    println!("2Q Cache Metrics - Split Comparison");
    println!("===================================\n");
    println!("   • Budget: {MAX_BYTES} bytes");
    println!("   • Workload: {HOT_KEYS} hot keys read repeatedly, interleaved with a {SCAN_KEYS}-key scan\n");

    let splits = [(0.1, 0.9), (0.25, 0.75), (0.35, 0.65), (0.5, 0.5)];
    let mut results = Vec::new();
    for (probationary, protected) in splits {
        let (cache, callbacks) = run_workload(probationary, protected);
        results.push((format!("{probationary:.2}/{protected:.2}"), cache, callbacks));
    }

    println!(
        "{:<10} {:<8} {:<8} {:<10} {:<12} {:<12} {:<10}",
        "Split", "Hits", "Misses", "Evictions", "Hit Rate %", "Promotions", "Callbacks"
    );
    println!("{}", "-".repeat(76));
    for (name, cache, callbacks) in &results {
        let metrics = cache.metrics();
        let hits = metric(&metrics, "cache_hits");
        let requests = metric(&metrics, "requests");
        let evictions = metric(&metrics, "evictions");
        let hit_rate = metric(&metrics, "hit_rate") * 100.0;
        let promotions = metric(&metrics, "total_promotions");
        let misses = requests - hits;
        println!(
            "{name:<10} {hits:<8.0} {misses:<8.0} {evictions:<10.0} {hit_rate:<12.1} {promotions:<12.0} {callbacks:<10}"
        );
    }

    println!("\nSegment occupancy after the run:\n");
    for (name, cache, _) in &results {
        let metrics = cache.metrics();
        println!("{name}:");
        print_segment_metrics(&metrics);
        println!(
            "  protected keys (MRU first): {}",
            cache
                .protected_keys()
                .take(5)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!();
    }

    if let Some((_, cache, _)) = results.first() {
        demonstrate_deterministic_ordering(cache);
    }
}

/// Replays the hot-set-plus-scan workload, counting eviction callbacks.
fn run_workload(probationary: f64, protected: f64) -> (TwoQueueCache<String, String>, u64) {
    let callbacks = Rc::new(Cell::new(0u64));
    let sink = Rc::clone(&callbacks);

    let config = TwoQueueCacheConfig {
        max_bytes: NonZeroU64::new(MAX_BYTES).unwrap(),
        probationary_ratio: probationary,
        protected_ratio: protected,
    };
    let mut cache: TwoQueueCache<String, String> = TwoQueueCache::init(
        config,
        Some(Box::new(move |_k: &String, _v: &String| sink.set(sink.get() + 1))),
    );

    let value = "v".repeat(90);
    for i in 0..SCAN_KEYS {
        let hot = format!("hot{:02}", i % HOT_KEYS);
        request(&mut cache, hot, &value);

        let scan = format!("scan{i:04}");
        request(&mut cache, scan, &value);
    }

    let count = callbacks.get();
    (cache, count)
}

/// Read-through access: get, and put on a miss.
fn request(cache: &mut TwoQueueCache<String, String>, key: String, value: &str) {
    if cache.get(key.as_str()).is_none() {
        cache.record_miss((key.len() + value.len()) as u64);
        cache.put(key, value.to_string());
    }
}

fn metric(metrics: &BTreeMap<String, f64>, name: &str) -> f64 {
    metrics.get(name).copied().unwrap_or(0.0)
}

fn print_segment_metrics(metrics: &BTreeMap<String, f64>) {
    println!(
        "  probationary: {:.0}/{:.0} bytes, {:.0} entries, {:.0} evictions",
        metric(metrics, "probationary_bytes"),
        metric(metrics, "probationary_budget"),
        metric(metrics, "probationary_len"),
        metric(metrics, "probationary_evictions"),
    );
    println!(
        "  protected:    {:.0}/{:.0} bytes, {:.0} entries, {:.0} evictions",
        metric(metrics, "protected_bytes"),
        metric(metrics, "protected_budget"),
        metric(metrics, "protected_len"),
        metric(metrics, "protected_evictions"),
    );
    println!(
        "  protection ratio: {:.2}",
        metric(metrics, "protection_ratio")
    );
}

fn demonstrate_deterministic_ordering(cache: &dyn CacheMetrics) {
    println!("Deterministic Metrics Ordering (BTreeMap):");
    println!("==========================================\n");

    let metrics = cache.metrics();
    for (i, key) in metrics.keys().take(8).enumerate() {
        println!("  {}. {}", i + 1, key);
    }
    println!("\nalgorithm: {}", cache.algorithm_name());
}
