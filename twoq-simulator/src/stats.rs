// Statistics collection and reporting for 2Q simulation

use crate::models::{CsvResultRow, Policy, PolicyStats, SimulationResult};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Collects and reports statistics from simulation runs
pub struct SimulationStats {
    stats: BTreeMap<Policy, PolicyStats>,
}

impl SimulationStats {
    /// Create a new statistics collector for the given policies
    pub fn new(policies: &[Policy]) -> Self {
        let stats = policies
            .iter()
            .map(|&policy| (policy, PolicyStats::new()))
            .collect();
        Self { stats }
    }

    /// Store the finished statistics of one policy
    pub fn record(&mut self, policy: Policy, stats: PolicyStats) {
        self.stats.insert(policy, stats);
    }

    /// Get the current result
    pub fn result(
        &self,
        duration: Duration,
        unique_objects: usize,
        total_requests: usize,
        total_bytes: u64,
    ) -> SimulationResult {
        SimulationResult {
            stats: self.stats.clone(),
            total_requests,
            total_bytes,
            unique_objects,
            duration,
        }
    }

    /// Create SimulationStats from a SimulationResult (for reporting after a run)
    pub fn from_result(result: &SimulationResult) -> Self {
        Self {
            stats: result.stats.clone(),
        }
    }

    /// Print a summary report of the simulation results
    pub fn print_summary(&self) {
        println!("\nResults by Policy:");
        println!(
            "{:<6} {:>8} {:>10} {:>10} {:>12} {:>10} {:>10} {:>10}",
            "Policy", "HitRate", "ByteHit%", "Entries", "FinalBytes", "GetAvg", "PutAvg", "GetP99"
        );
        println!("{}", "-".repeat(84));

        for (policy, stats) in &self.stats {
            println!(
                "{:<6} {:>7.2}% {:>9.2}% {:>10} {:>12} {:>8.0}ns {:>8.0}ns {:>8}ns",
                policy.as_str(),
                stats.hit_rate(),
                stats.byte_hit_rate(),
                stats.final_entries,
                stats.final_bytes,
                stats.get_latency.avg_ns(),
                stats.put_latency.avg_ns(),
                stats.get_latency.p99_ns,
            );
        }

        if let Some(stats) = self.stats.get(&Policy::TwoQueue) {
            print_two_queue_metrics(&stats.policy_metrics);
        }
    }

    /// Export results to a CSV file
    pub fn export_csv(&self, path: &Path) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_path(path)?;
        for (&policy, stats) in &self.stats {
            writer.serialize(CsvResultRow::from_stats(policy, stats))?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn print_two_queue_metrics(metrics: &BTreeMap<String, f64>) {
    let metric = |name: &str| metrics.get(name).copied().unwrap_or(0.0);

    println!("\n2Q segment metrics:");
    println!(
        "  probationary: {:.0}/{:.0} bytes, {:.0} entries, {:.0} hits, {:.0} evictions",
        metric("probationary_bytes"),
        metric("probationary_budget"),
        metric("probationary_len"),
        metric("probationary_hits"),
        metric("probationary_evictions"),
    );
    println!(
        "  protected:    {:.0}/{:.0} bytes, {:.0} entries, {:.0} hits, {:.0} evictions",
        metric("protected_bytes"),
        metric("protected_budget"),
        metric("protected_len"),
        metric("protected_hits"),
        metric("protected_evictions"),
    );
    println!(
        "  promotions: {:.0}, protection ratio: {:.2}",
        metric("total_promotions"),
        metric("protection_ratio"),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample_stats() -> SimulationStats {
        let mut stats = SimulationStats::new(&Policy::all());
        let mut two_queue = PolicyStats {
            hits: 6,
            misses: 4,
            bytes_hit: 600,
            bytes_miss: 400,
            ..PolicyStats::new()
        };
        two_queue
            .policy_metrics
            .insert("total_promotions".to_string(), 3.0);
        stats.record(Policy::TwoQueue, two_queue);
        stats.record(
            Policy::Lru,
            PolicyStats {
                hits: 2,
                misses: 8,
                ..PolicyStats::new()
            },
        );
        stats
    }

    #[test]
    fn test_result_carries_every_policy() {
        let result = sample_stats().result(Duration::from_millis(5), 7, 10, 1000);
        assert_eq!(result.stats.len(), 2);
        assert_eq!(result.total_requests, 10);
        assert_eq!(result.stats[&Policy::TwoQueue].hit_rate(), 60.0);

        let round_trip = SimulationStats::from_result(&result);
        assert_eq!(round_trip.stats[&Policy::Lru].hits, 2);
    }

    #[test]
    fn test_export_csv_writes_header_and_rows() {
        let path = std::env::temp_dir().join("twoq_stats_test_export.csv");
        sample_stats().export_csv(&path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("policy,hits,misses,hit_rate"));
        assert!(lines[1].starts_with("2Q,6,4,60.0"));
        assert!(lines[2].starts_with("LRU,2,8,20.0"));

        let _ = fs::remove_file(&path);
    }
}
