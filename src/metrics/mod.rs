//! Cache metrics.
//!
//! [`TwoQueueCacheMetrics`] counts what the cache does: hits per segment, misses
//! reported by the caller, promotions, evictions per segment and callback
//! invocations. It also mirrors the byte occupancy of both segments. Reports go
//! through the [`CacheMetrics`] trait.
//!
//! Metrics are the crate's observability surface: the library is `no_std` and
//! does not log unless the `tracing` feature is enabled.
//!
//! # Ordering
//!
//! Reports are `BTreeMap<String, f64>` so keys always come out sorted. The simulator
//! prints and exports them as-is, and two runs over the same trace produce
//! byte-identical output.

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::string::String;

pub mod two_queue;

pub use two_queue::TwoQueueCacheMetrics;

/// A metrics source that can be reported without knowing its concrete type.
///
/// The trace simulator and the demo use this to print and export a cache's
/// counters next to those of other policies.
pub trait CacheMetrics {
    /// Every metric as a name/value pair, sorted by name.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Short policy name used as the row label in reports, e.g. `"2Q"`.
    fn algorithm_name(&self) -> &'static str;
}

/// `numerator / denominator`, or 0.0 when nothing has been counted yet.
#[inline]
pub(crate) fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_of_empty_denominator_is_zero() {
        assert_eq!(ratio(5, 0), 0.0);
        assert_eq!(ratio(0, 0), 0.0);
        assert_eq!(ratio(1, 4), 0.25);
    }
}
