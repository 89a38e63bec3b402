//! Configuration for the 2Q cache.
//!
//! # Sizing Guidelines
//!
//! A 2Q cache is bounded purely by bytes. `max_bytes` is the overall memory budget
//! for cached content (key bytes plus value bytes, as reported by
//! [`ByteLen`](crate::entry::ByteLen)), and each segment receives an independent
//! slice of it:
//!
//! ```text
//! probationary budget = floor(probationary_ratio × max_bytes)
//! protected budget    = floor(protected_ratio    × max_bytes)
//! ```
//!
//! The product is taken as written in decimal, so `0.57 × 100` gives a budget of 57
//! even though the nearest `f64` to 0.57 is slightly smaller.
//!
//! The ratios do not have to add up to 1. A sum below 1 leaves headroom that neither
//! segment may use; a sum above 1 overcommits `max_bytes`.
//!
//! ## Choosing the ratios
//!
//! - **Small probationary share (0.2 – 0.35)**: one-time traffic is flushed quickly,
//!   leaving most of the budget to the proven working set. Items need to be touched
//!   again soon after insertion to be promoted.
//! - **Large probationary share (0.5+)**: a longer admission window, at the cost of
//!   letting more scan traffic occupy memory.
//!
//! The defaults are 0.35 probationary and 0.65 protected.
//!
//! Per-entry bookkeeping (hash index slot, list links, stored size) is not counted
//! against the budget:
//!
//! ```text
//! Total Memory ≈ max_bytes + (entries × overhead_per_entry)
//! overhead_per_entry ≈ 48-96 bytes (index, links, size)
//! ```
//!
//! # Examples
//!
//! ```
//! use twoq_cache::config::TwoQueueCacheConfig;
//! use twoq_cache::TwoQueueCache;
//! use core::num::NonZeroU64;
//!
//! // 64MB budget, default 35/65 split
//! let config = TwoQueueCacheConfig::with_default_ratios(NonZeroU64::new(64 * 1024 * 1024).unwrap());
//! let cache: TwoQueueCache<String, Vec<u8>> = TwoQueueCache::init(config, None);
//! assert_eq!(cache.max_size(), 64 * 1024 * 1024);
//! ```

use crate::error::ConfigError;
use alloc::format;
use core::fmt;
use core::num::NonZeroU64;

/// Probationary share used by [`TwoQueueCacheConfig::with_default_ratios`].
pub const DEFAULT_PROBATIONARY_RATIO: f64 = 0.35;

/// Protected share used by [`TwoQueueCacheConfig::with_default_ratios`].
pub const DEFAULT_PROTECTED_RATIO: f64 = 0.65;

/// Configuration for a 2Q cache.
///
/// # Fields
///
/// - `max_bytes`: Overall byte budget the two segment budgets are carved from.
/// - `probationary_ratio`: Share of `max_bytes` for first-time entries. Must be in (0, 1).
/// - `protected_ratio`: Share of `max_bytes` for entries seen twice. Must be in (0, 1).
///
/// # Examples
///
/// ```
/// use twoq_cache::config::TwoQueueCacheConfig;
/// use core::num::NonZeroU64;
///
/// let config = TwoQueueCacheConfig {
///     max_bytes: NonZeroU64::new(100).unwrap(),
///     probationary_ratio: 0.25,
///     protected_ratio: 0.75,
/// };
/// assert!(config.validate().is_ok());
/// assert_eq!(config.probationary_budget(), 25);
/// assert_eq!(config.protected_budget(), 75);
/// ```
#[derive(Clone, Copy, PartialEq)]
pub struct TwoQueueCacheConfig {
    /// Overall byte budget.
    pub max_bytes: NonZeroU64,
    /// Fraction of `max_bytes` reserved for the probationary (FIFO) segment.
    pub probationary_ratio: f64,
    /// Fraction of `max_bytes` reserved for the protected (LRU) segment.
    pub protected_ratio: f64,
}

impl TwoQueueCacheConfig {
    /// Creates a configuration with the default 35/65 split.
    pub fn with_default_ratios(max_bytes: NonZeroU64) -> Self {
        Self {
            max_bytes,
            probationary_ratio: DEFAULT_PROBATIONARY_RATIO,
            protected_ratio: DEFAULT_PROTECTED_RATIO,
        }
    }

    /// Checks that both ratios are finite and strictly between 0 and 1.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_ratio("probationary_ratio", self.probationary_ratio)?;
        check_ratio("protected_ratio", self.protected_ratio)
    }

    /// Byte ceiling of the probationary segment.
    #[inline]
    pub fn probationary_budget(&self) -> u64 {
        budget(self.probationary_ratio, self.max_bytes)
    }

    /// Byte ceiling of the protected segment.
    #[inline]
    pub fn protected_budget(&self) -> u64 {
        budget(self.protected_ratio, self.max_bytes)
    }
}

fn check_ratio(name: &str, ratio: f64) -> Result<(), ConfigError> {
    if ratio.is_finite() && ratio > 0.0 && ratio < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::new(format!(
            "{name} must be a finite value in (0, 1), got {ratio}"
        )))
    }
}

// `total > ratio * max` and `total > floor(ratio * max)` agree for integer totals.
// Decimal ratios are not exact in binary (0.57 * 100 = 56.99999999999999), so a
// product within a few ulps below the next integer is taken as that integer.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn budget(ratio: f64, max_bytes: NonZeroU64) -> u64 {
    let exact = ratio * max_bytes.get() as f64;
    let floor = exact as u64;
    let gap = floor.saturating_add(1) as f64 - exact;
    if gap > 0.0 && gap <= exact * 8.0 * f64::EPSILON {
        floor + 1
    } else {
        floor
    }
}

impl fmt::Debug for TwoQueueCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwoQueueCacheConfig")
            .field("max_bytes", &self.max_bytes)
            .field("probationary_ratio", &self.probationary_ratio)
            .field("protected_ratio", &self.protected_ratio)
            .finish()
    }
}
