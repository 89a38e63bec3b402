#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## At a Glance
//!
//! ```text
//! ┌──────────────────────────────┐      second touch      ┌──────────────────────────────┐
//! │ probationary (FIFO)          │ ─────────────────────▶ │ protected (LRU)              │
//! │ new keys, scan traffic       │      get / put         │ working set                  │
//! │ overflow: dropped silently   │                        │ overflow: on_evicted(k, v)   │
//! └──────────────────────────────┘                        └──────────────────────────────┘
//! ```
//!
//! | Operation | Time | Evicts? | Callback? |
//! |-----------|------|---------|-----------|
//! | `get` | O(1) | never | never |
//! | `put` | O(1) amortized | both segments, protected first | protected evictions only |
//! | `remove` / `clear` | O(1) / O(n) | no | no |
//! | `remove_protected_oldest` | O(1) | one protected entry | yes |
//! | `remove_probationary_oldest` | O(1) | one probationary entry | no |
//!
//! ## Code Examples
//!
//! ### Basic use
//!
//! ```rust
//! use twoq_cache::TwoQueueCache;
//! use core::num::NonZeroU64;
//!
//! let mut cache: TwoQueueCache<String, Vec<u8>> =
//!     TwoQueueCache::new(NonZeroU64::new(1024).unwrap(), 0.25, 0.75);
//!
//! cache.put("page:1".to_string(), vec![0u8; 100]);
//! assert_eq!(cache.probationary_len(), 1);
//!
//! // second touch promotes
//! assert!(cache.get("page:1").is_some());
//! assert_eq!(cache.protected_len(), 1);
//! ```
//!
//! ### Eviction callback
//!
//! ```rust
//! use twoq_cache::{OnEvicted, TwoQueueCache};
//! use twoq_cache::config::TwoQueueCacheConfig;
//! use core::num::NonZeroU64;
//!
//! let on_evicted: OnEvicted<String, String> =
//!     Box::new(|key: &String, _value: &String| println!("evicted {key}"));
//!
//! let config = TwoQueueCacheConfig::with_default_ratios(NonZeroU64::new(64 * 1024).unwrap());
//! let mut cache = TwoQueueCache::init(config, Some(on_evicted));
//! cache.put("k".to_string(), "v".to_string());
//! ```
//!
//! ### Metrics
//!
//! ```rust
//! use twoq_cache::TwoQueueCache;
//! use twoq_cache::metrics::CacheMetrics;
//! use core::num::NonZeroU64;
//!
//! let mut cache: TwoQueueCache<&str, &str> =
//!     TwoQueueCache::new(NonZeroU64::new(100).unwrap(), 0.5, 0.5);
//! cache.put("a", "1");
//! cache.get(&"a");
//!
//! let metrics = cache.metrics();
//! assert_eq!(metrics["total_promotions"], 1.0);
//! assert_eq!(cache.algorithm_name(), "2Q");
//! ```
//!
//! ## Modules
//!
//! - [`two_queue`]: The 2Q cache
//! - [`segment`]: Segment identifiers and key iterators
//! - [`entry`]: Entries and the [`ByteLen`] size trait
//! - [`config`]: Configuration structure and default ratios
//! - [`error`]: Configuration errors
//! - [`metrics`]: Metrics collection for cache performance monitoring
//!
//! ## Features
//!
//! - `hashbrown` (default): use `hashbrown` for the segment indexes.
//! - `std`: implement `std::error::Error` for [`ConfigError`].
//! - `tracing`: emit `trace`-level events for promotions and evictions.
//! - `nightly`: enable `hashbrown`'s nightly optimizations.

#![no_std]

extern crate alloc;

#[cfg(any(feature = "std", not(feature = "hashbrown")))]
extern crate std;

#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($($arg:tt)*) => {
        ::tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($($arg:tt)*) => {};
}

/// Cache entries and byte-length accounting.
///
/// Provides [`CacheEntry`], which pairs a key and value with the size recorded
/// for it, and the [`ByteLen`] trait keys and values implement.
pub mod entry;

/// Arena-backed doubly linked list.
///
/// Internal infrastructure: stores nodes in a slot arena addressed by stable
/// handles so segments can reorder entries in O(1) without raw pointers.
pub(crate) mod list;

/// Indexed, byte-accounted segments.
pub mod segment;

/// Cache configuration structures.
pub mod config;

/// Configuration errors.
pub mod error;

/// Two-Queue (2Q) cache implementation.
///
/// Provides a byte-budgeted cache with a FIFO probationary segment for new keys and
/// an LRU protected segment for keys seen at least twice.
pub mod two_queue;

/// Cache metrics system.
///
/// Provides metrics collection and reporting with deterministic key ordering.
pub mod metrics;

pub use two_queue::{OnEvicted, TwoQueueCache};

pub use config::TwoQueueCacheConfig;
pub use entry::{ByteLen, CacheEntry};
pub use error::ConfigError;
pub use segment::{Keys, SegmentKind};
