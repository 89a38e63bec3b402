//! Cache Configuration Module
//!
//! This module provides the configuration structure for the 2Q cache.
//!
//! # Design Philosophy
//!
//! The configuration struct has all public fields for simple instantiation:
//!
//! - **Simple**: Just create the struct with all fields set
//! - **Type safety**: `max_bytes` is a `NonZeroU64`, so a zero budget cannot be expressed
//! - **Checked ratios**: [`TwoQueueCacheConfig::validate`] rejects ratios outside (0, 1)
//!
//! Configuration is plain data. Nothing is read from files or the environment; the
//! embedding application decides where the numbers come from.
//!
//! # Examples
//!
//! ```
//! use twoq_cache::config::TwoQueueCacheConfig;
//! use twoq_cache::TwoQueueCache;
//! use core::num::NonZeroU64;
//!
//! let config = TwoQueueCacheConfig {
//!     max_bytes: NonZeroU64::new(10 * 1024 * 1024).unwrap(),
//!     probationary_ratio: 0.25,
//!     protected_ratio: 0.75,
//! };
//!
//! let cache: TwoQueueCache<String, Vec<u8>> = TwoQueueCache::init(config, None);
//! assert_eq!(cache.probationary_budget(), 10 * 1024 * 1024 / 4);
//! ```

pub mod two_queue;

pub use two_queue::{TwoQueueCacheConfig, DEFAULT_PROBATIONARY_RATIO, DEFAULT_PROTECTED_RATIO};
