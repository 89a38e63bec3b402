//! Error types.
//!
//! The cache operations themselves never fail: a miss is reported as `None` and
//! eviction always makes progress. The only fallible step is construction, where
//! [`TwoQueueCacheConfig::validate`](crate::config::TwoQueueCacheConfig::validate)
//! rejects segment ratios that cannot describe a byte budget.
//!
//! ```
//! use twoq_cache::config::TwoQueueCacheConfig;
//! use twoq_cache::TwoQueueCache;
//! use core::num::NonZeroU64;
//!
//! let config = TwoQueueCacheConfig {
//!     max_bytes: NonZeroU64::new(1024).unwrap(),
//!     probationary_ratio: 1.5,
//!     protected_ratio: 0.5,
//! };
//! let err = TwoQueueCache::<String, String>::try_init(config, None).unwrap_err();
//! assert!(err.to_string().contains("probationary_ratio"));
//! ```

extern crate alloc;

use alloc::string::String;
use core::fmt;

/// Returned when cache configuration parameters are invalid.
///
/// Carries a human-readable description of which parameter failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::string::ToString;

    #[test]
    fn test_display_shows_message() {
        let err = ConfigError::new("protected_ratio must be in (0, 1)");
        assert_eq!(err.to_string(), "protected_ratio must be in (0, 1)");
    }

    #[test]
    fn test_debug_includes_message() {
        let err = ConfigError::new("bad ratio");
        assert!(format!("{:?}", err).contains("bad ratio"));
    }

    #[test]
    fn test_message_accessor_and_eq() {
        let a = ConfigError::new("x");
        assert_eq!(a.message(), "x");
        assert_eq!(a.clone(), a);
    }
}
