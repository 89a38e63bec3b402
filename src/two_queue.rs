//! Two-Queue (2Q) Cache Implementation
//!
//! 2Q is a scan-resistant cache that only admits an entry into its main working set
//! after the entry has been seen twice. New keys land in a small **probationary**
//! segment; a second touch (a `get`, or a `put` for the same key) promotes the entry
//! into the **protected** segment. One-time traffic such as a sequential scan passes
//! through probationary and falls out again without disturbing the protected entries.
//!
//! # How the Algorithm Works
//!
//! ## Segment Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                                2Q Cache                                      │
//! │                                                                              │
//! │  ┌─────────────────────────────────────────────────────────────────────┐    │
//! │  │            PROTECTED SEGMENT (LRU, protected_ratio × max_bytes)      │    │
//! │  │  ┌─────────────────────────────────────────────────────────────┐   │    │
//! │  │  │ MRU ◀──▶ [hot_1] ◀──▶ [hot_2] ◀──▶ ... ◀──▶ [evict] LRU  │───┼──▶ on_evicted(k, v)
//! │  │  └─────────────────────────────────────────────────────────────┘   │    │
//! │  └─────────────────────────────────────────────────────────────────────┘    │
//! │                                              ▲ promote (second touch)       │
//! │                                              │                              │
//! │  ┌─────────────────────────────────────────────────────────────────────┐    │
//! │  │          PROBATIONARY SEGMENT (FIFO, probationary_ratio × max_bytes) │    │
//! │  │  ┌─────────────────────────────────────────────────────────────┐   │    │
//! │  │  │ oldest [evict] ◀──▶ [new_1] ◀──▶ ... ◀──▶ [new_n] newest    │───┼──▶ dropped silently
//! │  │  └─────────────────────────────────────────────────────────────┘   │    │
//! │  └─────────────────────────────────────────────────────────────────────┘    │
//! │                                                         ▲ insert            │
//! │                                                    new keys                 │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Entry Lifecycle
//!
//! 1. **Insert**: a new key is appended to the newest end of probationary.
//! 2. **Second touch**: the entry moves, value and size included, to the
//!    most-recently-used end of protected.
//! 3. **Further touches**: the entry moves back to the most-recently-used end.
//! 4. **Eviction**: after every `put`, protected is trimmed from its least recently
//!    used end until it fits its budget (invoking the eviction callback for each
//!    entry), then probationary is trimmed from its oldest end (no callback).
//!
//! Reading never evicts. A `get` that promotes a large entry can leave protected over
//! budget until the next `put` trims it.
//!
//! ## Byte Budgets
//!
//! Each segment has an independent budget carved from `max_bytes`:
//!
//! ```text
//! probationary budget = floor(probationary_ratio × max_bytes)
//! protected budget    = floor(protected_ratio    × max_bytes)
//! ```
//!
//! An entry's size is `key.byte_len() + value.byte_len()` (see [`ByteLen`]), recorded
//! when the entry is created and re-recorded when `put` replaces its value.
//!
//! ## Operations
//!
//! | Operation | Action | Time |
//! |-----------|--------|------|
//! | `get(key)` | Promote from probationary, or refresh in protected | O(1) |
//! | `put(key, value)` | Insert, promote or update, then trim both segments | O(1) amortized |
//! | `peek(key)` | Read without promotion or reordering | O(1) |
//! | `remove(key)` | Remove from whichever segment holds it | O(1) |
//!
//! # Example
//!
//! ```
//! use twoq_cache::TwoQueueCache;
//! use core::num::NonZeroU64;
//!
//! // 100 bytes: 35 for probationary, 65 for protected
//! let mut cache: TwoQueueCache<&str, &str> =
//!     TwoQueueCache::new(NonZeroU64::new(100).unwrap(), 0.35, 0.65);
//!
//! cache.put("a", "0123456789abcdefghi"); // 20 bytes
//! cache.put("b", "0123456789abcdefghi"); // 40 bytes > 35, "a" falls out
//! assert!(!cache.contains(&"a"));
//!
//! assert_eq!(cache.get(&"b"), Some(&"0123456789abcdefghi")); // promoted
//! assert_eq!(cache.protected_size(), 20);
//! assert_eq!(cache.probationary_size(), 0);
//! ```

extern crate alloc;

use crate::config::TwoQueueCacheConfig;
use crate::entry::{ByteLen, CacheEntry};
use crate::error::ConfigError;
use crate::list::Handle;
use crate::metrics::{CacheMetrics, TwoQueueCacheMetrics};
use crate::segment::{Keys, Segment, SegmentKind};
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::num::NonZeroU64;

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;

/// Callback invoked with each entry evicted from the protected segment.
///
/// It runs synchronously inside the evicting call, before the entry is dropped or
/// handed back to the caller.
pub type OnEvicted<K, V> = Box<dyn FnMut(&K, &V)>;

/// A byte-budgeted Two-Queue cache.
///
/// See the [module documentation](self) for the algorithm.
///
/// # Examples
///
/// ```
/// use twoq_cache::TwoQueueCache;
/// use twoq_cache::config::TwoQueueCacheConfig;
/// use core::num::NonZeroU64;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let evicted = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&evicted);
///
/// let config = TwoQueueCacheConfig {
///     max_bytes: NonZeroU64::new(100).unwrap(),
///     probationary_ratio: 0.5,
///     protected_ratio: 0.3,
/// };
/// let mut cache: TwoQueueCache<String, Vec<u8>> = TwoQueueCache::init(
///     config,
///     Some(Box::new(move |k: &String, _v: &Vec<u8>| sink.borrow_mut().push(k.clone()))),
/// );
///
/// // Two 20-byte entries, each touched twice: protected needs 40 > 30 bytes
/// for key in ["k1", "k2"] {
///     cache.put(key.to_string(), vec![0u8; 18]);
///     cache.get(key);
/// }
/// cache.put("k3".to_string(), vec![0u8; 18]);
///
/// assert_eq!(*evicted.borrow(), vec!["k1".to_string()]);
/// ```
pub struct TwoQueueCache<K, V, S = DefaultHashBuilder> {
    config: TwoQueueCacheConfig,

    /// First-time entries, FIFO
    probationary: Segment<K, V, S>,

    /// Entries seen at least twice, LRU with the most recent at the front
    protected: Segment<K, V, S>,

    probationary_budget: u64,
    protected_budget: u64,

    on_evicted: Option<OnEvicted<K, V>>,

    metrics: TwoQueueCacheMetrics,
}

impl<K, V, S> TwoQueueCache<K, V, S> {
    /// Returns the configuration the cache was built from.
    #[inline]
    pub fn config(&self) -> &TwoQueueCacheConfig {
        &self.config
    }

    /// Returns the number of entries across both segments.
    #[inline]
    pub fn len(&self) -> usize {
        self.probationary.len() + self.protected.len()
    }

    /// Returns `true` if the cache holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.probationary.is_empty() && self.protected.is_empty()
    }

    /// Returns the bytes currently held by both segments together.
    #[inline]
    pub fn current_size(&self) -> u64 {
        self.probationary.total_bytes() + self.protected.total_bytes()
    }

    /// Returns the overall byte budget.
    #[inline]
    pub fn max_size(&self) -> u64 {
        self.config.max_bytes.get()
    }

    /// Returns the bytes held by the probationary segment.
    #[inline]
    pub fn probationary_size(&self) -> u64 {
        self.probationary.total_bytes()
    }

    /// Returns the bytes held by the protected segment.
    #[inline]
    pub fn protected_size(&self) -> u64 {
        self.protected.total_bytes()
    }

    /// Returns the number of entries in the probationary segment.
    #[inline]
    pub fn probationary_len(&self) -> usize {
        self.probationary.len()
    }

    /// Returns the number of entries in the protected segment.
    #[inline]
    pub fn protected_len(&self) -> usize {
        self.protected.len()
    }

    /// Returns the byte budget of the probationary segment.
    #[inline]
    pub fn probationary_budget(&self) -> u64 {
        self.probationary_budget
    }

    /// Returns the byte budget of the protected segment.
    #[inline]
    pub fn protected_budget(&self) -> u64 {
        self.protected_budget
    }

    /// Iterates probationary keys from oldest to newest (next eviction first).
    pub fn probationary_keys(&self) -> Keys<'_, K, V> {
        self.probationary.keys()
    }

    /// Iterates protected keys from most to least recently used (next eviction last).
    pub fn protected_keys(&self) -> Keys<'_, K, V> {
        self.protected.keys()
    }

    /// Installs or replaces the eviction callback. `None` removes it.
    pub fn set_on_evicted(&mut self, on_evicted: Option<OnEvicted<K, V>>) {
        self.on_evicted = on_evicted;
    }

    /// Records a cache miss for metrics tracking.
    ///
    /// `get` only records hits, since the cache cannot know the size of an object it
    /// does not hold. Callers that want hit rates call this on every miss.
    #[inline]
    pub fn record_miss(&mut self, object_size: u64) {
        self.metrics.record_miss(object_size);
    }

    fn sync_segment_metrics(&mut self) {
        self.metrics.update_segment_sizes(
            (self.probationary.total_bytes(), self.probationary.len() as u64),
            (self.protected.total_bytes(), self.protected.len() as u64),
        );
    }
}

impl<K: Hash + Eq, V, S: BuildHasher + Clone> TwoQueueCache<K, V, S> {
    /// Creates a cache with a custom hash builder, validating the configuration.
    pub fn try_with_hasher(
        config: TwoQueueCacheConfig,
        on_evicted: Option<OnEvicted<K, V>>,
        hash_builder: S,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let probationary_budget = config.probationary_budget();
        let protected_budget = config.protected_budget();
        Ok(TwoQueueCache {
            config,
            probationary: Segment::with_hasher(SegmentKind::Probationary, hash_builder.clone()),
            protected: Segment::with_hasher(SegmentKind::Protected, hash_builder),
            probationary_budget,
            protected_budget,
            on_evicted,
            metrics: TwoQueueCacheMetrics::new(
                config.max_bytes.get(),
                probationary_budget,
                protected_budget,
            ),
        })
    }

    /// Creates a cache with a custom hash builder.
    ///
    /// # Panics
    ///
    /// Panics if either ratio is outside (0, 1). Use [`try_with_hasher`](Self::try_with_hasher)
    /// to handle that as an error.
    pub fn with_hasher(
        config: TwoQueueCacheConfig,
        on_evicted: Option<OnEvicted<K, V>>,
        hash_builder: S,
    ) -> Self {
        match Self::try_with_hasher(config, on_evicted, hash_builder) {
            Ok(cache) => cache,
            Err(err) => panic!("invalid 2Q cache configuration: {err}"),
        }
    }
}

impl<K: Hash + Eq, V> TwoQueueCache<K, V> {
    /// Creates a cache from a configuration, validating it first.
    ///
    /// # Example
    ///
    /// ```
    /// use twoq_cache::TwoQueueCache;
    /// use twoq_cache::config::TwoQueueCacheConfig;
    /// use core::num::NonZeroU64;
    ///
    /// let config = TwoQueueCacheConfig::with_default_ratios(NonZeroU64::new(4096).unwrap());
    /// let cache: TwoQueueCache<String, String> = TwoQueueCache::try_init(config, None).unwrap();
    /// assert_eq!(cache.protected_budget(), 2662);
    /// ```
    pub fn try_init(
        config: TwoQueueCacheConfig,
        on_evicted: Option<OnEvicted<K, V>>,
    ) -> Result<Self, ConfigError> {
        Self::try_with_hasher(config, on_evicted, DefaultHashBuilder::default())
    }

    /// Creates a cache from a configuration.
    ///
    /// # Panics
    ///
    /// Panics if either ratio is outside (0, 1).
    pub fn init(config: TwoQueueCacheConfig, on_evicted: Option<OnEvicted<K, V>>) -> Self {
        Self::with_hasher(config, on_evicted, DefaultHashBuilder::default())
    }

    /// Creates a cache without an eviction callback.
    ///
    /// This is a convenience constructor. For more control, use [`TwoQueueCache::init`].
    ///
    /// # Panics
    ///
    /// Panics if either ratio is outside (0, 1).
    pub fn new(max_bytes: NonZeroU64, probationary_ratio: f64, protected_ratio: f64) -> Self {
        Self::init(
            TwoQueueCacheConfig {
                max_bytes,
                probationary_ratio,
                protected_ratio,
            },
            None,
        )
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> TwoQueueCache<K, V, S> {
    /// Returns a reference to the value for `key` without promoting or reordering it.
    ///
    /// Metrics are not updated.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if let Some(handle) = self.protected.lookup(key) {
            return self.protected.get(handle).map(CacheEntry::value);
        }
        let handle = self.probationary.lookup(key)?;
        self.probationary.get(handle).map(CacheEntry::value)
    }

    /// Returns `true` if either segment holds `key`. Does not promote.
    #[inline]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.protected.contains(key) || self.probationary.contains(key)
    }

    /// Returns the segment currently holding `key`.
    pub fn segment_of<Q>(&self, key: &Q) -> Option<SegmentKind>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.protected.contains(key) {
            Some(self.protected.kind())
        } else if self.probationary.contains(key) {
            Some(self.probationary.kind())
        } else {
            None
        }
    }

    /// Removes `key` from whichever segment holds it and returns its value.
    ///
    /// The eviction callback is not invoked.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let entry = match self.protected.take(key) {
            Some(entry) => entry,
            None => self.probationary.take(key)?,
        };
        self.sync_segment_metrics();
        Some(entry.into_parts().1)
    }

    /// Removes every entry. The eviction callback is not invoked.
    pub fn clear(&mut self) {
        self.probationary.clear();
        self.protected.clear();
        self.sync_segment_metrics();
    }

    /// Evicts the least recently used protected entry, invoking the eviction callback.
    ///
    /// Returns the evicted pair, or `None` if protected is empty.
    pub fn remove_protected_oldest(&mut self) -> Option<(K, V)> {
        let entry = self.evict_protected()?;
        self.sync_segment_metrics();
        Some(entry.into_parts())
    }

    /// Evicts the oldest probationary entry. The eviction callback is not invoked.
    ///
    /// Returns the evicted pair, or `None` if probationary is empty.
    pub fn remove_probationary_oldest(&mut self) -> Option<(K, V)> {
        let entry = self.evict_probationary()?;
        self.sync_segment_metrics();
        Some(entry.into_parts())
    }

    fn evict_protected(&mut self) -> Option<CacheEntry<K, V>> {
        let entry = self.protected.pop_back()?;
        trace_event!(
            segment = "protected",
            size = entry.size(),
            "evicted least recently used entry"
        );
        self.metrics.record_protected_eviction(entry.size());
        if let Some(on_evicted) = self.on_evicted.as_mut() {
            on_evicted(entry.key(), entry.value());
            self.metrics.record_callback();
        }
        Some(entry)
    }

    fn evict_probationary(&mut self) -> Option<CacheEntry<K, V>> {
        let entry = self.probationary.pop_front()?;
        trace_event!(
            segment = "probationary",
            size = entry.size(),
            "evicted oldest entry"
        );
        self.metrics.record_probationary_eviction(entry.size());
        Some(entry)
    }

    /// Trims protected, then probationary, until each fits its budget.
    fn enforce_budgets(&mut self) {
        while self.protected.total_bytes() > self.protected_budget {
            if self.evict_protected().is_none() {
                break;
            }
        }
        while self.probationary.total_bytes() > self.probationary_budget {
            if self.evict_probationary().is_none() {
                break;
            }
        }
    }
}

impl<K: Hash + Eq + Clone, V, S: BuildHasher> TwoQueueCache<K, V, S> {
    /// Returns a reference to the value for `key`.
    ///
    /// The key may be any borrowed form of the cache's key type, but
    /// [`Hash`] and [`Eq`] on the borrowed form *must* match those for
    /// the key type.
    ///
    /// A protected entry becomes the most recently used one. A probationary entry is
    /// promoted to the most-recently-used end of protected. Nothing is evicted.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let handle = self.touch(key)?;
        self.protected.get(handle).map(CacheEntry::value)
    }

    /// Returns a mutable reference to the value for `key`, with the same promotion
    /// rules as [`get`](Self::get).
    ///
    /// The entry keeps the size recorded by its last `put`; to change how many bytes
    /// an entry is accounted for, `put` a new value.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let handle = self.touch(key)?;
        self.protected.get_mut(handle)
    }

    /// Finds `key`, records the hit and leaves the entry at the front of protected.
    fn touch<Q>(&mut self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if let Some(handle) = self.protected.lookup(key) {
            self.protected.move_to_front(handle);
            let size = self.protected.get(handle).map_or(0, CacheEntry::size);
            self.metrics.record_protected_hit(size);
            return Some(handle);
        }
        let entry = self.probationary.take(key)?;
        self.metrics.record_probationary_hit(entry.size());
        Some(self.promote(entry))
    }

    fn promote(&mut self, entry: CacheEntry<K, V>) -> Handle {
        trace_event!(size = entry.size(), "promoted entry to protected");
        self.metrics.record_promotion();
        let handle = self.protected.push_front(entry);
        self.sync_segment_metrics();
        handle
    }
}

impl<K, V, S> TwoQueueCache<K, V, S>
where
    K: Hash + Eq + Clone + ByteLen,
    V: ByteLen,
    S: BuildHasher,
{
    /// Inserts or updates `key`, then trims both segments to their budgets.
    ///
    /// - A protected key becomes the most recently used entry and takes the new value.
    /// - A probationary key is promoted to protected with the new value.
    /// - A new key is appended to probationary.
    ///
    /// Returns the replaced value if the key was present. Replaced values never reach
    /// the eviction callback; entries trimmed from protected always do.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let replaced = match self.protected.replace_value(&key, value) {
            Ok((handle, old_value, new_size)) => {
                self.protected.move_to_front(handle);
                self.metrics.record_update(new_size);
                Some(old_value)
            }
            Err(value) => match self.probationary.take(&key) {
                Some(mut entry) => {
                    let (old_value, _) = entry.replace_value(value);
                    self.metrics.record_write(entry.size());
                    self.promote(entry);
                    Some(old_value)
                }
                None => {
                    let entry = CacheEntry::new(key, value);
                    self.metrics.record_write(entry.size());
                    self.probationary.push_back(entry);
                    None
                }
            },
        };

        self.enforce_budgets();
        self.sync_segment_metrics();
        replaced
    }
}

impl<K, V, S> CacheMetrics for TwoQueueCache<K, V, S> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.metrics.metrics()
    }

    fn algorithm_name(&self) -> &'static str {
        self.metrics.algorithm_name()
    }
}

impl<K, V, S> fmt::Debug for TwoQueueCache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwoQueueCache")
            .field("max_bytes", &self.config.max_bytes)
            .field("probationary", &self.probationary)
            .field("probationary_budget", &self.probationary_budget)
            .field("protected", &self.protected)
            .field("protected_budget", &self.protected_budget)
            .field("on_evicted", &self.on_evicted.is_some())
            .finish()
    }
}
