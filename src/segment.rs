//! Cache Segments
//!
//! A 2Q cache is two [`Segment`]s sharing one set of rules for bookkeeping. Each
//! segment owns:
//!
//! - an ordered list of [`CacheEntry`] values (front to back),
//! - a hash index from key to list [`Handle`] for O(1) membership, and
//! - the running byte total of the entries it holds.
//!
//! The segment itself has no eviction policy. The cache decides which end to
//! insert at and which end to evict from:
//!
//! ```text
//! Probationary (FIFO):  front = oldest insert ........ back = newest insert
//!                       evict ◀── pop_front            push_back ◀── new keys
//!
//! Protected (LRU):      front = most recently used ... back = least recently used
//!                       push_front / move_to_front     pop_back ──▶ evict
//! ```
//!
//! Every method that adds or removes an entry updates the index and the byte total
//! in the same step, so `total_bytes()` always equals the sum of the stored sizes
//! of the entries in the list.

use crate::entry::{ByteLen, CacheEntry};
use crate::list::{self, Handle, List};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;
#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// Identifies one of the two segments of a 2Q cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// First-time entries, evicted in insertion order.
    Probationary,
    /// Entries that were touched again while probationary, evicted least recently used first.
    Protected,
}

impl SegmentKind {
    /// Lower-case name, used for metric keys and log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            SegmentKind::Probationary => "probationary",
            SegmentKind::Protected => "protected",
        }
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered, indexed, byte-accounted collection of cache entries.
pub(crate) struct Segment<K, V, S = DefaultHashBuilder> {
    kind: SegmentKind,
    entries: List<CacheEntry<K, V>>,
    index: HashMap<K, Handle, S>,
    total_bytes: u64,
}

impl<K, V, S> Segment<K, V, S> {
    /// Which segment this is.
    #[inline]
    pub(crate) fn kind(&self) -> SegmentKind {
        self.kind
    }

    /// Number of entries.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of the stored sizes of all entries.
    #[inline]
    pub(crate) fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Returns the entry behind `handle`.
    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> Option<&CacheEntry<K, V>> {
        self.entries.get(handle)
    }

    /// Returns the value behind `handle` for in-place mutation.
    ///
    /// The stored size is left untouched; resizing goes through `replace_value`.
    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> Option<&mut V> {
        self.entries.get_mut(handle).map(CacheEntry::value_mut)
    }

    /// Repositions an entry at the front without touching the index or totals.
    #[inline]
    pub(crate) fn move_to_front(&mut self, handle: Handle) -> bool {
        self.entries.move_to_front(handle)
    }

    /// Iterates keys from front to back.
    pub(crate) fn keys(&self) -> Keys<'_, K, V> {
        Keys {
            inner: self.entries.iter(),
        }
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> Segment<K, V, S> {
    /// Creates an empty segment.
    pub(crate) fn with_hasher(kind: SegmentKind, hash_builder: S) -> Self {
        Segment {
            kind,
            entries: List::new(),
            index: HashMap::with_hasher(hash_builder),
            total_bytes: 0,
        }
    }

    /// Returns the handle of `key` if this segment holds it.
    #[inline]
    pub(crate) fn lookup<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.index.get(key).copied()
    }

    /// Returns `true` if this segment holds `key`.
    #[inline]
    pub(crate) fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.index.contains_key(key)
    }

    /// Appends an entry at the back (newest end).
    pub(crate) fn push_back(&mut self, entry: CacheEntry<K, V>) -> Handle
    where
        K: Clone,
    {
        let key = entry.key().clone();
        self.total_bytes += entry.size();
        let handle = self.entries.push_back(entry);
        self.index.insert(key, handle);
        handle
    }

    /// Inserts an entry at the front (most recently used end).
    pub(crate) fn push_front(&mut self, entry: CacheEntry<K, V>) -> Handle
    where
        K: Clone,
    {
        let key = entry.key().clone();
        self.total_bytes += entry.size();
        let handle = self.entries.push_front(entry);
        self.index.insert(key, handle);
        handle
    }

    /// Removes and returns the entry at the front.
    pub(crate) fn pop_front(&mut self) -> Option<CacheEntry<K, V>> {
        let entry = self.entries.pop_front()?;
        self.forget(&entry);
        Some(entry)
    }

    /// Removes and returns the entry at the back.
    pub(crate) fn pop_back(&mut self) -> Option<CacheEntry<K, V>> {
        let entry = self.entries.pop_back()?;
        self.forget(&entry);
        Some(entry)
    }

    /// Removes the entry behind `handle`, wherever it sits in the list.
    pub(crate) fn remove(&mut self, handle: Handle) -> Option<CacheEntry<K, V>> {
        let entry = self.entries.remove(handle)?;
        self.forget(&entry);
        Some(entry)
    }

    /// Looks up `key` and removes its entry.
    pub(crate) fn take<Q>(&mut self, key: &Q) -> Option<CacheEntry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let handle = self.lookup(key)?;
        self.remove(handle)
    }

    /// Drops the index slot and byte share of an entry already unlinked from the list.
    fn forget(&mut self, entry: &CacheEntry<K, V>) {
        self.index.remove(entry.key());
        self.total_bytes = self.total_bytes.saturating_sub(entry.size());
    }

    /// Removes every entry and resets the byte total.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.total_bytes = 0;
    }
}

impl<K, V, S> Segment<K, V, S>
where
    K: Hash + Eq + ByteLen,
    V: ByteLen,
    S: BuildHasher,
{
    /// Swaps the value stored under `key`, moving the byte total by the size delta.
    ///
    /// Returns the entry's handle, the previous value and the new stored size. If
    /// the segment does not hold `key`, `value` is handed back untouched.
    pub(crate) fn replace_value<Q>(&mut self, key: &Q, value: V) -> Result<(Handle, V, u64), V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let found = self
            .lookup(key)
            .and_then(|handle| self.entries.get_mut(handle).map(|entry| (handle, entry)));
        let Some((handle, entry)) = found else {
            return Err(value);
        };
        let (old_value, old_size) = entry.replace_value(value);
        let new_size = entry.size();
        self.total_bytes = self.total_bytes.saturating_sub(old_size) + new_size;
        Ok((handle, old_value, new_size))
    }
}

impl<K, V, S> fmt::Debug for Segment<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("kind", &self.kind)
            .field("len", &self.entries.len())
            .field("total_bytes", &self.total_bytes)
            .finish()
    }
}

/// Iterator over the keys of one segment, in eviction order.
///
/// For the probationary segment the first key is the next to be evicted; for the
/// protected segment the first key is the most recently used and the last key is
/// the next to be evicted.
pub struct Keys<'a, K, V> {
    inner: list::Iter<'a, CacheEntry<K, V>>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(CacheEntry::key)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> fmt::Debug for Keys<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keys")
            .field("remaining", &self.inner.len())
            .finish()
    }
}
