//! Cache Entry and Size Accounting
//!
//! Every value stored in a [`TwoQueueCache`](crate::TwoQueueCache) reports its own
//! byte length through the [`ByteLen`] trait. Keys report theirs the same way, and an
//! entry's accounted size is the sum of the two:
//!
//! ```text
//! entry.size = key.byte_len() + value.byte_len()
//! ```
//!
//! The size is captured when the entry is created and again whenever its value is
//! replaced. Segment byte totals are always adjusted by this stored figure, so a value
//! whose `byte_len()` changes while it sits in the cache cannot push the totals out of
//! step with the entries they describe.
//!
//! # Implementing `ByteLen`
//!
//! ```
//! use twoq_cache::entry::ByteLen;
//!
//! struct Thumbnail {
//!     pixels: Vec<u8>,
//!     caption: String,
//! }
//!
//! impl ByteLen for Thumbnail {
//!     fn byte_len(&self) -> usize {
//!         self.pixels.len() + self.caption.len()
//!     }
//! }
//!
//! let t = Thumbnail { pixels: vec![0; 64], caption: "cat".to_string() };
//! assert_eq!(t.byte_len(), 67);
//! ```

extern crate alloc;

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// Reports how many bytes a key or value occupies for budget accounting.
///
/// Implementations must be stable: the same instance should report the same length
/// for as long as it is stored in the cache.
pub trait ByteLen {
    /// Returns the size of this value in bytes.
    fn byte_len(&self) -> usize;
}

impl ByteLen for str {
    #[inline]
    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl ByteLen for [u8] {
    #[inline]
    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl ByteLen for String {
    #[inline]
    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl ByteLen for Vec<u8> {
    #[inline]
    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl<const N: usize> ByteLen for [u8; N] {
    #[inline]
    fn byte_len(&self) -> usize {
        N
    }
}

impl<T: ByteLen + ?Sized> ByteLen for &T {
    #[inline]
    fn byte_len(&self) -> usize {
        (**self).byte_len()
    }
}

impl<T: ByteLen + ?Sized> ByteLen for Box<T> {
    #[inline]
    fn byte_len(&self) -> usize {
        (**self).byte_len()
    }
}

impl<T: ByteLen + ?Sized> ByteLen for Rc<T> {
    #[inline]
    fn byte_len(&self) -> usize {
        (**self).byte_len()
    }
}

/// Computes the accounted size of a key/value pair.
#[inline]
pub(crate) fn entry_size<K: ByteLen + ?Sized, V: ByteLen + ?Sized>(key: &K, value: &V) -> u64 {
    key.byte_len() as u64 + value.byte_len() as u64
}

/// A key/value pair together with its accounted size.
///
/// An entry belongs to exactly one segment at a time. Promotion moves the entry
/// itself, so the key, value and size travel together.
///
/// # Examples
///
/// ```
/// use twoq_cache::entry::CacheEntry;
///
/// let entry = CacheEntry::new("user:1".to_string(), "alice".to_string());
/// assert_eq!(entry.size(), 11);
/// ```
pub struct CacheEntry<K, V> {
    key: K,
    value: V,
    size: u64,
}

impl<K: ByteLen, V: ByteLen> CacheEntry<K, V> {
    /// Creates an entry, measuring the key and value.
    #[inline]
    pub fn new(key: K, value: V) -> Self {
        let size = entry_size(&key, &value);
        Self { key, value, size }
    }

    /// Swaps in a new value and re-measures the entry.
    ///
    /// Returns the previous value and the previous size.
    #[inline]
    pub fn replace_value(&mut self, value: V) -> (V, u64) {
        let old_size = self.size;
        self.size = entry_size(&self.key, &value);
        let old_value = core::mem::replace(&mut self.value, value);
        (old_value, old_size)
    }
}

impl<K, V> CacheEntry<K, V> {
    /// Returns the key.
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Returns the value.
    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Returns the value for in-place mutation. The recorded size is not re-measured.
    #[inline]
    pub(crate) fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// Returns the size recorded for this entry, in bytes.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Consumes the entry and returns its key and value.
    #[inline]
    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K: Clone, V: Clone> Clone for CacheEntry<K, V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            value: self.value.clone(),
            size: self.size,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for CacheEntry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("size", &self.size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::string::ToString;
    use alloc::vec;

    #[test]
    fn test_builtin_byte_lengths() {
        assert_eq!("héllo".byte_len(), 6);
        assert_eq!(String::from("abc").byte_len(), 3);
        assert_eq!(vec![0u8; 7].byte_len(), 7);
        assert_eq!([1u8, 2, 3, 4].byte_len(), 4);
        assert_eq!((&b"xy"[..]).byte_len(), 2);
        assert_eq!(Box::<str>::from("four").byte_len(), 4);
        assert_eq!(Rc::new(String::from("rc")).byte_len(), 2);
    }

    #[test]
    fn test_new_entry_measures_key_and_value() {
        let entry = CacheEntry::new("key", "value");
        assert_eq!(*entry.key(), "key");
        assert_eq!(*entry.value(), "value");
        assert_eq!(entry.size(), 8);
    }

    #[test]
    fn test_replace_value_remeasures() {
        let mut entry = CacheEntry::new("k".to_string(), vec![0u8; 10]);
        assert_eq!(entry.size(), 11);

        let (old, old_size) = entry.replace_value(vec![1u8; 3]);
        assert_eq!(old.len(), 10);
        assert_eq!(old_size, 11);
        assert_eq!(entry.size(), 4);
        assert_eq!(entry.value(), &vec![1u8; 3]);
    }

    #[test]
    fn test_into_parts() {
        let entry = CacheEntry::new("a".to_string(), "b".to_string());
        let (k, v) = entry.into_parts();
        assert_eq!(k, "a");
        assert_eq!(v, "b");
    }

    #[test]
    fn test_clone_and_debug() {
        let entry = CacheEntry::new("key", "v");
        let cloned = entry.clone();
        assert_eq!(cloned.size(), entry.size());
        let debug_str = format!("{:?}", entry);
        assert!(debug_str.contains("CacheEntry"));
        assert!(debug_str.contains("key"));
    }
}
