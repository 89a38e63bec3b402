#![no_std]
extern crate alloc;
extern crate twoq_cache;

use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::Cell;
use core::num::NonZeroU64;
use twoq_cache::config::TwoQueueCacheConfig;
use twoq_cache::{ByteLen, SegmentKind, TwoQueueCache};

// Helper to create a cache with the init pattern
fn make_cache<K, V>(max_bytes: u64) -> TwoQueueCache<K, V>
where
    K: core::hash::Hash + Eq,
{
    let config = TwoQueueCacheConfig {
        max_bytes: NonZeroU64::new(max_bytes).unwrap(),
        probationary_ratio: 0.5,
        protected_ratio: 0.5,
    };
    TwoQueueCache::init(config, None)
}

/// A value type that reports a declared size instead of its memory footprint.
struct Blob {
    declared: usize,
}

impl ByteLen for Blob {
    fn byte_len(&self) -> usize {
        self.declared
    }
}

#[test]
fn test_two_queue_in_no_std() {
    let mut cache = make_cache(40);

    // Using String as it requires the alloc crate
    let key1 = String::from("key1");
    let key2 = String::from("key2");
    let key3 = String::from("key3");

    cache.put(key1.clone(), vec![1u8; 6]);
    cache.put(key2.clone(), vec![2u8; 6]);
    assert_eq!(cache.probationary_size(), 20);

    // promote key1
    assert_eq!(cache.get(&key1), Some(&vec![1u8; 6]));
    assert_eq!(cache.segment_of(&key1), Some(SegmentKind::Protected));

    // key3 pushes probationary to 20 bytes again, key2 stays
    cache.put(key3.clone(), vec![3u8; 6]);
    assert!(cache.contains(&key2));

    // a fourth entry overflows probationary, key2 is the oldest
    cache.put(String::from("key4"), vec![4u8; 6]);
    assert!(!cache.contains(&key2));
    assert!(cache.contains(&key1));
    assert!(cache.contains(&key3));
}

#[test]
fn test_custom_byte_len_in_no_std() {
    let mut cache: TwoQueueCache<String, Blob> = make_cache(100);
    cache.put(String::from("a"), Blob { declared: 29 });
    assert_eq!(cache.current_size(), 30);

    cache.put(String::from("b"), Blob { declared: 29 });
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.probationary_keys().next().map(String::as_str), Some("b"));
}

#[test]
fn test_callback_in_no_std() {
    let count = Rc::new(Cell::new(0u32));
    let sink = Rc::clone(&count);

    let config = TwoQueueCacheConfig {
        max_bytes: NonZeroU64::new(100).unwrap(),
        probationary_ratio: 0.5,
        protected_ratio: 0.2,
    };
    let mut cache: TwoQueueCache<String, String> = TwoQueueCache::init(
        config,
        Some(Box::new(move |_k: &String, _v: &String| sink.set(sink.get() + 1))),
    );

    let keys: Vec<String> = (0..4).map(|i| format!("key{i}")).collect();
    for key in &keys {
        cache.put(key.clone(), String::from("123456"));
        cache.get(key);
    }
    // the last get leaves protected over budget until the next put
    cache.put(String::from("tail"), String::new());

    // key0 went on the put of key3, key1 on the put of "tail"
    assert_eq!(count.get(), 2);
    assert_eq!(cache.protected_len(), 2);
    assert_eq!(cache.peek(&keys[3]).map(String::len), Some(6));
}
