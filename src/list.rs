//! Arena-backed doubly linked list.
//!
//! Nodes live in a `Vec` and link to each other through slot indices instead of
//! raw pointers. A [`Handle`] stays valid from the moment a value is pushed until
//! it is removed, so callers can keep handles in a hash index and splice nodes in
//! O(1) without any `unsafe`.
//!
//! Freed slots go on a free list and are reused by later pushes. The list does not
//! detect stale handles: using a handle after its node was removed is a logic error
//! (it may address whatever value reused the slot). The cache never does this
//! because it drops a key's handle in the same step that removes the node.
//!
//! ```text
//!   head                                     tail
//!    │                                         │
//!    ▼                                         ▼
//!  [slot 3] ◀──▶ [slot 0] ◀──▶ [slot 5] ◀──▶ [slot 1]
//!   front                                    back
//! ```

extern crate alloc;

use alloc::vec::Vec;
use core::fmt;

/// Stable reference to a node inside a [`List`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(usize);

/// A slot in the arena. `val` is `None` while the slot sits on the free list.
struct Node<T> {
    val: Option<T>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// A doubly linked list whose nodes are stored in a slot arena.
///
/// # Examples
///
/// ```ignore
/// use twoq_cache::list::List;
///
/// let mut list = List::new();
/// let a = list.push_back("a");
/// list.push_back("b");
/// list.move_to_front(a);
/// assert_eq!(list.pop_back(), Some("b"));
/// ```
pub struct List<T> {
    nodes: Vec<Node<T>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> List<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty list with room for `capacity` nodes before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        List {
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Returns the number of values in the list.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the list contains no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the handle of the first (front) node.
    #[inline]
    pub fn front(&self) -> Option<Handle> {
        self.head.map(Handle)
    }

    /// Returns the handle of the last (back) node.
    #[inline]
    pub fn back(&self) -> Option<Handle> {
        self.tail.map(Handle)
    }

    /// Returns a reference to the value behind `handle`.
    #[inline]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.nodes.get(handle.0).and_then(|node| node.val.as_ref())
    }

    /// Returns a mutable reference to the value behind `handle`.
    #[inline]
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.nodes
            .get_mut(handle.0)
            .and_then(|node| node.val.as_mut())
    }

    /// Stores `val` in a free slot (or a new one) without linking it.
    fn alloc(&mut self, val: T) -> usize {
        let node = Node {
            val: Some(val),
            prev: None,
            next: None,
        };
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Links a detached slot in front of the current head.
    fn attach_front(&mut self, idx: usize) {
        self.nodes[idx].prev = None;
        self.nodes[idx].next = self.head;
        match self.head {
            Some(old) => self.nodes[old].prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    /// Links a detached slot after the current tail.
    fn attach_back(&mut self, idx: usize) {
        self.nodes[idx].next = None;
        self.nodes[idx].prev = self.tail;
        match self.tail {
            Some(old) => self.nodes[old].next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }

    /// Unlinks a slot from its neighbours without freeing it.
    fn detach(&mut self, idx: usize) {
        let prev = self.nodes[idx].prev;
        let next = self.nodes[idx].next;
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[idx].prev = None;
        self.nodes[idx].next = None;
    }

    /// Adds a value at the front of the list and returns its handle.
    pub fn push_front(&mut self, val: T) -> Handle {
        let idx = self.alloc(val);
        self.attach_front(idx);
        self.len += 1;
        Handle(idx)
    }

    /// Adds a value at the back of the list and returns its handle.
    pub fn push_back(&mut self, val: T) -> Handle {
        let idx = self.alloc(val);
        self.attach_back(idx);
        self.len += 1;
        Handle(idx)
    }

    /// Removes the value behind `handle` and returns it.
    ///
    /// Returns `None` if the handle does not address a live node.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let idx = handle.0;
        if self.nodes.get(idx).map_or(true, |node| node.val.is_none()) {
            return None;
        }
        self.detach(idx);
        self.len -= 1;
        self.free.push(idx);
        self.nodes[idx].val.take()
    }

    /// Removes and returns the front value.
    pub fn pop_front(&mut self) -> Option<T> {
        let head = self.front()?;
        self.remove(head)
    }

    /// Removes and returns the back value.
    pub fn pop_back(&mut self) -> Option<T> {
        let tail = self.back()?;
        self.remove(tail)
    }

    /// Moves the node behind `handle` to the front of the list.
    ///
    /// Returns `false` if the handle does not address a live node.
    pub fn move_to_front(&mut self, handle: Handle) -> bool {
        let idx = handle.0;
        if self.nodes.get(idx).map_or(true, |node| node.val.is_none()) {
            return false;
        }
        if self.head != Some(idx) {
            self.detach(idx);
            self.attach_front(idx);
        }
        true
    }

    /// Iterates values from front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    /// Removes every value and releases the arena slots.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List")
            .field("len", &self.len)
            .field("slots", &self.nodes.len())
            .field("free", &self.free.len())
            .finish()
    }
}

/// Front-to-back iterator over a [`List`].
pub struct Iter<'a, T> {
    list: &'a List<T>,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        let node = &self.list.nodes[idx];
        self.cursor = node.next;
        self.remaining -= 1;
        node.val.as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("remaining", &self.remaining)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec::Vec;

    fn collect<T: Clone>(list: &List<T>) -> Vec<T> {
        list.iter().cloned().collect()
    }

    #[test]
    fn test_push_back_keeps_insertion_order() {
        let mut list = List::new();
        list.push_back(1);
        list.push_back(2);
        list.push_back(3);
        assert_eq!(collect(&list), [1, 2, 3]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_push_front_prepends() {
        let mut list = List::new();
        list.push_front(1);
        list.push_front(2);
        list.push_back(3);
        assert_eq!(collect(&list), [2, 1, 3]);
    }

    #[test]
    fn test_pop_both_ends() {
        let mut list = List::new();
        for i in 0..4 {
            list.push_back(i);
        }
        assert_eq!(list.pop_front(), Some(0));
        assert_eq!(list.pop_back(), Some(3));
        assert_eq!(collect(&list), [1, 2]);
        assert_eq!(list.pop_back(), Some(2));
        assert_eq!(list.pop_back(), Some(1));
        assert_eq!(list.pop_back(), None);
        assert_eq!(list.pop_front(), None);
        assert!(list.is_empty());
        assert_eq!(list.front(), None);
        assert_eq!(list.back(), None);
    }

    #[test]
    fn test_remove_middle_and_ends() {
        let mut list = List::new();
        let a = list.push_back("a");
        let b = list.push_back("b");
        let c = list.push_back("c");

        assert_eq!(list.remove(b), Some("b"));
        assert_eq!(collect(&list), ["a", "c"]);
        assert_eq!(list.remove(b), None);

        assert_eq!(list.remove(a), Some("a"));
        assert_eq!(list.front(), Some(c));
        assert_eq!(list.back(), Some(c));
        assert_eq!(list.remove(c), Some("c"));
        assert!(list.is_empty());
    }

    #[test]
    fn test_move_to_front() {
        let mut list = List::new();
        let a = list.push_back('a');
        let _b = list.push_back('b');
        let c = list.push_back('c');

        assert!(list.move_to_front(c));
        assert_eq!(collect(&list), ['c', 'a', 'b']);

        // already at the front
        assert!(list.move_to_front(c));
        assert_eq!(collect(&list), ['c', 'a', 'b']);

        assert!(list.move_to_front(a));
        assert_eq!(collect(&list), ['a', 'c', 'b']);
        assert_eq!(list.pop_back(), Some('b'));
        assert!(!list.move_to_front(Handle(42)));
    }

    #[test]
    fn test_slots_are_reused() {
        let mut list = List::with_capacity(2);
        let a = list.push_back(10);
        list.push_back(20);
        list.remove(a);
        let c = list.push_back(30);
        assert_eq!(c, a);
        assert_eq!(list.get(c), Some(&30));
        assert_eq!(collect(&list), [20, 30]);
    }

    #[test]
    fn test_get_mut_updates_in_place() {
        let mut list = List::new();
        let h = list.push_back(1);
        if let Some(v) = list.get_mut(h) {
            *v = 5;
        }
        assert_eq!(list.get(h), Some(&5));
    }

    #[test]
    fn test_clear_resets() {
        let mut list = List::new();
        list.push_back(1);
        list.push_back(2);
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.iter().count(), 0);
        let h = list.push_back(3);
        assert_eq!(h, Handle(0));
    }
}
