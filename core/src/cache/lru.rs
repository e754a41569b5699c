//! An exact, bounded LRU cache.

use core::borrow::Borrow;
use core::hash::Hash;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Arena-backed recency list. `head` is the most recently used entry.
struct Lru<K, V> {
    index: HashMap<K, usize>,
    nodes: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl<K: Hash + Eq + Clone, V> Lru<K, V> {
    fn new(capacity: usize) -> Self {
        Self {
            index: HashMap::with_capacity(capacity),
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
        }
    }

    fn node(&mut self, at: usize) -> Option<&mut Node<K, V>> {
        self.nodes.get_mut(at).and_then(Option::as_mut)
    }

    fn unlink(&mut self, at: usize) {
        let (prev, next) = match self.node(at) {
            Some(node) => (node.prev.take(), node.next.take()),
            None => return,
        };
        match prev.and_then(|prev| self.node(prev)) {
            Some(node) => node.next = next,
            None => self.head = next,
        }
        match next.and_then(|next| self.node(next)) {
            Some(node) => node.prev = prev,
            None => self.tail = prev,
        }
    }

    fn push_front(&mut self, at: usize) {
        let head = self.head;
        if let Some(node) = self.node(at) {
            node.prev = None;
            node.next = head;
        }
        match head.and_then(|head| self.node(head)) {
            Some(node) => node.prev = Some(at),
            None => self.tail = Some(at),
        }
        self.head = Some(at);
    }

    fn promote(&mut self, at: usize) {
        if self.head != Some(at) {
            self.unlink(at);
            self.push_front(at);
        }
    }
}

/// A mutex-guarded LRU cache holding at most `capacity` entries.
///
/// Every hit moves the entry to the front of the recency list; inserting a
/// new key into a full cache evicts the least recently used entry and
/// reuses its node.
///
/// # Example
///
/// ```ignore
/// let names = BoundedLruCache::new(128);
/// names.put("content-type".to_owned(), "Content-Type".to_owned());
/// assert_eq!(names.get("content-type").as_deref(), Some("Content-Type"));
/// ```
pub struct BoundedLruCache<K, V> {
    inner: Mutex<Lru<K, V>>,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V: Clone> BoundedLruCache<K, V> {
    /// An empty cache holding at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(Lru::new(capacity)),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Lru<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.lock().index.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The value for `key`, promoting it to most recently used.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut lru = self.lock();
        let at = *lru.index.get(key)?;
        lru.promote(at);
        lru.node(at).map(|node| node.value.clone())
    }

    /// Inserts or updates `key`, promoting it to most recently used.
    ///
    /// Returns the entry evicted to make room, if any.
    pub fn put(&self, key: K, value: V) -> Option<(K, V)> {
        let mut lru = self.lock();
        let existing = lru.index.get(&key).copied();
        if let Some(at) = existing {
            if let Some(node) = lru.node(at) {
                node.value = value;
            }
            lru.promote(at);
            return None;
        }

        if lru.index.len() >= self.capacity {
            let at = lru.tail?;
            lru.promote(at);
            let node = lru.node(at)?;
            let evicted_key = core::mem::replace(&mut node.key, key.clone());
            let evicted_value = core::mem::replace(&mut node.value, value);
            lru.index.remove(&evicted_key);
            lru.index.insert(key, at);
            log::debug!("lru cache evicted least recently used entry");
            return Some((evicted_key, evicted_value));
        }

        let node = Node {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        };
        let at = match lru.free.pop() {
            Some(at) => {
                lru.nodes[at] = Some(node);
                at
            }
            None => {
                lru.nodes.push(Some(node));
                lru.nodes.len() - 1
            }
        };
        lru.index.insert(key, at);
        lru.push_front(at);
        None
    }

    /// Drops the entry for `key`, returning its value.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut lru = self.lock();
        let at = lru.index.remove(key)?;
        lru.unlink(at);
        lru.free.push(at);
        lru.nodes.get_mut(at)?.take().map(|node| node.value)
    }

    /// Drops every entry.
    pub fn clear(&self) {
        *self.lock() = Lru::new(self.capacity);
    }
}
