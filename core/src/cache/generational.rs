//! Generational hash caches.
//!
//! Each bucket holds up to four entries ordered by seniority, gen4 (eldest)
//! to gen1 (youngest), each with a hit weight:
//!
//! - a hit bumps the entry's weight and, once it reaches the weight of the
//!   next elder entry, swaps the two (promotion);
//! - a miss installs the new entry as gen1, shifting younger entries into
//!   the youngest free slot. With no free slot, gen4 and gen3 lose one
//!   weight each, gen2 is evicted and gen1 moves up to take its place.
//!
//! The replacement is LRFU-style: the victim of a full bucket is always
//! gen2, never the eldest gen4. gen4 and gen3 therefore hold the entries
//! that earned their place by hits, while gen2 and gen1 absorb one-off
//! lookups. An elder entry that
//! stops being hit sinks as misses penalize it, until a younger entry's
//! weight catches up and swaps it down into the evictable generations.
//!
//! Buckets are immutable. Every mutation builds a new bucket and publishes
//! it with a single compare-and-swap on the bucket's [`ArcSwap`]; readers
//! never wait for writers. Inserts and removals retry until they win;
//! promotions and purges are best-effort and simply lost on contention.
//! The hit and miss counters are relaxed and may be slightly off under
//! concurrent use.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::sync::atomic::{AtomicU64, Ordering};
use std::hash::RandomState;
use std::sync::{Arc, Weak};

use arc_swap::ArcSwap;

const GENERATIONS: usize = 4;

/// How strongly a slot retains its value.
enum Handle<V: ?Sized> {
    Strong(Arc<V>),
    /// Kept only while some other holder keeps the value alive.
    Weak(Weak<V>),
}

impl<V: ?Sized> Clone for Handle<V> {
    fn clone(&self) -> Self {
        match self {
            Handle::Strong(value) => Handle::Strong(Arc::clone(value)),
            Handle::Weak(value) => Handle::Weak(Weak::clone(value)),
        }
    }
}

impl<V: ?Sized> Handle<V> {
    fn get(&self) -> Option<Arc<V>> {
        match self {
            Handle::Strong(value) => Some(Arc::clone(value)),
            Handle::Weak(value) => value.upgrade(),
        }
    }

    fn is_dead(&self) -> bool {
        match self {
            Handle::Strong(_) => false,
            Handle::Weak(value) => value.strong_count() == 0,
        }
    }

    fn weakened(&self) -> Self {
        match self {
            Handle::Strong(value) => Handle::Weak(Arc::downgrade(value)),
            Handle::Weak(value) => Handle::Weak(Weak::clone(value)),
        }
    }
}

struct Slot<K, V: ?Sized> {
    key: K,
    value: Handle<V>,
    weight: u32,
}

impl<K: Clone, V: ?Sized> Clone for Slot<K, V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            value: self.value.clone(),
            weight: self.weight,
        }
    }
}

/// Index 0 is gen4, index 3 is gen1.
struct Bucket<K, V: ?Sized> {
    slots: [Option<Slot<K, V>>; GENERATIONS],
}

impl<K: Clone, V: ?Sized> Bucket<K, V> {
    fn empty() -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
        }
    }

    fn probe(&self, matches: impl Fn(&K, &V) -> bool) -> Option<(usize, Arc<V>)> {
        self.slots.iter().enumerate().find_map(|(index, slot)| {
            let slot = slot.as_ref()?;
            let value = slot.value.get()?;
            matches(&slot.key, &value).then_some((index, value))
        })
    }

    fn has_dead(&self) -> bool {
        self.slots.iter().flatten().any(|slot| slot.value.is_dead())
    }

    fn purged(&self) -> [Option<Slot<K, V>>; GENERATIONS] {
        let mut slots = self.slots.clone();
        for slot in &mut slots {
            if slot.as_ref().is_some_and(|slot| slot.value.is_dead()) {
                *slot = None;
            }
        }
        slots
    }

    fn hit(&self, index: usize) -> Self {
        let mut slots = self.slots.clone();
        let weight = match &mut slots[index] {
            Some(slot) => {
                slot.weight = slot.weight.saturating_add(1);
                slot.weight
            }
            None => 0,
        };
        if index > 0 {
            let elder = slots[index - 1].as_ref().map_or(0, |slot| slot.weight);
            if weight >= elder {
                slots.swap(index - 1, index);
            }
        }
        Self { slots }
    }

    fn installed(&self, slot: Slot<K, V>) -> Self {
        let mut slots = self.purged();
        match slots.iter().rposition(Option::is_none) {
            Some(hole) => slots[hole..].rotate_left(1),
            None => {
                log::debug!("generational cache evicting gen2 entry");
                for elder in slots[..2].iter_mut().flatten() {
                    elder.weight = elder.weight.saturating_sub(1);
                }
                slots[2] = slots[3].take();
            }
        }
        slots[GENERATIONS - 1] = Some(slot);
        Self { slots }
    }

    fn without(&self, index: usize) -> Self {
        let mut slots = self.slots.clone();
        slots[index] = None;
        Self { slots }
    }

    fn weakened(&self, index: usize) -> Self {
        let mut slots = self.slots.clone();
        if let Some(slot) = &mut slots[index] {
            slot.value = slot.value.weakened();
        }
        Self { slots }
    }
}

/// Bucket array and statistics shared by the map and the set.
struct Table<K, V: ?Sized, S> {
    buckets: Box<[ArcSwap<Bucket<K, V>>]>,
    hasher: S,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K: Clone, V: ?Sized, S: BuildHasher> Table<K, V, S> {
    fn new(size: usize, hasher: S) -> Self {
        let buckets = (0..size.max(1))
            .map(|_| ArcSwap::from_pointee(Bucket::empty()))
            .collect();
        Self {
            buckets,
            hasher,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn cell<Q: Hash + ?Sized>(&self, key: &Q) -> &ArcSwap<Bucket<K, V>> {
        let hash = self.hasher.hash_one(key);
        &self.buckets[(hash % self.buckets.len() as u64) as usize]
    }

    fn get(&self, cell: &ArcSwap<Bucket<K, V>>, matches: impl Fn(&K, &V) -> bool) -> Option<Arc<V>> {
        let current = cell.load();
        match current.probe(matches) {
            Some((index, value)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                let _ = cell.compare_and_swap(&current, Arc::new(current.hit(index)));
                Some(value)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                if current.has_dead() {
                    let purged = Bucket {
                        slots: current.purged(),
                    };
                    let _ = cell.compare_and_swap(&current, Arc::new(purged));
                }
                None
            }
        }
    }

    fn put(
        &self,
        cell: &ArcSwap<Bucket<K, V>>,
        matches: impl Fn(&K, &V) -> bool,
        key: &K,
        value: &Arc<V>,
    ) -> Arc<V> {
        loop {
            let current = cell.load();
            let (next, canonical) = match current.probe(&matches) {
                Some((index, existing)) => (current.hit(index), existing),
                None => {
                    let slot = Slot {
                        key: key.clone(),
                        value: Handle::Strong(Arc::clone(value)),
                        weight: 1,
                    };
                    (current.installed(slot), Arc::clone(value))
                }
            };
            let previous = cell.compare_and_swap(&current, Arc::new(next));
            if Arc::ptr_eq(&*previous, &*current) {
                return canonical;
            }
            log::trace!("generational cache put lost a race, retrying");
        }
    }

    /// Replaces the bucket holding the matching slot with `rebuild`'s
    /// result, returning the matched value.
    fn update(
        &self,
        cell: &ArcSwap<Bucket<K, V>>,
        matches: impl Fn(&K, &V) -> bool,
        rebuild: impl Fn(&Bucket<K, V>, usize) -> Bucket<K, V>,
    ) -> Option<Arc<V>> {
        loop {
            let current = cell.load();
            let (index, value) = current.probe(&matches)?;
            let previous = cell.compare_and_swap(&current, Arc::new(rebuild(&current, index)));
            if Arc::ptr_eq(&*previous, &*current) {
                return Some(value);
            }
        }
    }

    fn clear(&self) {
        for cell in self.buckets.iter() {
            cell.store(Arc::new(Bucket::empty()));
        }
    }

    fn hit_ratio(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed) as f64;
        let misses = self.misses.load(Ordering::Relaxed) as f64;
        if hits + misses == 0.0 {
            0.0
        } else {
            hits / (hits + misses)
        }
    }
}

/// A lock-free generational cache from keys to shared values.
///
/// Holds at most `4 * size` entries. `V` may be unsized, e.g. `str`.
///
/// # Example
///
/// ```ignore
/// let types: HashGenCacheMap<String, MediaType> = HashGenCacheMap::new(64);
/// let canonical = types.put("text/plain".to_owned(), parsed);
/// assert!(Arc::ptr_eq(&canonical, &types.get("text/plain").unwrap()));
/// ```
pub struct HashGenCacheMap<K, V: ?Sized, S = RandomState> {
    table: Table<K, V, S>,
}

impl<K: Hash + Eq + Clone, V: ?Sized> HashGenCacheMap<K, V> {
    /// A cache with `size` buckets.
    pub fn new(size: usize) -> Self {
        Self::with_hasher(size, RandomState::new())
    }
}

impl<K: Hash + Eq + Clone, V: ?Sized, S: BuildHasher> HashGenCacheMap<K, V, S> {
    /// A cache with `size` buckets hashing keys with `hasher`.
    pub fn with_hasher(size: usize, hasher: S) -> Self {
        Self {
            table: Table::new(size, hasher),
        }
    }

    /// The cached value for `key`, counting a hit or a miss.
    pub fn get<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table
            .get(self.table.cell(key), |cached, _| Borrow::<Q>::borrow(cached) == key)
    }

    /// Caches `value` under `key` unless a live value is already cached,
    /// returning whichever value is now canonical.
    pub fn put(&self, key: K, value: impl Into<Arc<V>>) -> Arc<V> {
        let value = value.into();
        let cell = self.table.cell(&key);
        self.table
            .put(cell, |cached, _| *cached == key, &key, &value)
    }

    /// Drops the entry for `key`, returning its value.
    pub fn remove<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.update(
            self.table.cell(key),
            |cached, _| Borrow::<Q>::borrow(cached) == key,
            Bucket::without,
        )
    }

    /// Keeps the entry for `key` only while something else holds its value.
    ///
    /// Returns whether a live entry was found.
    pub fn weaken<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table
            .update(
                self.table.cell(key),
                |cached, _| Borrow::<Q>::borrow(cached) == key,
                Bucket::weakened,
            )
            .is_some()
    }

    /// Drops every entry. Statistics are kept.
    pub fn clear(&self) {
        self.table.clear();
    }

    /// Number of `get` calls that found a live value.
    pub fn hits(&self) -> u64 {
        self.table.hits.load(Ordering::Relaxed)
    }

    /// Number of `get` calls that found nothing.
    pub fn misses(&self) -> u64 {
        self.table.misses.load(Ordering::Relaxed)
    }

    /// `hits / (hits + misses)`, or 0 before the first `get`.
    pub fn hit_ratio(&self) -> f64 {
        self.table.hit_ratio()
    }
}

/// A lock-free generational interning set.
///
/// # Example
///
/// ```ignore
/// let names: HashGenCacheSet<str> = HashGenCacheSet::new(256);
/// let a = names.intern("content-type");
/// let b = names.intern("content-type");
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
pub struct HashGenCacheSet<T: ?Sized, S = RandomState> {
    table: Table<(), T, S>,
}

impl<T: Hash + Eq + ?Sized> HashGenCacheSet<T> {
    /// A set with `size` buckets.
    pub fn new(size: usize) -> Self {
        Self::with_hasher(size, RandomState::new())
    }
}

impl<T: Hash + Eq + ?Sized, S: BuildHasher> HashGenCacheSet<T, S> {
    /// A set with `size` buckets hashing values with `hasher`.
    pub fn with_hasher(size: usize, hasher: S) -> Self {
        Self {
            table: Table::new(size, hasher),
        }
    }

    /// The canonical instance equal to `value`, counting a hit or a miss.
    pub fn get<Q>(&self, value: &Q) -> Option<Arc<T>>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table
            .get(self.table.cell(value), |_, cached| Borrow::<Q>::borrow(cached) == value)
    }

    /// Whether a live instance equal to `value` is cached.
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table
            .cell(value)
            .load()
            .probe(|_, cached| Borrow::<Q>::borrow(cached) == value)
            .is_some()
    }

    /// Adds `value` unless an equal instance is cached, returning the
    /// canonical instance.
    pub fn put(&self, value: impl Into<Arc<T>>) -> Arc<T> {
        let value = value.into();
        let cell = self.table.cell(&*value);
        self.table
            .put(cell, |_, cached| *cached == *value, &(), &value)
    }

    /// The canonical instance equal to `value`, allocating one on a miss.
    pub fn intern(&self, value: &T) -> Arc<T>
    where
        Arc<T>: for<'a> From<&'a T>,
    {
        match self.get(value) {
            Some(cached) => cached,
            None => self.put(Arc::<T>::from(value)),
        }
    }

    /// Drops the instance equal to `value`.
    pub fn remove<Q>(&self, value: &Q) -> Option<Arc<T>>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.update(
            self.table.cell(value),
            |_, cached| Borrow::<Q>::borrow(cached) == value,
            Bucket::without,
        )
    }

    /// Keeps the instance equal to `value` only while something else holds
    /// it.
    pub fn weaken<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table
            .update(
                self.table.cell(value),
                |_, cached| Borrow::<Q>::borrow(cached) == value,
                Bucket::weakened,
            )
            .is_some()
    }

    /// Drops every instance. Statistics are kept.
    pub fn clear(&self) {
        self.table.clear();
    }

    /// Number of `get` calls that found a live instance.
    pub fn hits(&self) -> u64 {
        self.table.hits.load(Ordering::Relaxed)
    }

    /// Number of `get` calls that found nothing.
    pub fn misses(&self) -> u64 {
        self.table.misses.load(Ordering::Relaxed)
    }

    /// `hits / (hits + misses)`, or 0 before the first `get`.
    pub fn hit_ratio(&self) -> f64 {
        self.table.hit_ratio()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::{BuildHasherDefault, DefaultHasher};
    use std::thread;

    #[test]
    fn test_get_after_put() {
        let cache: HashGenCacheMap<u32, String> = HashGenCacheMap::new(8);
        cache.put(1, "one".to_owned());
        assert_eq!(cache.get(&1).as_deref().map(String::as_str), Some("one"));
        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_put_returns_canonical_value() {
        let cache: HashGenCacheMap<&str, str> = HashGenCacheMap::new(4);
        let first = cache.put("k", "first");
        let second = cache.put("k", "second");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(&*second, "first");
    }

    #[test]
    fn test_full_bucket_evicts_gen2() {
        let cache: HashGenCacheMap<u32, u32> = HashGenCacheMap::new(1);
        for key in 0..5 {
            cache.put(key, key * 10);
        }
        assert_eq!(cache.get(&2), None);
        for key in [0, 1, 3, 4] {
            assert_eq!(cache.get(&key).as_deref(), Some(&(key * 10)));
        }
    }

    #[test]
    fn test_hot_entry_survives_churn() {
        let cache: HashGenCacheMap<u32, u32> = HashGenCacheMap::new(1);
        cache.put(0, 0);
        for _ in 0..8 {
            cache.get(&0);
        }
        for key in 1..20 {
            cache.put(key, key);
            cache.get(&0);
        }
        assert!(cache.get(&0).is_some());
    }

    type FixedHasher = BuildHasherDefault<DefaultHasher>;

    struct XorShift(u64);

    impl XorShift {
        fn next(&mut self) -> u64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0
        }
    }

    /// Four-way set-associative cache evicting a random way.
    struct RandomEviction {
        sets: Vec<Vec<u64>>,
        hasher: FixedHasher,
        rng: XorShift,
        hits: u64,
        lookups: u64,
    }

    impl RandomEviction {
        fn access(&mut self, key: u64) {
            self.lookups += 1;
            let index = (self.hasher.hash_one(key) % self.sets.len() as u64) as usize;
            let set = &mut self.sets[index];
            if set.contains(&key) {
                self.hits += 1;
            } else if set.len() < GENERATIONS {
                set.push(key);
            } else {
                let way = (self.rng.next() % GENERATIONS as u64) as usize;
                set[way] = key;
            }
        }
    }

    #[test]
    fn test_hot_set_beats_random_eviction() {
        const BUCKETS: usize = 8;
        let cache: HashGenCacheMap<u64, u64, FixedHasher> =
            HashGenCacheMap::with_hasher(BUCKETS, FixedHasher::default());
        let mut baseline = RandomEviction {
            sets: vec![Vec::new(); BUCKETS],
            hasher: FixedHasher::default(),
            rng: XorShift(0x9e37_79b9_7f4a_7c15),
            hits: 0,
            lookups: 0,
        };
        let mut traffic = XorShift(0x2545_f491_4f6c_dd1d);
        for _ in 0..20_000 {
            let roll = traffic.next();
            let key = if roll % 10 < 9 {
                roll % BUCKETS as u64
            } else {
                1_000 + roll % 100_000
            };
            if cache.get(&key).is_none() {
                cache.put(key, key);
            }
            baseline.access(key);
        }
        let random = baseline.hits as f64 / baseline.lookups as f64;
        assert!(
            cache.hit_ratio() > random,
            "generational {} vs random {}",
            cache.hit_ratio(),
            random
        );
    }

    #[test]
    fn test_remove_and_clear() {
        let cache: HashGenCacheMap<u32, u32> = HashGenCacheMap::new(4);
        cache.put(1, 1);
        cache.put(2, 2);
        assert_eq!(cache.remove(&1).as_deref(), Some(&1));
        assert_eq!(cache.get(&1), None);
        cache.clear();
        assert_eq!(cache.get(&2), None);
    }

    #[test]
    fn test_weaken_keeps_value_while_held() {
        let cache: HashGenCacheMap<u32, String> = HashGenCacheMap::new(4);
        let held = cache.put(7, "seven".to_owned());
        assert!(cache.weaken(&7));
        assert!(cache.get(&7).is_some());
        drop(held);
        assert_eq!(cache.get(&7), None);
        assert!(!cache.weaken(&7));
    }

    #[test]
    fn test_set_interns() {
        let set: HashGenCacheSet<str> = HashGenCacheSet::new(16);
        let a = set.intern("name");
        let b = set.intern("name");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(set.contains("name"));
        assert!(!set.contains("other"));
        assert!(set.remove("name").is_some());
        assert!(!set.contains("name"));
    }

    #[test]
    fn test_concurrent_interning_converges() {
        let set: Arc<HashGenCacheSet<str>> = Arc::new(HashGenCacheSet::new(4));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let set = Arc::clone(&set);
                thread::spawn(move || set.intern("shared"))
            })
            .collect();
        let interned: Vec<Arc<str>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let canonical = set.get("shared").unwrap();
        assert!(interned.iter().all(|value| Arc::ptr_eq(value, &canonical)));
    }
}
