//! ChainMap: a single-threaded hash map with separate chaining.
//! Power-of-two bucket tables, high-bit hash spreading, and a split rehash that relinks
//! existing entries on growth instead of hashing their keys again.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::io::{self, Write};
use std::iter::FusedIterator;
use std::mem;

use ahash::RandomState;
use log::{debug, trace};

mod config;
mod error;

pub use config::MapConfig;
pub use error::{MapError, Result};

// ================================================================================================
// CONSTANTS
// ================================================================================================

/// Bucket count used when no capacity is requested
pub const DEFAULT_INITIAL_CAPACITY: usize = 1 << 4;

/// Largest bucket count a table may reach
pub const MAXIMUM_CAPACITY: usize = 1 << 30;

/// Ratio of entries to buckets above which the table grows
pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;

/// Hash of the unkeyed slot
const UNKEYED_HASH: u32 = 0;

// ================================================================================================
// INTERNAL DATA STRUCTURES
// ================================================================================================

type Link<K, V> = Option<Box<Entry<K, V>>>;

/// Chain node. `key: None` is the unkeyed slot.
struct Entry<K, V> {
    hash: u32, // spread hash, kept so growth never rehashes the key
    key: Option<K>,
    value: V,
    next: Link<K, V>,
}

impl<K, V> Entry<K, V> {
    fn new(hash: u32, key: Option<K>, value: V) -> Box<Self> {
        Box::new(Self {
            hash,
            key,
            value,
            next: None,
        })
    }

    /// Stored hash first, key equality only on a hash hit.
    #[inline(always)]
    fn matches<Q>(&self, hash: u32, key: Option<&Q>) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.hash == hash
            && match (&self.key, key) {
                (Some(stored), Some(probe)) => stored.borrow() == probe,
                (None, None) => true,
                _ => false,
            }
    }
}

/// Bucket array. Length is always a power of two.
struct Table<K, V> {
    buckets: Box<[Link<K, V>]>,
}

// ================================================================================================
// MAIN MAP STRUCTURE
// ================================================================================================

/// Hash map with chained buckets and threshold-triggered doubling.
///
/// Besides ordinary keys the map has one *unkeyed slot*: a value stored without a key
/// (see [`ChainMap::insert_unkeyed`]). It lives in the table like any other entry, under
/// hash 0, and counts towards [`ChainMap::len`].
///
/// Iteration follows bucket order, and insertion order within a bucket.
pub struct ChainMap<K, V, S = RandomState> {
    table: Option<Table<K, V>>,
    len: usize,
    // Before the first allocation this holds the requested bucket count.
    threshold: usize,
    load_factor: f32,
    hash_builder: S,
}

// ================================================================================================
// CONSTRUCTORS
// ================================================================================================

impl<K, V> ChainMap<K, V, RandomState> {
    /// Create an empty map with 16 buckets reserved and a load factor of 0.75.
    ///
    /// No memory is allocated until the first insertion.
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    /// Create an empty map sized for `capacity` buckets.
    ///
    /// The capacity is rounded up to a power of two and capped at [`MAXIMUM_CAPACITY`].
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }

    /// Create an empty map with an explicit load factor.
    ///
    /// Fails with [`MapError::InvalidLoadFactor`] unless `load_factor` is positive.
    pub fn with_capacity_and_load_factor(capacity: usize, load_factor: f32) -> Result<Self> {
        let config = MapConfig::default()
            .with_initial_capacity(capacity)
            .with_load_factor(load_factor)?;
        Ok(Self::with_config(config))
    }

    /// Create an empty map from validated settings.
    pub fn with_config(config: MapConfig) -> Self {
        Self::with_config_and_hasher(config, RandomState::new())
    }
}

impl<K, V, S> ChainMap<K, V, S> {
    /// Create an empty map using the provided hasher.
    ///
    /// Changing the hasher of a populated map is not supported, since stored hashes would no
    /// longer match their keys.
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_config_and_hasher(MapConfig::default(), hash_builder)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        let config = MapConfig::default().with_initial_capacity(capacity);
        Self::with_config_and_hasher(config, hash_builder)
    }

    pub fn with_config_and_hasher(config: MapConfig, hash_builder: S) -> Self {
        Self {
            table: None,
            len: 0,
            threshold: table_size_for(config.initial_capacity()),
            load_factor: config.load_factor(),
            hash_builder,
        }
    }

    // ============================================================================================
    // PUBLIC API METHODS (no hashing required)
    // ============================================================================================

    /// Returns the number of entries in the map, the unkeyed slot included.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the map contains no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buckets in the current table, 0 before the first insertion.
    pub fn capacity(&self) -> usize {
        self.table.as_ref().map_or(0, Table::capacity)
    }

    /// Entry count above which the next insertion grows the table, 0 before the first insertion.
    pub fn threshold(&self) -> usize {
        self.table.as_ref().map_or(0, |_| self.threshold)
    }

    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }

    /// Returns a reference to the map's `BuildHasher`.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Removes all entries. The bucket table keeps its capacity.
    pub fn clear(&mut self) {
        if let Some(table) = self.table.as_mut() {
            table.clear();
        }
        self.len = 0;
    }

    /// Keep only the entries for which `keep` returns true.
    ///
    /// The closure may also update the values it keeps. Surviving entries keep their order.
    /// If `keep` panics, every entry not yet removed stays in the map.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(Option<&K>, &mut V) -> bool,
    {
        let Some(table) = self.table.as_mut() else {
            return;
        };
        for bucket in table.buckets.iter_mut() {
            // The entry under test stays linked while `keep` runs.
            let mut cursor = bucket;
            loop {
                let kept = match cursor.as_mut() {
                    Some(entry) => keep(entry.key.as_ref(), &mut entry.value),
                    None => break,
                };
                if kept {
                    if let Some(entry) = cursor {
                        cursor = &mut entry.next;
                    }
                } else if let Some(mut removed) = cursor.take() {
                    *cursor = removed.next.take();
                    self.len -= 1;
                }
            }
        }
    }

    /// Returns an iterator over `(key, value)` pairs in bucket order.
    /// The unkeyed slot is reported with a `None` key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let buckets: &[Link<K, V>] = match &self.table {
            Some(table) => &table.buckets[..],
            None => &[],
        };
        Iter {
            buckets: buckets.iter(),
            current: None,
            remaining: self.len,
        }
    }

    /// Returns an iterator over `(key, &mut value)` pairs in bucket order.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let buckets: &mut [Link<K, V>] = match &mut self.table {
            Some(table) => &mut table.buckets[..],
            None => &mut [],
        };
        IterMut {
            buckets: buckets.iter_mut(),
            current: None,
            remaining: self.len,
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }
}

impl<K, V, S> ChainMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    // ============================================================================================
    // PUBLIC API METHODS
    // ============================================================================================

    /// Returns a reference to the value stored for `key`.
    ///
    /// The key may be any borrowed form of the map's key type, as long as `Hash` and `Eq` on
    /// the borrowed form match those of the key type.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_key(key);
        self.locate(hash, Some(key)).map(|entry| &entry.value)
    }

    /// Returns a mutable reference to the value stored for `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_key(key);
        self.locate_mut(hash, Some(key)).map(|entry| &mut entry.value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_key(key);
        self.locate(hash, Some(key)).is_some()
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the key is already present its value is replaced in place and the old value is
    /// returned; the stored key is left untouched. Otherwise the entry is appended to its
    /// bucket, the table may grow, and `None` is returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.hash_key(&key);
        self.put(hash, Some(key), value)
    }

    /// Removes `key` from the map, returning its value if it was present.
    ///
    /// The table never shrinks.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_key(key);
        self.take(hash, Some(key))
    }

    /// Returns the value of the unkeyed slot.
    pub fn get_unkeyed(&self) -> Option<&V> {
        self.locate::<K>(UNKEYED_HASH, None)
            .map(|entry| &entry.value)
    }

    pub fn get_unkeyed_mut(&mut self) -> Option<&mut V> {
        self.locate_mut::<K>(UNKEYED_HASH, None)
            .map(|entry| &mut entry.value)
    }

    pub fn contains_unkeyed(&self) -> bool {
        self.locate::<K>(UNKEYED_HASH, None).is_some()
    }

    /// Stores `value` in the unkeyed slot, returning the value it replaces.
    pub fn insert_unkeyed(&mut self, value: V) -> Option<V> {
        self.put(UNKEYED_HASH, None, value)
    }

    /// Empties the unkeyed slot, returning its value.
    pub fn remove_unkeyed(&mut self) -> Option<V> {
        self.take::<K>(UNKEYED_HASH, None)
    }

    // ============================================================================================
    // LOOKUP / MUTATE ENGINE
    // ============================================================================================

    /// Native 64-bit hash folded to 32 bits, then spread.
    #[inline(always)]
    fn hash_key<Q: Hash + ?Sized>(&self, key: &Q) -> u32 {
        let h64 = self.hash_builder.hash_one(key);
        spread((h64 ^ (h64 >> 32)) as u32)
    }

    fn locate<Q>(&self, hash: u32, key: Option<&Q>) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let table = self.table.as_ref()?;
        let mut link = table.buckets[table.index(hash)].as_deref();
        while let Some(entry) = link {
            if entry.matches(hash, key) {
                return Some(entry);
            }
            link = entry.next.as_deref();
        }
        None
    }

    fn locate_mut<Q>(&mut self, hash: u32, key: Option<&Q>) -> Option<&mut Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let table = self.table.as_mut()?;
        let index = table.index(hash);
        let mut link = table.buckets[index].as_deref_mut();
        while let Some(entry) = link {
            if entry.matches(hash, key) {
                return Some(entry);
            }
            link = entry.next.as_deref_mut();
        }
        None
    }

    fn put(&mut self, hash: u32, key: Option<K>, value: V) -> Option<V> {
        let table = match self.table {
            Some(ref mut table) => table,
            None => self.resize(),
        };
        let index = table.index(hash);

        let mut cursor = &mut table.buckets[index];
        while let Some(entry) = cursor {
            if entry.matches(hash, key.as_ref()) {
                return Some(mem::replace(&mut entry.value, value));
            }
            cursor = &mut entry.next;
        }
        *cursor = Some(Entry::new(hash, key, value));

        self.len += 1;
        if self.len > self.threshold {
            self.resize();
        }
        None
    }

    fn take<Q>(&mut self, hash: u32, key: Option<&Q>) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let table = self.table.as_mut()?;
        let index = table.index(hash);

        // Walk until the cursor is the link that owns the match; running off the end is a miss.
        let mut cursor = &mut table.buckets[index];
        while !cursor.as_ref()?.matches(hash, key) {
            cursor = &mut cursor.as_mut()?.next;
        }
        let removed = cursor.take()?;
        let Entry { value, next, .. } = *removed;
        *cursor = next;

        self.len -= 1;
        Some(value)
    }
}

impl<K, V, S> ChainMap<K, V, S> {
    // ============================================================================================
    // RESIZE ENGINE
    // ============================================================================================

    /// Allocate the first table, or double the current one and split its chains into it.
    ///
    /// A table already at [`MAXIMUM_CAPACITY`] is kept and the threshold is lifted so no
    /// further growth is attempted.
    fn resize(&mut self) -> &mut Table<K, V> {
        let table = match self.table.take() {
            Some(table) if table.capacity() >= MAXIMUM_CAPACITY => {
                self.threshold = usize::MAX;
                debug!(
                    "table saturated at {} buckets with {} entries",
                    table.capacity(),
                    self.len
                );
                table
            }
            Some(old_table) => {
                let old_capacity = old_table.capacity();
                let (capacity, threshold) =
                    grown_geometry(old_capacity, self.threshold, self.load_factor);
                let mut table = Table::new(capacity);
                old_table.split_into(&mut table);
                self.threshold = threshold;
                debug!(
                    "resized table from {} to {} buckets ({} entries, next threshold {})",
                    old_capacity, capacity, self.len, threshold
                );
                table
            }
            None => {
                let (capacity, threshold) = grown_geometry(0, self.threshold, self.load_factor);
                self.threshold = threshold;
                trace!(
                    "allocated table of {} buckets, threshold {}",
                    capacity,
                    threshold
                );
                Table::new(capacity)
            }
        };
        self.table.insert(table)
    }
}

impl<K: fmt::Display, V: fmt::Display, S> ChainMap<K, V, S> {
    // ============================================================================================
    // DIAGNOSTICS
    // ============================================================================================

    /// Write one line per bucket: `bucket 3: [a=1] -> [q=7]`, or `bucket 3: (empty)`.
    ///
    /// Nothing is written before the first insertion.
    pub fn write_buckets<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let Some(table) = self.table.as_ref() else {
            return Ok(());
        };
        for (index, bucket) in table.buckets.iter().enumerate() {
            write!(out, "bucket {index}:")?;
            let mut link = bucket.as_deref();
            if link.is_none() {
                writeln!(out, " (empty)")?;
                continue;
            }
            let mut separator = " ";
            while let Some(entry) = link {
                write!(
                    out,
                    "{separator}[{}={}]",
                    DisplayKey(entry.key.as_ref()),
                    entry.value
                )?;
                separator = " -> ";
                link = entry.next.as_deref();
            }
            writeln!(out)?;
        }
        Ok(())
    }

    /// Dump every bucket to standard output.
    pub fn print_buckets(&self) -> io::Result<()> {
        self.write_buckets(&mut io::stdout().lock())
    }
}

// ================================================================================================
// TABLE IMPLEMENTATION
// ================================================================================================

impl<K, V> Table<K, V> {
    fn new(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());
        Self {
            buckets: std::iter::repeat_with(|| None).take(capacity).collect(),
        }
    }

    #[inline(always)]
    fn capacity(&self) -> usize {
        self.buckets.len()
    }

    #[inline(always)]
    fn index(&self, hash: u32) -> usize {
        hash as usize & (self.capacity() - 1)
    }

    fn clear(&mut self) {
        for bucket in self.buckets.iter_mut() {
            drop_chain(bucket.take());
        }
    }

    /// Move every entry into `new_table`, which has twice as many buckets.
    ///
    /// The bit `hash & old_capacity` decides each entry's fate: 0 keeps index `j`,
    /// 1 moves it to `j + old_capacity`. Both halves are rebuilt by tail-append, so
    /// entries keep their relative order.
    fn split_into(mut self, new_table: &mut Table<K, V>) {
        let old_capacity = self.capacity();
        debug_assert_eq!(new_table.capacity(), old_capacity << 1);

        for (j, bucket) in self.buckets.iter_mut().enumerate() {
            let Some(head) = bucket.take() else {
                continue;
            };
            if head.next.is_none() {
                let index = new_table.index(head.hash);
                new_table.buckets[index] = Some(head);
                continue;
            }

            let (mut low, mut high): (Link<K, V>, Link<K, V>) = (None, None);
            let mut low_tail = &mut low;
            let mut high_tail = &mut high;
            let mut chain = Some(head);
            while let Some(mut entry) = chain {
                chain = entry.next.take();
                if entry.hash as usize & old_capacity == 0 {
                    low_tail = &mut low_tail.insert(entry).next;
                } else {
                    high_tail = &mut high_tail.insert(entry).next;
                }
            }
            new_table.buckets[j] = low;
            new_table.buckets[j + old_capacity] = high;
        }
    }

    fn into_buckets(mut self) -> Vec<Link<K, V>> {
        mem::take(&mut self.buckets).into_vec()
    }
}

impl<K: Clone, V: Clone> Clone for Table<K, V> {
    fn clone(&self) -> Self {
        let buckets = self
            .buckets
            .iter()
            .map(|bucket| {
                let mut head: Link<K, V> = None;
                let mut tail = &mut head;
                let mut link = bucket.as_deref();
                while let Some(entry) = link {
                    let copy = Entry::new(entry.hash, entry.key.clone(), entry.value.clone());
                    tail = &mut tail.insert(copy).next;
                    link = entry.next.as_deref();
                }
                head
            })
            .collect();
        Self { buckets }
    }
}

// ================================================================================================
// DROP IMPLEMENTATIONS
// ================================================================================================

// Chains are unlinked one node at a time; the default recursive drop of a long
// collision chain could exhaust the stack.
impl<K, V> Drop for Table<K, V> {
    fn drop(&mut self) {
        self.clear();
    }
}

fn drop_chain<K, V>(mut link: Link<K, V>) {
    while let Some(mut entry) = link {
        link = entry.next.take();
    }
}

// ================================================================================================
// STANDARD TRAIT IMPLEMENTATIONS
// ================================================================================================

impl<K, V, S: Default> Default for ChainMap<K, V, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K: Clone, V: Clone, S: Clone> Clone for ChainMap<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            len: self.len,
            threshold: self.threshold,
            load_factor: self.load_factor,
            hash_builder: self.hash_builder.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for ChainMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Renders as `{k1=v1, k2=v2}` in bucket order, `{}` when empty.
/// The unkeyed slot's key is written as `None`.
impl<K: fmt::Display, V: fmt::Display, S> fmt::Display for ChainMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", DisplayKey(key), value)?;
        }
        f.write_str("}")
    }
}

struct DisplayKey<'a, K>(Option<&'a K>);

impl<K: fmt::Display> fmt::Display for DisplayKey<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(key) => key.fmt(f),
            None => f.write_str("None"),
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for ChainMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = ChainMap::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, S> Extend<(K, V)> for ChainMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            let _ = self.insert(k, v);
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a ChainMap<K, V, S> {
    type Item = (Option<&'a K>, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut ChainMap<K, V, S> {
    type Item = (Option<&'a K>, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, S> IntoIterator for ChainMap<K, V, S> {
    type Item = (Option<K>, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(mut self) -> Self::IntoIter {
        let buckets = self
            .table
            .take()
            .map(Table::into_buckets)
            .unwrap_or_default();
        IntoIter {
            buckets: buckets.into_iter(),
            current: None,
            remaining: self.len,
        }
    }
}

// ================================================================================================
// UTILITY FUNCTIONS
// ================================================================================================

/// Fold the upper 16 bits into the lower 16, since indexing only looks at low bits.
#[inline(always)]
fn spread(native: u32) -> u32 {
    native ^ (native >> 16)
}

/// Smallest power of two holding `capacity` buckets, at least 1, capped at the maximum.
fn table_size_for(capacity: usize) -> usize {
    capacity
        .max(1)
        .next_power_of_two()
        .min(MAXIMUM_CAPACITY)
}

/// Bucket count and threshold for the table replacing one of `old_capacity` buckets.
///
/// `old_capacity == 0` means no table exists yet; `old_threshold` then carries the capacity
/// recorded at construction (0 falls back to the defaults). The caller handles tables that
/// are already at [`MAXIMUM_CAPACITY`].
fn grown_geometry(old_capacity: usize, old_threshold: usize, load_factor: f32) -> (usize, usize) {
    debug_assert!(old_capacity < MAXIMUM_CAPACITY);
    let capacity;
    let mut threshold = 0;
    if old_capacity > 0 {
        capacity = old_capacity << 1;
        if capacity < MAXIMUM_CAPACITY && old_capacity >= DEFAULT_INITIAL_CAPACITY {
            // an overflowing doubling is recomputed below
            threshold = old_threshold.checked_mul(2).unwrap_or(0);
        }
    } else if old_threshold > 0 {
        capacity = old_threshold;
        threshold = (capacity as f32 * load_factor) as usize;
    } else {
        capacity = DEFAULT_INITIAL_CAPACITY;
        threshold = (DEFAULT_INITIAL_CAPACITY as f32 * DEFAULT_LOAD_FACTOR) as usize;
    }

    if threshold == 0 {
        let scaled = capacity as f32 * load_factor;
        threshold = if capacity < MAXIMUM_CAPACITY && scaled < MAXIMUM_CAPACITY as f32 {
            scaled as usize
        } else {
            usize::MAX
        };
    }
    (capacity, threshold)
}

// ================================================================================================
// ITERATOR IMPLEMENTATIONS
// ================================================================================================

/// Iterator over the entries of a ChainMap, in bucket order.
pub struct Iter<'a, K, V> {
    buckets: std::slice::Iter<'a, Link<K, V>>,
    current: Option<&'a Entry<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (Option<&'a K>, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.current {
                self.current = entry.next.as_deref();
                self.remaining -= 1;
                return Some((entry.key.as_ref(), &entry.value));
            }
            self.current = self.buckets.next()?.as_deref();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            current: self.current,
            remaining: self.remaining,
        }
    }
}

/// Mutable iterator over the entries of a ChainMap.
pub struct IterMut<'a, K, V> {
    buckets: std::slice::IterMut<'a, Link<K, V>>,
    current: Option<&'a mut Entry<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (Option<&'a K>, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.current.take() {
                let Entry {
                    key, value, next, ..
                } = entry;
                self.current = next.as_deref_mut();
                self.remaining -= 1;
                return Some((key.as_ref(), value));
            }
            self.current = self.buckets.next()?.as_deref_mut();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Owning iterator; entries it never yields are freed chain by chain on drop.
pub struct IntoIter<K, V> {
    buckets: std::vec::IntoIter<Link<K, V>>,
    current: Link<K, V>,
    remaining: usize,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (Option<K>, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.current.take() {
                let Entry {
                    key, value, next, ..
                } = *entry;
                self.current = next;
                self.remaining -= 1;
                return Some((key, value));
            }
            self.current = self.buckets.next()?;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<K, V> Drop for IntoIter<K, V> {
    fn drop(&mut self) {
        drop_chain(self.current.take());
        for bucket in self.buckets.by_ref() {
            drop_chain(bucket);
        }
    }
}

/// Iterator over the keys of a ChainMap; `None` stands for the unkeyed slot.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = Option<&'a K>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// Iterator over the values of a ChainMap
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}
