//! Memoization of derived values, keyed by operation and arguments.
//!
//! Entries belong to the owning instance and live as long as it does.
//! Nothing is evicted implicitly: an owner whose content changes must call
//! [`MemoCache::invalidate`] before relying on cached values again.

use crate::obs::sink::{self, MetricsEvent};
use log::debug;
use std::{
    any::Any,
    cell::{Cell, RefCell},
    collections::HashMap,
    fmt,
    rc::Rc,
};
use xxhash_rust::xxh3::Xxh3;

///
/// MemoKey
///
/// Deterministic cache key: the operation tag plus an xxh3-64 digest over the
/// tag and its arguments. Arguments are length-prefixed, so `("ab", "c")` and
/// `("a", "bc")` never collide by construction.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct MemoKey {
    op: &'static str,
    digest: u64,
}

impl MemoKey {
    /// Start a key for operation `op`.
    #[must_use]
    pub fn of(op: &'static str) -> MemoKeyBuilder {
        MemoKeyBuilder::new(op)
    }

    #[must_use]
    pub const fn op(&self) -> &'static str {
        self.op
    }

    #[must_use]
    pub const fn digest(&self) -> u64 {
        self.digest
    }
}

///
/// MemoKeyBuilder
///

pub struct MemoKeyBuilder {
    op: &'static str,
    hasher: Xxh3,
}

impl MemoKeyBuilder {
    fn new(op: &'static str) -> Self {
        let mut builder = Self {
            op,
            hasher: Xxh3::new(),
        };
        builder.write(op.as_bytes());

        builder
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<[u8]>) -> Self {
        self.write(arg.as_ref());
        self
    }

    #[must_use]
    pub fn finish(self) -> MemoKey {
        MemoKey {
            op: self.op,
            digest: self.hasher.digest(),
        }
    }

    fn write(&mut self, bytes: &[u8]) {
        self.hasher.update(&(bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
    }
}

///
/// MemoStats
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MemoStats {
    pub hits: u64,
    pub misses: u64,
}

///
/// MemoCache
///
/// Key → value store that computes each key at most once.
///
/// An entry's presence in the map is the "already computed" flag; stored
/// values are never inspected, so empty or falsy results stay cached.
/// Not `Sync`: shared use across threads needs external synchronization.
///

#[derive(Default)]
pub struct MemoCache {
    entries: RefCell<HashMap<MemoKey, Rc<dyn Any>>>,
    stats: Cell<MemoStats>,
}

impl MemoCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the value cached under `key`, computing and storing it first if
    /// this key has not been computed yet.
    ///
    /// An entry stored under the same key with a different type counts as a
    /// miss and is replaced.
    pub fn get_or_compute<V, F>(&self, key: MemoKey, compute: F) -> Rc<V>
    where
        V: 'static,
        F: FnOnce() -> V,
    {
        if let Some(hit) = self.lookup::<V>(&key) {
            self.bump(|s| s.hits += 1);
            sink::record(MetricsEvent::MemoHit { op: key.op });

            return hit;
        }

        self.bump(|s| s.misses += 1);
        sink::record(MetricsEvent::MemoMiss { op: key.op });
        debug!("memo miss: {} ({:016x})", key.op, key.digest);

        // no borrow is held while computing, so `compute` may use this cache
        let value = Rc::new(compute());
        let erased: Rc<dyn Any> = Rc::clone(&value) as Rc<dyn Any>;
        self.entries.borrow_mut().insert(key, erased);

        value
    }

    #[must_use]
    pub fn contains(&self, key: &MemoKey) -> bool {
        self.entries.borrow().contains_key(key)
    }

    /// Drop every entry, returning how many were dropped.
    pub fn invalidate(&self) -> usize {
        let dropped = {
            let mut entries = self.entries.borrow_mut();
            let len = entries.len();
            entries.clear();
            len
        };

        if dropped > 0 {
            debug!("memo invalidated: {dropped} entries");
            sink::record(MetricsEvent::ViewsInvalidated {
                entries: dropped as u64,
            });
        }

        dropped
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> MemoStats {
        self.stats.get()
    }

    fn lookup<V: 'static>(&self, key: &MemoKey) -> Option<Rc<V>> {
        let entry = self.entries.borrow().get(key).cloned()?;

        entry.downcast::<V>().ok()
    }

    fn bump(&self, f: impl FnOnce(&mut MemoStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }
}

impl fmt::Debug for MemoCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoCache")
            .field("entries", &self.len())
            .field("stats", &self.stats())
            .finish()
    }
}

///
/// TESTS
///
