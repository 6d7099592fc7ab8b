//! Typed record collections with memoized derived views.
//!
//! Views (`index_by`, `group_by`, `column`) are computed once per path and
//! cached on the collection. Mutations do NOT drop cached views: after
//! `attach`, `detach`, `merge`, `clear` or `sort_by`, call
//! [`TypedCollection::invalidate_views`] before reading views again.


use crate::{
    error::{CollectionError, RejectedRecord},
    key::{Key, KeyedMap},
    memo::{MemoCache, MemoKey},
    obs::sink::{self, MetricsEvent},
    path::Tree,
    record::{DynRecord, Record},
};
use serde::{Serialize, Serializer, ser::SerializeSeq};
use serde_json::{Map, Value};
use std::{cmp::Ordering, fmt, rc::Rc, slice};

const OP_INDEX_BY: &str = "index_by";
const OP_GROUP_BY: &str = "group_by";
const OP_COLUMN: &str = "column";

/// Groups keyed by the value found at a path, in order of first appearance.
pub type Groups<T> = KeyedMap<TypedCollection<T>>;

///
/// TypedCollection
///
/// Ordered sequence of shared records of one type.
/// Elements are `Rc<T>` so groups and indexes share them with the parent.
///

pub struct TypedCollection<T> {
    items: Vec<Rc<T>>,
    views: MemoCache,
}

impl<T: Record> TypedCollection<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            views: MemoCache::new(),
        }
    }

    pub fn from_records(records: impl IntoIterator<Item = T>) -> Self {
        records.into_iter().collect()
    }

    #[must_use]
    pub fn from_shared(items: Vec<Rc<T>>) -> Self {
        Self {
            items,
            views: MemoCache::new(),
        }
    }

    // ------------------------------------------------------------------
    // mutation
    // ------------------------------------------------------------------

    /// Append a record, returning the shared handle stored in the collection.
    pub fn attach(&mut self, item: T) -> Rc<T> {
        let item = Rc::new(item);
        self.items.push(Rc::clone(&item));

        item
    }

    /// Append an already shared record.
    pub fn attach_shared(&mut self, item: Rc<T>) {
        self.items.push(item);
    }

    /// Append a type-erased record, checking its type at runtime.
    ///
    /// A record of any other type is handed back inside the error and the
    /// collection is left unchanged.
    pub fn attach_dyn(&mut self, item: Box<dyn DynRecord>) -> Result<Rc<T>, RejectedRecord> {
        if !item.as_any().is::<T>() {
            sink::record(MetricsEvent::AttachRejected { expected: T::NAME });

            let error = CollectionError::TypeMismatch {
                expected: T::NAME,
                found: item.record_name(),
            };

            return Err(RejectedRecord::new(error, item));
        }

        let Ok(record) = item.into_any().downcast::<T>() else {
            unreachable!("record type checked above");
        };
        let record: Rc<T> = Rc::from(record);
        self.items.push(Rc::clone(&record));

        Ok(record)
    }

    /// Remove every element that is the same allocation as `item`.
    /// Returns how many elements were removed.
    pub fn detach(&mut self, item: &Rc<T>) -> usize {
        let before = self.items.len();
        self.items.retain(|existing| !Rc::ptr_eq(existing, item));

        before - self.items.len()
    }

    /// Append every element of `other`, in order. Mutates `self`.
    pub fn merge(&mut self, other: &Self) -> &mut Self {
        self.items.extend(other.items.iter().cloned());
        self
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Stable sort of the elements.
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.items.sort_by(|a, b| compare(a, b));
    }

    /// Drop all memoized views, returning how many were cached.
    pub fn invalidate_views(&self) -> usize {
        self.views.invalidate()
    }

    // ------------------------------------------------------------------
    // access
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<&Rc<T>> {
        self.items.first()
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Rc<T>> {
        self.items.get(position)
    }

    pub fn iter(&self) -> slice::Iter<'_, Rc<T>> {
        self.items.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Rc<T>] {
        &self.items
    }

    /// Number of memoized views currently held.
    #[must_use]
    pub fn cached_views(&self) -> usize {
        self.views.len()
    }

    // ------------------------------------------------------------------
    // views
    // ------------------------------------------------------------------

    /// Map from the value at `path` to the element holding it.
    ///
    /// Missing paths key as `Key::Int(0)`; an explicit null keys as
    /// `Key::Null`. On collisions the last element wins.
    pub fn index_by(&self, path: &str) -> Rc<KeyedMap<Rc<T>>> {
        let key = MemoKey::of(OP_INDEX_BY).arg(path).finish();

        self.views.get_or_compute(key, || {
            let mut index = KeyedMap::with_capacity(self.items.len());
            for item in &self.items {
                index.insert(index_key(item.as_ref(), path), Rc::clone(item));
            }

            index
        })
    }

    /// Partition elements into sub-collections keyed by the value at `path`.
    ///
    /// Missing and null values both key as `Key::Int(0)`. Groups keep the
    /// order in which their key first appeared; elements keep their
    /// relative order within a group.
    pub fn group_by(&self, path: &str) -> Rc<Groups<T>> {
        let key = MemoKey::of(OP_GROUP_BY).arg(path).finish();

        self.views
            .get_or_compute(key, || self.build_groups(path, |key| key))
    }

    /// Like [`TypedCollection::group_by`], passing each key through
    /// `transform` first. Not memoized.
    pub fn group_by_with<F>(&self, path: &str, transform: F) -> Groups<T>
    where
        F: Fn(Key) -> Key,
    {
        self.build_groups(path, transform)
    }

    /// Value at `path` for every element, in order. `None` marks elements
    /// where the path does not resolve.
    pub fn column(&self, path: &str) -> Rc<Vec<Option<Tree>>> {
        let key = MemoKey::of(OP_COLUMN).arg(path).finish();

        self.views.get_or_compute(key, || {
            self.items.iter().map(|item| item.value_at(path)).collect()
        })
    }

    /// Element whose value at `path` equals `key`, via the memoized index.
    pub fn get_item(&self, key: impl Into<Key>, path: &str) -> Option<Rc<T>> {
        self.index_by(path).get(&key.into()).cloned()
    }

    /// [`TypedCollection::get_item`], falling back to `default`.
    pub fn get_item_or(&self, key: impl Into<Key>, path: &str, default: Rc<T>) -> Rc<T> {
        self.get_item(key, path).unwrap_or(default)
    }

    // ------------------------------------------------------------------
    // serialization
    // ------------------------------------------------------------------

    /// Every element through [`Record::to_map`].
    #[must_use]
    pub fn to_array(&self) -> Vec<Map<String, Tree>> {
        self.items.iter().map(|item| item.to_map()).collect()
    }

    /// [`TypedCollection::to_array`] as one JSON array.
    #[must_use]
    pub fn to_tree(&self) -> Tree {
        Value::Array(self.to_array().into_iter().map(Value::Object).collect())
    }

    fn build_groups<F>(&self, path: &str, transform: F) -> Groups<T>
    where
        F: Fn(Key) -> Key,
    {
        let mut groups: Groups<T> = KeyedMap::new();

        for item in &self.items {
            let key = transform(group_key(item.as_ref(), path));

            match groups.get_mut(&key) {
                Some(group) => group.attach_shared(Rc::clone(item)),
                None => {
                    groups.insert(key, Self::from_shared(vec![Rc::clone(item)]));
                }
            }
        }

        groups
    }
}

fn index_key<T: Record>(item: &T, path: &str) -> Key {
    Key::from_resolved(item.value_at(path).as_ref())
}

fn group_key<T: Record>(item: &T, path: &str) -> Key {
    match item.value_at(path) {
        None | Some(Value::Null) => Key::MISSING,
        Some(value) => Key::from_tree(&value),
    }
}

impl<T: Record> Default for TypedCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

// clones share elements but start with an empty view cache
impl<T: Record> Clone for TypedCollection<T> {
    fn clone(&self) -> Self {
        Self::from_shared(self.items.clone())
    }
}

impl<T: Record + fmt::Debug> fmt::Debug for TypedCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedCollection")
            .field("items", &self.items)
            .field("views", &self.views)
            .finish()
    }
}

impl<T: Record> FromIterator<T> for TypedCollection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_shared(iter.into_iter().map(Rc::new).collect())
    }
}

impl<T: Record> Extend<T> for TypedCollection<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.items.extend(iter.into_iter().map(Rc::new));
    }
}

impl<'a, T: Record> IntoIterator for &'a TypedCollection<T> {
    type Item = &'a Rc<T>;
    type IntoIter = slice::Iter<'a, Rc<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Record> Serialize for TypedCollection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.items.len()))?;
        for item in &self.items {
            seq.serialize_element(&item.to_map())?;
        }

        seq.end()
    }
}
