use crate::path::Tree;
use serde::{Serialize, Serializer, ser::SerializeSeq};
use serde_json::{Number, Value};
use std::{collections::HashMap, fmt};

///
/// Key
///
/// Hashable projection of a tree value, used to key index and group views.
///
/// Integral numbers (including integral floats such as `2.0`) that fit `i64`
/// normalize to `Int`, so `1`, `1u64` and `1.0` are the same key. Other
/// numbers and composite values key as `Json`, holding their compact JSON
/// text. Distinct variants never compare or serialize equal.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Key {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Text(String),
    Json(String),
}

impl Key {
    /// Key used for elements whose path does not resolve.
    pub const MISSING: Self = Self::Int(0);

    /// Project a tree value onto a key.
    #[must_use]
    pub fn from_tree(value: &Tree) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::from_number(n),
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => Self::Json(value.to_string()),
        }
    }

    /// Project an optional resolved value, using [`Key::MISSING`] when absent.
    #[must_use]
    pub fn from_resolved(value: Option<&Tree>) -> Self {
        value.map_or(Self::MISSING, Self::from_tree)
    }

    /// Convert back into a tree value.
    #[must_use]
    pub fn to_tree(&self) -> Tree {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Uint(u) => Value::from(*u),
            Self::Text(s) => Value::String(s.clone()),
            Self::Json(text) => {
                serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone()))
            }
        }
    }

    // from_number
    // integral floats collapse onto the integer keys
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::float_cmp
    )]
    fn from_number(n: &Number) -> Self {
        if let Some(i) = n.as_i64() {
            return Self::Int(i);
        }
        if let Some(u) = n.as_u64() {
            return Self::from(u);
        }

        match n.as_f64() {
            Some(f) if f.trunc() == f && (I64_MIN_F..I64_END_F).contains(&f) => Self::Int(f as i64),
            Some(f) if f.trunc() == f && (0.0..U64_END_F).contains(&f) => Self::Uint(f as u64),
            _ => Self::Json(n.to_string()),
        }
    }
}

// i64::MIN is exactly representable; 2^63 and 2^64 are the exclusive ends
const I64_MIN_F: f64 = -9_223_372_036_854_775_808.0;
const I64_END_F: f64 = 9_223_372_036_854_775_808.0;
const U64_END_F: f64 = 18_446_744_073_709_551_616.0;

// renders the key's tree value as compact JSON, so `1` and `"1"` stay apart
impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(text) => f.write_str(text),
            other => write!(f, "{}", other.to_tree()),
        }
    }
}

impl From<&Tree> for Key {
    fn from(value: &Tree) -> Self {
        Self::from_tree(value)
    }
}

impl From<bool> for Key {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<u64> for Key {
    fn from(u: u64) -> Self {
        i64::try_from(u).map_or(Self::Uint(u), Self::Int)
    }
}

macro_rules! impl_key_from_int {
    ( $( $type:ty ),* $(,)? ) => {
        $(
            impl From<$type> for Key {
                fn from(n: $type) -> Self {
                    Self::Int(n.into())
                }
            }
        )*
    };
}

impl_key_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_tree().serialize(serializer)
    }
}

///
/// KeyedMap
///
/// Insertion-ordered map from `Key` to `V`.
/// Re-inserting an existing key replaces the value in place, keeping the
/// position where the key first appeared.
///
/// Serializes as a sequence of `[key, value]` pairs: keys of different
/// kinds may share a string rendering, so an object would merge them.
///

#[derive(Clone, Debug)]
pub struct KeyedMap<V> {
    entries: Vec<(Key, V)>,
    positions: HashMap<Key, usize>,
}

impl<V> KeyedMap<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
        }
    }

    /// Insert `value` under `key`, returning the value it replaced.
    pub fn insert(&mut self, key: Key, value: V) -> Option<V> {
        if let Some(&pos) = self.positions.get(&key) {
            return Some(std::mem::replace(&mut self.entries[pos].1, value));
        }

        self.positions.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));

        None
    }

    #[must_use]
    pub fn get(&self, key: &Key) -> Option<&V> {
        self.positions.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn get_mut(&mut self, key: &Key) -> Option<&mut V> {
        self.positions
            .get(key)
            .map(|&pos| &mut self.entries[pos].1)
    }

    #[must_use]
    pub fn contains_key(&self, key: &Key) -> bool {
        self.positions.contains_key(key)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<V> Default for KeyedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: PartialEq> PartialEq for KeyedMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<V> IntoIterator for KeyedMap<V> {
    type Item = (Key, V);
    type IntoIter = std::vec::IntoIter<(Key, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<V> FromIterator<(Key, V)> for KeyedMap<V> {
    fn from_iter<I: IntoIterator<Item = (Key, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }

        map
    }
}

impl<V: Serialize> Serialize for KeyedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            seq.serialize_element(&(key, value))?;
        }

        seq.end()
    }
}

///
/// TESTS
///
