use crate::path::Tree;
use std::{fmt, sync::Arc};

/// Pure function deriving one field value from the whole input tree.
pub type ComputeFn = Arc<dyn Fn(&Tree) -> Tree + Send + Sync>;

///
/// Source
///
/// Where a target field takes its value from.
///

#[derive(Clone)]
pub enum Source {
    Path(String),
    Compute(ComputeFn),
}

impl Source {
    #[must_use]
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }

    pub fn compute<F>(f: F) -> Self
    where
        F: Fn(&Tree) -> Tree + Send + Sync + 'static,
    {
        Self::Compute(Arc::new(f))
    }

    #[must_use]
    pub fn as_path(&self) -> Option<&str> {
        match self {
            Self::Path(path) => Some(path.as_str()),
            Self::Compute(_) => None,
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Compute(_) => f.write_str("Compute(..)"),
        }
    }
}

impl From<&str> for Source {
    fn from(path: &str) -> Self {
        Self::path(path)
    }
}

impl From<String> for Source {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

///
/// FieldMapping
///
/// Ordered table of target field → source.
///
/// Inserting a target that already exists replaces its source but keeps the
/// position it was first inserted at, so hydration order stays stable.
///

#[derive(Clone, Debug, Default)]
pub struct FieldMapping {
    entries: Vec<(String, Source)>,
}

impl FieldMapping {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Identity mapping: each name is both the target and the path.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .map(|name| {
                let name = name.into();
                (name.clone(), Source::Path(name))
            })
            .collect()
    }

    /// Builder form of [`FieldMapping::insert`] for a path source.
    #[must_use]
    pub fn path(mut self, target: impl Into<String>, path: impl Into<String>) -> Self {
        self.insert(target, Source::path(path));
        self
    }

    /// Builder form of [`FieldMapping::insert`] for a computed source.
    #[must_use]
    pub fn compute<F>(mut self, target: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Tree) -> Tree + Send + Sync + 'static,
    {
        self.insert(target, Source::compute(f));
        self
    }

    /// Insert or replace the source for `target`.
    pub fn insert(&mut self, target: impl Into<String>, source: Source) -> Option<Source> {
        let target = target.into();

        match self.entries.iter_mut().find(|(t, _)| *t == target) {
            Some((_, existing)) => Some(std::mem::replace(existing, source)),
            None => {
                self.entries.push((target, source));
                None
            }
        }
    }

    #[must_use]
    pub fn get(&self, target: &str) -> Option<&Source> {
        self.entries
            .iter()
            .find_map(|(t, source)| (t == target).then_some(source))
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(t, _)| t.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Source)> {
        self.entries.iter().map(|(t, source)| (t.as_str(), source))
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T, S> FromIterator<(T, S)> for FieldMapping
where
    T: Into<String>,
    S: Into<Source>,
{
    fn from_iter<I: IntoIterator<Item = (T, S)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (target, source) in iter {
            mapping.insert(target, source.into());
        }

        mapping
    }
}

///
/// TESTS
///
