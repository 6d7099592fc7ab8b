use crate::{
    error::HydrationError,
    mapping::FieldMapping,
    path::{self, Tree},
};
use derive_more::{Deref, IntoIterator};
use serde_json::Map;
use std::any::Any;

///
/// FieldSet
///
/// Ordered, duplicate-free list of field names.
///

#[derive(Clone, Debug, Default, Deref, Eq, IntoIterator, PartialEq)]
pub struct FieldSet(#[into_iterator(owned, ref)] Vec<String>);

impl FieldSet {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append `field` unless it is already present.
    pub fn insert(&mut self, field: impl Into<String>) -> bool {
        let field = field.into();
        if self.contains(&field) {
            return false;
        }
        self.0.push(field);

        true
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|f| f == field)
    }
}

impl<S: Into<String>> FromIterator<S> for FieldSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for field in iter {
            set.insert(field);
        }

        set
    }
}

///
/// Presence
///
/// Which fields of a record carry real data.
///
/// Untracked → the record was built in code; every declared field counts.
/// Tracked   → the record was hydrated; only the listed fields were found.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Presence {
    #[default]
    Untracked,
    Tracked(FieldSet),
}

impl Presence {
    #[must_use]
    pub const fn tracked() -> Self {
        Self::Tracked(FieldSet::new())
    }

    #[must_use]
    pub const fn is_tracked(&self) -> bool {
        matches!(self, Self::Tracked(_))
    }

    /// Record `field` as populated, switching to tracked mode if needed.
    pub fn mark(&mut self, field: impl Into<String>) {
        match self {
            Self::Tracked(set) => {
                set.insert(field);
            }
            Self::Untracked => {
                let mut set = FieldSet::new();
                set.insert(field);
                *self = Self::Tracked(set);
            }
        }
    }

    #[must_use]
    pub const fn fields(&self) -> Option<&FieldSet> {
        match self {
            Self::Tracked(set) => Some(set),
            Self::Untracked => None,
        }
    }
}

///
/// Assignment
///
/// Result of routing one value into a record.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Assignment {
    /// Stored into a field or passed to a setter.
    Assigned,
    /// No field or setter answers to the target name.
    Ignored,
}

///
/// Record
///
/// A typed entity that can be hydrated from a tree and serialized back to
/// exactly the fields that were present.
///
/// Usually implemented with `#[derive(Record)]`, which generates the
/// assignment table (field first, then setter, otherwise ignored).
///

pub trait Record: Sized + 'static {
    /// Type name used in diagnostics and by the registry.
    const NAME: &'static str;

    /// Declared fields, in declaration order.
    const FIELDS: &'static [&'static str];

    /// A fresh instance with every field at its blank value.
    fn blank() -> Self;

    /// Route `value` into the field or setter named `field`.
    fn assign(&mut self, field: &str, value: Tree) -> Result<Assignment, HydrationError>;

    /// Current value of `field` as a tree, if it is readable.
    fn field_value(&self, field: &str) -> Option<Tree>;

    fn presence(&self) -> &Presence;

    fn presence_mut(&mut self) -> &mut Presence;

    // ------------------------------------------------------------------
    // provided
    // ------------------------------------------------------------------

    #[must_use]
    fn declared_fields() -> &'static [&'static str] {
        Self::FIELDS
    }

    /// Mapping that reads every declared field from the same-named path.
    #[must_use]
    fn default_mapping() -> FieldMapping {
        FieldMapping::from_names(Self::FIELDS.iter().copied())
    }

    /// Fields populated by hydration, or `None` for untracked records.
    #[must_use]
    fn populated_fields(&self) -> Option<&FieldSet> {
        self.presence().fields()
    }

    #[must_use]
    fn is_populated(&self, field: &str) -> bool {
        self.populated_fields().is_some_and(|set| set.contains(field))
    }

    /// Fields emitted by [`Record::to_map`].
    #[must_use]
    fn serialized_fields(&self) -> Vec<&str> {
        match self.presence() {
            Presence::Tracked(set) => set.iter().map(String::as_str).collect(),
            Presence::Untracked => Self::FIELDS.to_vec(),
        }
    }

    /// Serialize the record to a map holding only its serialized fields.
    /// Names without a readable value are skipped.
    #[must_use]
    fn to_map(&self) -> Map<String, Tree> {
        self.serialized_fields()
            .into_iter()
            .filter_map(|field| Some((field.to_string(), self.field_value(field)?)))
            .collect()
    }

    /// Resolve a dotted path whose first segment names a field.
    #[must_use]
    fn value_at(&self, path: &str) -> Option<Tree> {
        let (field, rest) = path::split_head(path);
        let value = self.field_value(field)?;

        if rest.is_empty() {
            Some(value)
        } else {
            path::resolve_exact(&value, rest).cloned()
        }
    }
}

///
/// DynRecord
///
/// Object-safe view of a record, for callers that only know a type by name.
///

pub trait DynRecord: Any {
    fn record_name(&self) -> &'static str;

    fn serialize_map(&self) -> Map<String, Tree>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Record> DynRecord for T {
    fn record_name(&self) -> &'static str {
        T::NAME
    }

    fn serialize_map(&self) -> Map<String, Tree> {
        self.to_map()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Brand;
    use serde_json::{Value, json};

    #[test]
    fn field_set_dedupes_in_insertion_order() {
        let set: FieldSet = ["b", "a", "b"].into_iter().collect();
        assert_eq!(set.iter().map(String::as_str).collect::<Vec<_>>(), vec!["b", "a"]);
        assert!(set.contains("a"));
        assert!(!set.contains("c"));
    }

    #[test]
    fn marking_an_untracked_presence_starts_tracking() {
        let mut presence = Presence::default();
        assert!(!presence.is_tracked());

        presence.mark("id");
        assert_eq!(presence.fields().map(|set| set.len()), Some(1));
    }

    #[test]
    fn untracked_records_serialize_all_declared_fields() {
        let brand = Brand {
            id: 4,
            name: "Acme".to_string(),
            ..Brand::blank()
        };

        let map = brand.to_map();
        assert_eq!(
            map.keys().map(String::as_str).collect::<Vec<_>>(),
            Brand::FIELDS.to_vec()
        );
        assert_eq!(map["id"], json!(4));
    }

    #[test]
    fn tracked_records_serialize_populated_fields_only() {
        let mut brand = Brand::blank();
        brand.name = "Acme".to_string();
        brand.presence_mut().mark("name");

        assert_eq!(Value::Object(brand.to_map()), json!({ "name": "Acme" }));
    }

    #[test]
    fn tracked_but_empty_records_serialize_nothing() {
        let mut brand = Brand::blank();
        *brand.presence_mut() = Presence::tracked();

        assert!(brand.to_map().is_empty());
    }

    #[test]
    fn value_at_descends_into_field_trees() {
        let brand = Brand {
            meta: json!({ "tags": ["a", "b"] }),
            ..Brand::blank()
        };

        assert_eq!(brand.value_at("meta.tags.1"), Some(json!("b")));
        assert_eq!(brand.value_at("meta.nope"), None);
        assert_eq!(brand.value_at("unknown"), None);
    }
}
