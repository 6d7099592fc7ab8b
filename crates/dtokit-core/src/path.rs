//! Dotted-path lookup into decoded JSON trees.
//!
//! Lookups never fail: an unresolvable path yields [`Resolved::Missing`],
//! which is distinct from every tree value including `null`.

use convert_case::{Case, Casing};
use serde_json::Value;

/// Loosely structured input: objects, arrays and scalars.
pub type Tree = Value;

/// Path segment separator.
pub const SEPARATOR: char = '.';

///
/// Resolved
///
/// Outcome of a path lookup.
/// `Missing` is the absence sentinel; `Found(&Value::Null)` is a real value.
///

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Resolved<'a> {
    Found(&'a Tree),
    Missing,
}

impl<'a> Resolved<'a> {
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    #[must_use]
    pub const fn found(self) -> Option<&'a Tree> {
        match self {
            Self::Found(value) => Some(value),
            Self::Missing => None,
        }
    }

    #[must_use]
    pub fn cloned(self) -> Option<Tree> {
        self.found().cloned()
    }
}

/// Resolve `path` in `data`, retrying once with camelCase key segments when
/// the raw path is missing.
#[must_use]
pub fn resolve<'a>(data: &'a Tree, path: &str) -> Resolved<'a> {
    match resolve_exact(data, path) {
        Resolved::Missing => match camel_case_path(path) {
            Some(camel) => resolve_exact(data, &camel),
            None => Resolved::Missing,
        },
        found => found,
    }
}

/// Resolve `path` in `data` without any key normalization.
///
/// A key that exists verbatim in an object wins over splitting it on dots.
/// Otherwise the path is split at its last separator, the prefix is resolved
/// recursively and the final segment is looked up in the result.
#[must_use]
pub fn resolve_exact<'a>(data: &'a Tree, path: &str) -> Resolved<'a> {
    if path.is_empty() {
        return Resolved::Found(data);
    }

    let Some((head, tail)) = path.rsplit_once(SEPARATOR) else {
        return lookup(data, path);
    };

    if let Value::Object(map) = data
        && let Some(value) = map.get(path)
    {
        return Resolved::Found(value);
    }

    match resolve_exact(data, head) {
        Resolved::Found(parent) => lookup(parent, tail),
        Resolved::Missing => Resolved::Missing,
    }
}

/// Split a path into its first segment and the remainder.
/// The remainder is empty when the path has a single segment.
#[must_use]
pub fn split_head(path: &str) -> (&str, &str) {
    path.split_once(SEPARATOR).unwrap_or((path, ""))
}

/// Rewrite every key segment of `path` to camelCase.
///
/// Returns `None` when the rewrite would not change the path, so callers can
/// skip a redundant second lookup. Numeric segments are kept as indices.
#[must_use]
pub fn camel_case_path(path: &str) -> Option<String> {
    let camel = path
        .split(SEPARATOR)
        .map(|segment| {
            if is_index(segment) {
                segment.to_string()
            } else {
                segment.to_case(Case::Camel)
            }
        })
        .collect::<Vec<_>>()
        .join(".");

    (camel != path).then_some(camel)
}

// lookup
// one segment against one node
fn lookup<'a>(node: &'a Tree, segment: &str) -> Resolved<'a> {
    let found = match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get(index)),
        _ => None,
    };

    found.map_or(Resolved::Missing, Resolved::Found)
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn sample() -> Tree {
        json!({
            "guid": "a1",
            "owner": [{ "_name": "Ann" }, { "_name": "Bob" }],
            "parent": { "id": 7, "parent_id": null },
            "parentId": 5,
            "a.b": "literal",
            "a": { "b": "nested" },
            "flags": { "zero": 0, "off": false, "empty": "" },
        })
    }

    #[test]
    fn resolves_keys_and_indices() {
        let data = sample();

        assert_eq!(resolve_exact(&data, "guid").cloned(), Some(json!("a1")));
        assert_eq!(resolve_exact(&data, "owner.1._name").cloned(), Some(json!("Bob")));
        assert_eq!(resolve_exact(&data, "parent.id").cloned(), Some(json!(7)));
    }

    #[test]
    fn missing_segments_yield_missing() {
        let data = sample();

        assert!(resolve_exact(&data, "nope").is_missing());
        assert!(resolve_exact(&data, "owner.9._name").is_missing());
        assert!(resolve_exact(&data, "owner.x").is_missing());
        assert!(resolve_exact(&data, "guid.inner").is_missing());
    }

    #[test]
    fn empty_path_is_the_root() {
        let data = sample();
        assert_eq!(resolve_exact(&data, ""), Resolved::Found(&data));
    }

    #[test]
    fn explicit_null_is_found_not_missing() {
        let data = sample();
        assert_eq!(
            resolve_exact(&data, "parent.parent_id"),
            Resolved::Found(&Value::Null)
        );
    }

    #[test]
    fn falsy_values_are_found() {
        let data = sample();

        assert_eq!(resolve(&data, "flags.zero").cloned(), Some(json!(0)));
        assert_eq!(resolve(&data, "flags.off").cloned(), Some(json!(false)));
        assert_eq!(resolve(&data, "flags.empty").cloned(), Some(json!("")));
    }

    #[test]
    fn verbatim_dotted_key_wins_over_split() {
        let data = sample();
        assert_eq!(resolve_exact(&data, "a.b").cloned(), Some(json!("literal")));
    }

    #[test]
    fn camel_case_fallback_applies_when_raw_path_missing() {
        let data = sample();

        assert_eq!(resolve(&data, "parent_id").cloned(), Some(json!(5)));
        assert!(resolve_exact(&data, "parent_id").is_missing());
    }

    #[test]
    fn null_does_not_trigger_camel_case_fallback() {
        let data = json!({ "parent_id": null, "parentId": 5 });
        assert_eq!(resolve(&data, "parent_id").cloned(), Some(Value::Null));
    }

    #[test]
    fn camel_case_path_rewrites_key_segments_only() {
        assert_eq!(camel_case_path("parent_id").as_deref(), Some("parentId"));
        assert_eq!(
            camel_case_path("owner_list.0.first_name").as_deref(),
            Some("ownerList.0.firstName")
        );
        assert_eq!(camel_case_path("parentId"), None);
        assert_eq!(camel_case_path("id"), None);
    }

    #[test]
    fn split_head_separates_first_segment() {
        assert_eq!(split_head("address.city"), ("address", "city"));
        assert_eq!(split_head("id"), ("id", ""));
    }

    fn arb_scalar() -> impl Strategy<Value = Tree> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-z]{0,6}".prop_map(Value::String),
        ]
    }

    proptest! {
        #[test]
        fn present_keys_always_resolve_to_their_value(
            entries in prop::collection::btree_map("[a-z]{1,6}", arb_scalar(), 1..8)
        ) {
            let data = Value::Object(entries.clone().into_iter().collect());

            for (key, value) in &entries {
                prop_assert_eq!(resolve(&data, key), Resolved::Found(value));
            }
        }

        #[test]
        fn absent_keys_never_resolve(
            entries in prop::collection::btree_map("[a-z]{1,6}", arb_scalar(), 0..8),
            absent in "[a-z]{1,6}",
        ) {
            prop_assume!(!entries.contains_key(&absent));
            let data = Value::Object(entries.into_iter().collect());
            prop_assert!(resolve(&data, &absent).is_missing());
        }

        #[test]
        fn array_indices_resolve_in_bounds_only(
            items in prop::collection::vec(arb_scalar(), 0..6),
            index in 0usize..10,
        ) {
            let data = json!({ "items": items.clone() });
            let resolved = resolve(&data, &format!("items.{index}"));

            match items.get(index) {
                Some(value) => prop_assert_eq!(resolved, Resolved::Found(value)),
                None => prop_assert!(resolved.is_missing()),
            }
        }
    }
}
