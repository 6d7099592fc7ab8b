//! Hydration: building typed records from loosely structured trees.
//!
//! A [`Hydrator`] walks its [`FieldMapping`] in order, resolves each source
//! against the input and routes found values through [`Record::assign`].
//! Only targets that actually received a value end up in the record's
//! populated set.

mod registry;

#[cfg(test)]
mod tests;

use crate::{
    collection::TypedCollection,
    error::HydrationError,
    mapping::{FieldMapping, Source},
    obs::sink::{self, MetricsEvent},
    path::{self, Resolved, Tree},
    record::{Assignment, FieldSet, Presence, Record},
};
use log::warn;
use serde_json::Value;

// re-exports
pub use registry::RecordRegistry;

///
/// HydratorOptions
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HydratorOptions {
    /// Retry missing paths with camelCase key segments.
    pub camel_case_fallback: bool,
}

impl Default for HydratorOptions {
    fn default() -> Self {
        Self {
            camel_case_fallback: true,
        }
    }
}

///
/// Hydrator
///

#[derive(Clone, Debug, Default)]
pub struct Hydrator {
    mapping: FieldMapping,
    options: HydratorOptions,
}

impl Hydrator {
    #[must_use]
    pub fn new(mapping: FieldMapping) -> Self {
        Self {
            mapping,
            options: HydratorOptions::default(),
        }
    }

    /// Hydrator using the record's default (identity) mapping.
    #[must_use]
    pub fn for_record<T: Record>() -> Self {
        Self::new(T::default_mapping())
    }

    #[must_use]
    pub fn with_options(mut self, options: HydratorOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub const fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    #[must_use]
    pub const fn options(&self) -> HydratorOptions {
        self.options
    }

    /// Build one `T` from `data`.
    ///
    /// Missing paths and "no value" compute results leave their field blank
    /// and unpopulated. A value that cannot be converted into its field's
    /// type fails the whole record.
    pub fn hydrate<T: Record>(&self, data: &Tree) -> Result<T, HydrationError> {
        let mut record = T::blank();
        let mut populated = FieldSet::new();
        let mut skipped = 0u64;

        for (target, source) in self.mapping.iter() {
            let Some(value) = self.source_value(data, source) else {
                skipped += 1;
                continue;
            };

            match record.assign(target, value) {
                Ok(Assignment::Assigned) => {
                    populated.insert(target);
                }
                Ok(Assignment::Ignored) => skipped += 1,
                Err(err) => {
                    sink::record(MetricsEvent::HydrateFailed { record: T::NAME });
                    return Err(err);
                }
            }
        }

        sink::record(MetricsEvent::HydrateFinish {
            record: T::NAME,
            populated: populated.len() as u64,
            skipped,
        });
        *record.presence_mut() = Presence::Tracked(populated);

        Ok(record)
    }

    /// Build one `T`, logging and discarding a failure.
    #[must_use]
    pub fn hydrate_or_log<T: Record>(&self, data: &Tree) -> Option<T> {
        match self.hydrate(data) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!("{} hydration skipped: {err}", T::NAME);
                None
            }
        }
    }

    /// Hydrate every item, skipping (and logging) the ones that fail.
    pub fn hydrate_many<'a, T, I>(&self, items: I) -> TypedCollection<T>
    where
        T: Record,
        I: IntoIterator<Item = &'a Tree>,
    {
        items
            .into_iter()
            .filter_map(|item| self.hydrate_or_log(item))
            .collect()
    }

    // source_value
    // None means "absent": the target is neither assigned nor populated
    fn source_value(&self, data: &Tree, source: &Source) -> Option<Tree> {
        match source {
            Source::Compute(compute) => {
                let value = compute(data);
                (!is_no_value(&value)).then_some(value)
            }
            Source::Path(p) => {
                let resolved = if self.options.camel_case_fallback {
                    path::resolve(data, p)
                } else {
                    path::resolve_exact(data, p)
                };

                match resolved {
                    Resolved::Found(value) => Some(value.clone()),
                    Resolved::Missing => None,
                }
            }
        }
    }
}

/// "No value" rule for compute results: null, false, numeric zero, and empty
/// strings, arrays and objects.
///
/// Path lookups never use this rule; a found `0` or `false` is a real value.
#[must_use]
pub fn is_no_value(value: &Tree) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

///
/// HydrateExt
///
/// Constructor-style entry points on every record type.
///

pub trait HydrateExt: Record {
    /// Hydrate with the record's default mapping.
    fn hydrate(data: &Tree) -> Result<Self, HydrationError> {
        Hydrator::for_record::<Self>().hydrate(data)
    }

    /// Hydrate with an explicit mapping.
    fn hydrate_with(data: &Tree, mapping: FieldMapping) -> Result<Self, HydrationError> {
        Hydrator::new(mapping).hydrate(data)
    }
}

impl<T: Record> HydrateExt for T {}
