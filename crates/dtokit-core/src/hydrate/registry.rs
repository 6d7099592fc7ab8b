use crate::{
    error::HydrationError,
    hydrate::Hydrator,
    mapping::FieldMapping,
    obs::sink::{self, MetricsEvent},
    path::Tree,
    record::{DynRecord, Record},
};
use log::warn;
use std::collections::BTreeMap;

type HydrateFn = fn(&Hydrator, &Tree) -> Result<Box<dyn DynRecord>, HydrationError>;

///
/// RegistryEntry
///

#[derive(Clone, Copy)]
struct RegistryEntry {
    hydrate: HydrateFn,
    default_mapping: fn() -> FieldMapping,
}

///
/// RecordRegistry
///
/// Hydration entry points for record types addressed by name.
///

#[derive(Clone, Default)]
pub struct RecordRegistry {
    entries: BTreeMap<&'static str, RegistryEntry>,
}

impl RecordRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under `T::NAME`, replacing any earlier registration.
    pub fn register<T: Record>(&mut self) -> &mut Self {
        self.entries.insert(
            T::NAME,
            RegistryEntry {
                hydrate: hydrate_boxed::<T>,
                default_mapping: T::default_mapping,
            },
        );

        self
    }

    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Hydrate the type registered as `type_name`, using `mapping` or the
    /// type's default mapping.
    pub fn hydrate(
        &self,
        type_name: &str,
        data: &Tree,
        mapping: Option<&FieldMapping>,
    ) -> Result<Box<dyn DynRecord>, HydrationError> {
        let Some(entry) = self.entries.get(type_name) else {
            sink::record(MetricsEvent::HydrateFailed { record: "unknown" });
            return Err(HydrationError::unknown_type(type_name));
        };

        let hydrator = match mapping {
            Some(mapping) => Hydrator::new(mapping.clone()),
            None => Hydrator::new((entry.default_mapping)()),
        };

        (entry.hydrate)(&hydrator, data)
    }

    /// Like [`RecordRegistry::hydrate`], logging and discarding a failure.
    #[must_use]
    pub fn hydrate_or_log(
        &self,
        type_name: &str,
        data: &Tree,
        mapping: Option<&FieldMapping>,
    ) -> Option<Box<dyn DynRecord>> {
        match self.hydrate(type_name, data, mapping) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!("{type_name} hydration skipped: {err}");
                None
            }
        }
    }
}

fn hydrate_boxed<T: Record>(
    hydrator: &Hydrator,
    data: &Tree,
) -> Result<Box<dyn DynRecord>, HydrationError> {
    let record = hydrator.hydrate::<T>(data)?;

    Ok(Box::new(record))
}
