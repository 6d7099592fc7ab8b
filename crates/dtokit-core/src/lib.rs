//! Core runtime for dtokit: path resolution, record hydration, typed
//! collections with memoized views, and the observability counters behind
//! them.
#![warn(unreachable_pub)]

extern crate self as dtokit;

// public exports are one module level down
pub mod collection;
pub mod error;
pub mod hydrate;
pub mod key;
pub mod mapping;
pub mod memo;
pub mod obs;
pub mod path;
pub mod record;

// test
#[cfg(test)]
pub(crate) mod test_support;

/// re-exports
///
/// generated `Record` impls reach serde_json through here so callers do not
/// have to depend on it directly
#[doc(hidden)]
pub mod __reexports {
    pub use serde_json;
}

// re-exports
pub use error::Error;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// Traits are imported as `_` so they never shadow derive macros.
///

pub mod prelude {
    pub use crate::{
        collection::TypedCollection,
        hydrate::{HydrateExt as _, Hydrator, HydratorOptions},
        key::{Key, KeyedMap},
        mapping::{FieldMapping, Source},
        path::Tree,
        record::{Presence, Record as _},
    };
}
