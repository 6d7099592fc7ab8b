//! ## Crate layout
//! - `collection`: typed record collections and their memoized views.
//! - `error`: hydration and collection error types.
//! - `hydrate`: the hydrator, its options and the by-name record registry.
//! - `key`: hashable view keys and the insertion-ordered map they index.
//! - `mapping`: target field → source tables.
//! - `memo`: the per-collection view cache.
//! - `obs`: thread-local counters and scoped metrics sinks.
//! - `path`: dotted-path resolution with camelCase fallback.
//! - `record`: the `Record` trait, presence tracking and `#[derive(Record)]`.
//!
//! The `prelude` module carries the vocabulary needed to declare, hydrate
//! and collect records.

pub use dtokit_core::{collection, error, hydrate, key, mapping, memo, obs, path};

/// Record trait, presence tracking and the derive, under one path.
pub mod record {
    pub use dtokit_core::record::*;
    pub use dtokit_derive::Record;
}

// export so generated code resolves inside this crate's own tests
extern crate self as dtokit;

/// re-exports
///
/// macros can use these, stops the user having to specify all the dependencies
/// in the Cargo.toml file manually
#[doc(hidden)]
pub mod __reexports {
    pub use serde_json;
}

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use dtokit_core::Error;
pub use dtokit_derive::Record;

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::{
        collection::TypedCollection,
        hydrate::{HydrateExt as _, Hydrator, HydratorOptions, RecordRegistry},
        key::{Key, KeyedMap},
        mapping::{FieldMapping, Source},
        path::Tree,
        record::{Presence, Record},
    };
    pub use serde_json::json;
}
