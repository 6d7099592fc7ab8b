use crate::record::DynRecord;
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Top-level error for callers that want a single error type across the
/// hydration and collection surfaces.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Hydration(#[from] HydrationError),

    #[error(transparent)]
    Collection(#[from] CollectionError),
}

///
/// HydrationError
///
/// Failures while building one record from a tree.
/// Batch helpers recover from these (log + skip); single-record calls return them.
///

#[derive(Debug, ThisError)]
pub enum HydrationError {
    #[error("unknown record type: '{type_name}'")]
    UnknownType { type_name: String },

    #[error("cannot assign field '{field}' on {record}: {source}")]
    Field {
        record: &'static str,
        field: String,
        #[source]
        source: serde_json::Error,
    },
}

impl HydrationError {
    /// Construct a field-conversion failure for one record field.
    pub fn field(record: &'static str, field: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Field {
            record,
            field: field.into(),
            source,
        }
    }

    /// Construct an unknown-type failure for a registry lookup.
    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        Self::UnknownType {
            type_name: type_name.into(),
        }
    }

    /// Name of the field that failed, when the failure is field-scoped.
    #[must_use]
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Self::Field { field, .. } => Some(field.as_str()),
            Self::UnknownType { .. } => None,
        }
    }
}

///
/// CollectionError
///
/// Checked failures of typed collections.
/// Lookups never fail; only element-type violations do.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CollectionError {
    #[error("collection element must be an instance of {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

///
/// RejectedRecord
///
/// A type-erased record that a collection refused, handed back to the caller
/// together with the reason.
///

#[derive(ThisError)]
#[error("{error}")]
pub struct RejectedRecord {
    error: CollectionError,
    record: Box<dyn DynRecord>,
}

impl RejectedRecord {
    #[must_use]
    pub fn new(error: CollectionError, record: Box<dyn DynRecord>) -> Self {
        Self { error, record }
    }

    #[must_use]
    pub const fn error(&self) -> &CollectionError {
        &self.error
    }

    #[must_use]
    pub fn record(&self) -> &dyn DynRecord {
        self.record.as_ref()
    }

    #[must_use]
    pub fn into_record(self) -> Box<dyn DynRecord> {
        self.record
    }

    #[must_use]
    pub fn into_parts(self) -> (CollectionError, Box<dyn DynRecord>) {
        (self.error, self.record)
    }
}

impl fmt::Debug for RejectedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RejectedRecord")
            .field("error", &self.error)
            .field("record", &self.record.record_name())
            .finish()
    }
}

impl From<RejectedRecord> for Error {
    fn from(rejected: RejectedRecord) -> Self {
        Self::Collection(rejected.error)
    }
}

///
/// TESTS
///
