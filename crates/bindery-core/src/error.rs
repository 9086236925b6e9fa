use crate::{backend::BackendError, config::ConfigError};
use bindery_primitives::DbTypeCode;
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Every failure surfaced by the binding and schema layer. Nothing is
/// retried internally; callers decide whether to abort the surrounding
/// transaction.
///

#[remain::sorted]
#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("incompatible schema change on column '{table}.{column}': {message}")]
    IncompatibleSchemaChange {
        table: String,
        column: String,
        message: String,
    },

    #[error("instance is not of type '{expected}'")]
    InstanceTypeMismatch { expected: &'static str },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("schema and code disagree on '{type_name}': {message}")]
    SchemaCodeMismatch { type_name: String, message: String },

    #[error("cannot read a {from} property as {to}")]
    UnsupportedConversion { from: DbTypeCode, to: DbTypeCode },

    #[error(
        "type '{type_name}' is already materialized as a different type; type refactoring is not supported"
    )]
    UnsupportedTypeRefactoring { type_name: String },
}

impl Error {
    pub(crate) fn schema_mismatch(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaCodeMismatch {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    pub(crate) fn incompatible_change(
        table: impl Into<String>,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::IncompatibleSchemaChange {
            table: table.into(),
            column: column.into(),
            message: message.into(),
        }
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }

    /// Stable classification of this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Backend(_) => ErrorClass::Backend,
            Self::Config(_) => ErrorClass::Config,
            Self::IncompatibleSchemaChange { .. } => ErrorClass::Conflict,
            Self::InstanceTypeMismatch { .. } | Self::SchemaCodeMismatch { .. } => {
                ErrorClass::Mismatch
            }
            Self::InvariantViolation(_) => ErrorClass::InvariantViolation,
            Self::UnsupportedConversion { .. } | Self::UnsupportedTypeRefactoring { .. } => {
                ErrorClass::Unsupported
            }
        }
    }
}

///
/// ErrorClass
///
/// Coarse error category. `Mismatch` and `Conflict` are schema-level and
/// fatal to the load that raised them.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorClass {
    Backend,
    Config,
    Conflict,
    InvariantViolation,
    Mismatch,
    Unsupported,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Backend => "backend",
            Self::Config => "config",
            Self::Conflict => "conflict",
            Self::InvariantViolation => "invariant_violation",
            Self::Mismatch => "mismatch",
            Self::Unsupported => "unsupported",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///
