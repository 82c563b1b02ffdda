use derive_more::Display;
use serde::{Deserialize, Serialize};
use shadowdb_core::error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        Self::new(err.class.into(), err.origin.into(), err.message)
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    /// Registration or configuration was rejected; fix the declaration.
    Configuration,

    /// A write left out a value an index needs.
    MissingValue,

    NotFound,

    /// The store or rewrite cannot express the request.
    Unsupported,

    /// The caller cannot remediate this.
    Internal,
}

impl From<ErrorClass> for ErrorKind {
    fn from(class: ErrorClass) -> Self {
        match class {
            ErrorClass::Configuration => Self::Configuration,
            ErrorClass::MissingValue => Self::MissingValue,
            ErrorClass::NotFound => Self::NotFound,
            ErrorClass::Unsupported => Self::Unsupported,
            ErrorClass::InvariantViolation | ErrorClass::Internal => Self::Internal,
        }
    }
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Config,
    Registry,
    Schema,
    Write,
    Query,
    Store,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Config => Self::Config,
            CoreErrorOrigin::Registry => Self::Registry,
            CoreErrorOrigin::Schema => Self::Schema,
            CoreErrorOrigin::Write => Self::Write,
            CoreErrorOrigin::Query => Self::Query,
            CoreErrorOrigin::Store => Self::Store,
        }
    }
}
