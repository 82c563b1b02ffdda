use crate::{
    db::{query::Query, write::WriteSet},
    error::{ErrorClass, ErrorDetail, ErrorOrigin, InternalError},
    model::{entity::EntityModel, field::FieldModel},
    value::Value,
};
use thiserror::Error as ThisError;

///
/// SchemaError
///

#[derive(Debug, ThisError)]
pub enum SchemaError {
    #[error("record type '{0}' not found")]
    EntityNotFound(String),

    #[error("field '{field}' not found on record type '{entity}'")]
    FieldNotFound { entity: String, field: String },

    #[error("field '{field}' on record type '{entity}' already exists with a different shape")]
    FieldConflict { entity: String, field: String },
}

impl SchemaError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::EntityNotFound(_) | Self::FieldNotFound { .. } => ErrorClass::NotFound,
            Self::FieldConflict { .. } => ErrorClass::Configuration,
        }
    }
}

impl From<SchemaError> for InternalError {
    fn from(err: SchemaError) -> Self {
        Self::with_detail(
            err.class(),
            ErrorOrigin::Schema,
            err.to_string(),
            ErrorDetail::Schema(err),
        )
    }
}

///
/// SchemaCatalog
///
/// Schema introspection and additive mutation provided by the host.
///

pub trait SchemaCatalog {
    /// Snapshot of a record type's current declaration.
    fn entity(&self, path: &str) -> Result<EntityModel, InternalError>;

    /// Resolve one field, signalling `FieldNotFound` when absent.
    fn field(&self, entity: &str, field: &str) -> Result<FieldModel, InternalError>;

    /// Add a field to a record type.
    ///
    /// Idempotent: returns `Ok(false)` when an identical field already exists.
    fn add_field(&self, entity: &str, field: FieldModel) -> Result<bool, InternalError>;
}

///
/// QueryExecutor
///
/// Synchronous exact/range/membership execution provided by the host.
///

pub trait QueryExecutor {
    /// Execute a lowered query and return matching primary keys in key order.
    fn select_keys(&self, query: &Query) -> Result<Vec<Value>, InternalError>;

    /// Load one stored field of one record; `None` when the record is absent.
    fn load_field(
        &self,
        entity: &str,
        key: &Value,
        field: &str,
    ) -> Result<Option<Value>, InternalError>;
}

///
/// RecordStore
///
/// Persistence of converted write sets.
///

pub trait RecordStore {
    /// Persist a write set and return the keys it touched, positionally.
    fn persist(&self, write: WriteSet) -> Result<Vec<Value>, InternalError>;
}

///
/// Host
///
/// Everything the engine needs from the host to register, convert, and rewrite.
///

pub trait Host: SchemaCatalog + QueryExecutor {}

impl<T: SchemaCatalog + QueryExecutor + ?Sized> Host for T {}
