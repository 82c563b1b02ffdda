use crate::{
    error::{ErrorClass, ErrorDetail, ErrorOrigin, InternalError},
    model::field::FieldModel,
    value::Value,
};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// WriteError
///

#[derive(Debug, ThisError)]
pub enum WriteError {
    #[error("write to '{entity}' has no value for indexed field '{field}'")]
    MissingValue { entity: String, field: String },

    #[error("field '{field}' expects a record reference, found {found}")]
    ExpectedReference { field: String, found: &'static str },

    #[error("field '{field}' expects {expected}, found {found}")]
    KindMismatch {
        field: String,
        expected: String,
        found: &'static str,
    },

    #[error("update of '{entity}' row {index} has no primary key")]
    MissingKey { entity: String, index: usize },
}

impl WriteError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::MissingValue { .. } => ErrorClass::MissingValue,
            Self::ExpectedReference { .. } | Self::KindMismatch { .. } => ErrorClass::Unsupported,
            Self::MissingKey { .. } => ErrorClass::InvariantViolation,
        }
    }
}

impl From<WriteError> for InternalError {
    fn from(err: WriteError) -> Self {
        Self::with_detail(
            err.class(),
            ErrorOrigin::Write,
            err.to_string(),
            ErrorDetail::Write(err),
        )
    }
}

///
/// WriteKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WriteKind {
    /// Full rows; every declared field is expected.
    Insert,
    /// Partial rows keyed by primary key; absent fields are left untouched.
    Update,
}

///
/// WriteRow
///
/// Field values about to be persisted for one record.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WriteRow {
    pub key: Option<Value>,
    values: BTreeMap<String, Value>,
}

impl WriteRow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn keyed(key: impl Into<Value>) -> Self {
        Self {
            key: Some(key.into()),
            values: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(field.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn into_values(self) -> BTreeMap<String, Value> {
        self.values
    }

    /// Key of a relation field, whether written as a reference, a bare key,
    /// or through its raw-id column.
    #[must_use]
    pub fn relation_key(&self, field: &FieldModel) -> Option<Value> {
        if let Some(value) = self.values.get(&field.name) {
            return Some(value.clone().into_key());
        }

        field
            .raw_id_column()
            .and_then(|column| self.values.get(&column).cloned())
    }

    /// Assign a value to a declared field, checking it against the field kind.
    ///
    /// Relation fields only accept references here; bare keys go through
    /// [`Self::assign_raw_id`].
    pub fn assign(&mut self, field: &FieldModel, value: Value) -> Result<(), WriteError> {
        if !field.kind.admits(&value) {
            if field.kind.relation_target().is_some() {
                return Err(WriteError::ExpectedReference {
                    field: field.name.clone(),
                    found: value.label(),
                });
            }

            return Err(WriteError::KindMismatch {
                field: field.name.clone(),
                expected: field.kind.label(),
                found: value.label(),
            });
        }

        self.values.insert(field.name.clone(), value);
        Ok(())
    }

    /// Assign a bare key to a relation field through its `<field>_id` column.
    pub fn assign_raw_id(&mut self, field: &FieldModel, key: Value) -> Result<(), WriteError> {
        let Some(column) = field.raw_id_column() else {
            return Err(WriteError::KindMismatch {
                field: field.name.clone(),
                expected: field.kind.label(),
                found: key.label(),
            });
        };

        self.values.remove(&field.name);
        self.values.insert(column, key);
        Ok(())
    }
}

///
/// WriteSet
///
/// One insert or update call against one record type. Bulk writes carry
/// several rows; shadow values correspond to rows positionally.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WriteSet {
    pub entity: String,
    pub kind: WriteKind,
    pub rows: Vec<WriteRow>,
}

impl WriteSet {
    #[must_use]
    pub fn insert(entity: impl Into<String>, rows: Vec<WriteRow>) -> Self {
        Self {
            entity: entity.into(),
            kind: WriteKind::Insert,
            rows,
        }
    }

    #[must_use]
    pub fn update(entity: impl Into<String>, rows: Vec<WriteRow>) -> Self {
        Self {
            entity: entity.into(),
            kind: WriteKind::Update,
            rows,
        }
    }
}
