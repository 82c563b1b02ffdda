//! In-memory reference host.
//!
//! Behaves like the flat key-value stores the engine targets: records are
//! keyed maps, and the executor evaluates only exact, prefix, range,
//! membership, and null lookups. Joins are off unless requested.

mod eval;


use crate::{
    db::{
        RecordStore, SchemaCatalog, SchemaError,
        write::{WriteError, WriteKind, WriteSet},
    },
    error::InternalError,
    model::{
        entity::EntityModel,
        field::{FieldKind, FieldModel},
    },
    value::Value,
};
use chrono::Utc;
use std::{
    collections::BTreeMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// Stored record: column name to value. Relation columns hold bare keys.
pub type Record = BTreeMap<String, Value>;

///
/// Table
///

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<Value, Record>,
    next_key: i64,
}

///
/// MemoryDb
///

#[derive(Debug, Default)]
pub struct MemoryDb {
    schema: RwLock<BTreeMap<String, EntityModel>>,
    tables: RwLock<BTreeMap<String, Table>>,
    joins: bool,
}

impl MemoryDb {
    /// A host whose executor rejects every join.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A host whose executor follows foreign-key joins natively.
    #[must_use]
    pub fn with_joins() -> Self {
        Self {
            joins: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn supports_joins(&self) -> bool {
        self.joins
    }

    /// Declare (or redeclare) a record type.
    pub fn define(&self, entity: EntityModel) -> Result<(), InternalError> {
        let path = entity.path.clone();
        self.schema_mut()?.insert(path.clone(), entity);
        self.tables_mut()?.entry(path).or_default();

        Ok(())
    }

    /// Stored record by key, with every column including shadows.
    pub fn record(&self, entity: &str, key: &Value) -> Result<Option<Record>, InternalError> {
        let tables = self.tables()?;
        let table = tables
            .get(entity)
            .ok_or_else(|| SchemaError::EntityNotFound(entity.to_string()))?;

        Ok(table.rows.get(key).cloned())
    }

    /// Remove a record; references to it are left dangling.
    pub fn delete(&self, entity: &str, key: &Value) -> Result<bool, InternalError> {
        let mut tables = self.tables_mut()?;
        let table = tables
            .get_mut(entity)
            .ok_or_else(|| SchemaError::EntityNotFound(entity.to_string()))?;

        Ok(table.rows.remove(key).is_some())
    }

    /// Number of stored records of a record type.
    pub fn len(&self, entity: &str) -> Result<usize, InternalError> {
        let tables = self.tables()?;

        Ok(tables.get(entity).map_or(0, |table| table.rows.len()))
    }

    fn schema(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, EntityModel>>, InternalError> {
        self.schema
            .read()
            .map_err(|_| InternalError::store_internal("schema lock poisoned"))
    }

    fn schema_mut(
        &self,
    ) -> Result<RwLockWriteGuard<'_, BTreeMap<String, EntityModel>>, InternalError> {
        self.schema
            .write()
            .map_err(|_| InternalError::store_internal("schema lock poisoned"))
    }

    fn tables(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, Table>>, InternalError> {
        self.tables
            .read()
            .map_err(|_| InternalError::store_internal("table lock poisoned"))
    }

    fn tables_mut(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, Table>>, InternalError> {
        self.tables
            .write()
            .map_err(|_| InternalError::store_internal("table lock poisoned"))
    }
}

impl SchemaCatalog for MemoryDb {
    fn entity(&self, path: &str) -> Result<EntityModel, InternalError> {
        self.schema()?
            .get(path)
            .cloned()
            .ok_or_else(|| SchemaError::EntityNotFound(path.to_string()).into())
    }

    fn field(&self, entity: &str, field: &str) -> Result<FieldModel, InternalError> {
        let model = self.entity(entity)?;
        if field == model.primary_key {
            return Ok(FieldModel::new(field, FieldKind::Int));
        }

        model.get_field(field).cloned().ok_or_else(|| {
            SchemaError::FieldNotFound {
                entity: entity.to_string(),
                field: field.to_string(),
            }
            .into()
        })
    }

    fn add_field(&self, entity: &str, field: FieldModel) -> Result<bool, InternalError> {
        // existence check and insert happen under one write lock
        let mut schema = self.schema_mut()?;
        let model = schema
            .get_mut(entity)
            .ok_or_else(|| SchemaError::EntityNotFound(entity.to_string()))?;

        if let Some(existing) = model.get_field(&field.name) {
            if *existing == field {
                return Ok(false);
            }

            return Err(SchemaError::FieldConflict {
                entity: entity.to_string(),
                field: field.name,
            }
            .into());
        }

        model.fields.push(field);
        Ok(true)
    }
}

impl RecordStore for MemoryDb {
    fn persist(&self, write: WriteSet) -> Result<Vec<Value>, InternalError> {
        let model = self.entity(&write.entity)?;
        let mut tables = self.tables_mut()?;
        let table = tables
            .get_mut(&write.entity)
            .ok_or_else(|| SchemaError::EntityNotFound(write.entity.clone()))?;

        let mut keys = Vec::with_capacity(write.rows.len());
        for (index, row) in write.rows.into_iter().enumerate() {
            let key = match (write.kind, row.key.clone()) {
                (_, Some(key)) => key,
                (WriteKind::Insert, None) => {
                    table.next_key += 1;
                    Value::Int(table.next_key)
                }
                (WriteKind::Update, None) => {
                    return Err(WriteError::MissingKey {
                        entity: write.entity,
                        index,
                    }
                    .into());
                }
            };
            if let Value::Int(n) = key {
                table.next_key = table.next_key.max(n);
            }

            let columns = normalize_row(&model, row.into_values())?;
            let record = match write.kind {
                WriteKind::Insert => fill_defaults(&model, columns),
                WriteKind::Update => {
                    let mut existing = table.rows.get(&key).cloned().ok_or_else(|| {
                        InternalError::store_not_found(format!(
                            "{} record {key:?} not found for update",
                            write.entity
                        ))
                    })?;
                    existing.extend(columns);
                    existing
                }
            };

            table.rows.insert(key.clone(), record);
            keys.push(key);
        }

        Ok(keys)
    }
}

// Map written columns onto declared fields: raw-id columns and references
// collapse into the relation column's key.
fn normalize_row(
    model: &EntityModel,
    values: BTreeMap<String, Value>,
) -> Result<Record, InternalError> {
    let mut record = Record::new();

    for (column, value) in values {
        let field = match model.get_field(&column) {
            Some(field) => field,
            None => column
                .strip_suffix("_id")
                .and_then(|stem| model.get_field(stem))
                .filter(|field| field.kind.relation_target().is_some())
                .ok_or_else(|| SchemaError::FieldNotFound {
                    entity: model.path.clone(),
                    field: column.clone(),
                })?,
        };

        let value = match field.kind {
            FieldKind::Relation { .. } => value.into_key(),
            _ => value,
        };
        record.insert(field.name.clone(), value);
    }

    Ok(record)
}

// Inserts store every declared field; auto-populated fields get the write time.
fn fill_defaults(model: &EntityModel, mut record: Record) -> Record {
    for field in &model.fields {
        if field.auto_now {
            let now = Utc::now();
            let value = match field.kind {
                FieldKind::Date => Value::Date(now.date_naive()),
                _ => Value::Timestamp(now),
            };
            record.insert(field.name.clone(), value);
            continue;
        }
        record.entry(field.name.clone()).or_insert(Value::Null);
    }

    record
}
