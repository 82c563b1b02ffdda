use crate::{
    db::{QueryExecutor, SchemaCatalog, query::FieldPath, write::WriteRow},
    error::InternalError,
    index::RegistryError,
    model::field::FieldModel,
    value::Value,
};

///
/// Hop
///
/// One foreign key followed from `entity` through `field` to `target`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Hop {
    pub entity: String,
    pub field: FieldModel,
    pub target: String,
}

///
/// RelationChain
///
/// A registered field path resolved against the schema: the relation hops
/// from the origin record type and the terminal field they reach.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelationChain {
    origin: String,
    hops: Vec<Hop>,
    terminal_entity: String,
    terminal: FieldModel,
}

impl RelationChain {
    /// Walk `path` from `origin`; every hop must be a relation and the
    /// terminal field must exist.
    pub fn resolve<S: SchemaCatalog + ?Sized>(
        schema: &S,
        origin: &str,
        path: &FieldPath,
    ) -> Result<Self, InternalError> {
        let unknown = || RegistryError::UnknownField {
            entity: origin.to_string(),
            path: path.to_string(),
        };

        let mut hops = Vec::with_capacity(path.depth());
        let mut current = origin.to_string();

        for name in path.relations() {
            let field = schema.field(&current, name).map_err(|err| {
                if err.is_not_found() {
                    InternalError::from(unknown())
                } else {
                    err
                }
            })?;
            let target = field.kind.relation_target().ok_or_else(unknown)?.to_string();

            hops.push(Hop {
                entity: std::mem::replace(&mut current, target.clone()),
                field,
                target,
            });
        }

        let terminal = match schema.field(&current, path.field()) {
            Ok(field) => field,
            Err(err) if err.is_not_found() => return Err(unknown().into()),
            Err(err) => return Err(err),
        };

        Ok(Self {
            origin: origin.to_string(),
            hops,
            terminal_entity: current,
            terminal,
        })
    }

    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    #[must_use]
    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    #[must_use]
    pub fn terminal_entity(&self) -> &str {
        &self.terminal_entity
    }

    #[must_use]
    pub const fn terminal(&self) -> &FieldModel {
        &self.terminal
    }

    /// Whether a write to `entity` can change a value read through this
    /// chain (origin excluded).
    #[must_use]
    pub fn passes_through(&self, entity: &str) -> bool {
        self.hops.iter().any(|hop| hop.target == entity)
    }

    /// Terminal value for one origin row, following the chain through the host.
    ///
    /// `None` when the row does not carry the first value the chain needs.
    /// A broken link anywhere (null key, missing record) yields `Value::Null`.
    pub fn resolve_value<Q: QueryExecutor + ?Sized>(
        &self,
        host: &Q,
        row: &WriteRow,
    ) -> Result<Option<Value>, InternalError> {
        let Some((first, rest)) = self.hops.split_first() else {
            return Ok(source_value(row, &self.terminal));
        };
        let Some(mut key) = source_value(row, &first.field) else {
            return Ok(None);
        };

        for hop in rest {
            if key.is_null() {
                return Ok(Some(Value::Null));
            }
            key = host
                .load_field(&hop.entity, &key, &hop.field.name)?
                .unwrap_or(Value::Null);
        }
        if key.is_null() {
            return Ok(Some(Value::Null));
        }

        let value = host
            .load_field(&self.terminal_entity, &key, &self.terminal.name)?
            .unwrap_or(Value::Null);

        Ok(Some(value))
    }
}

/// Raw value of `field` as written in `row`; relation fields collapse to keys.
#[must_use]
pub fn source_value(row: &WriteRow, field: &FieldModel) -> Option<Value> {
    if field.kind.relation_target().is_some() {
        return row.relation_key(field);
    }

    row.get(&field.name).cloned()
}
