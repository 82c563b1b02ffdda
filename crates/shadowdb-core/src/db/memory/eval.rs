use crate::{
    db::{
        QueryExecutor, SchemaError,
        memory::{MemoryDb, Record, Table},
        query::{Alias, Constraint, FilterNode, JoinMap, LookupOp, Query, QueryError},
    },
    error::InternalError,
    model::entity::EntityModel,
    value::Value,
};
use std::collections::BTreeMap;

///
/// Slot
///
/// One alias bound to a concrete record (or to nothing, for an unmatched
/// outer join).
///

#[derive(Clone, Copy)]
struct Slot<'a> {
    key: &'a Value,
    record: &'a Record,
    primary_key: &'a str,
}

impl Slot<'_> {
    fn column(&self, column: &str) -> Value {
        if column == self.primary_key {
            return self.key.clone();
        }

        self.record.get(column).cloned().unwrap_or(Value::Null)
    }
}

type Scope<'a> = BTreeMap<Alias, Option<Slot<'a>>>;

impl QueryExecutor for MemoryDb {
    fn select_keys(&self, query: &Query) -> Result<Vec<Value>, InternalError> {
        if !self.joins && !query.joins.is_empty() {
            return Err(QueryError::JoinsUnsupported {
                entity: query.entity.clone(),
            }
            .into());
        }

        let schema = self.schema()?;
        check_constraints(&schema, query)?;

        let tables = self.tables()?;
        let table = tables
            .get(&query.entity)
            .ok_or_else(|| SchemaError::EntityNotFound(query.entity.clone()))?;
        let root_pk = primary_key(&schema, &query.entity)?;

        let mut keys = Vec::new();
        for (key, record) in &table.rows {
            let root = Slot {
                key,
                record,
                primary_key: root_pk,
            };
            let Some(scope) = bind_joins(&schema, &tables, &query.joins, root)? else {
                continue;
            };

            if eval_node(&scope, &query.filter)? {
                keys.push(key.clone());
            }
        }

        Ok(keys)
    }

    fn load_field(
        &self,
        entity: &str,
        key: &Value,
        field: &str,
    ) -> Result<Option<Value>, InternalError> {
        let schema = self.schema()?;
        let primary_key = primary_key(&schema, entity)?;
        let tables = self.tables()?;
        let table = tables
            .get(entity)
            .ok_or_else(|| SchemaError::EntityNotFound(entity.to_string()))?;

        Ok(table.rows.get(key).map(|record| {
            Slot {
                key,
                record,
                primary_key,
            }
            .column(field)
        }))
    }
}

fn primary_key<'a>(
    schema: &'a BTreeMap<String, EntityModel>,
    entity: &str,
) -> Result<&'a str, InternalError> {
    schema
        .get(entity)
        .map(|model| model.primary_key.as_str())
        .ok_or_else(|| SchemaError::EntityNotFound(entity.to_string()).into())
}

// Reject operators and columns the store cannot serve before scanning.
fn check_constraints(
    schema: &BTreeMap<String, EntityModel>,
    query: &Query,
) -> Result<(), InternalError> {
    let mut failure: Option<InternalError> = None;

    query.filter.for_each_leaf(&mut |leaf| {
        if failure.is_some() {
            return;
        }
        if !leaf.op.is_native() {
            failure = Some(
                QueryError::UnsupportedOperator {
                    op: leaf.op,
                    column: leaf.column.clone(),
                }
                .into(),
            );
            return;
        }

        let Some(entity) = query.joins.entity_of(leaf.alias) else {
            failure = Some(QueryError::DanglingAlias { alias: leaf.alias }.into());
            return;
        };
        let known = schema.get(entity).is_some_and(|model| {
            model.primary_key == leaf.column || model.has_field(&leaf.column)
        });
        if !known {
            failure = Some(
                SchemaError::FieldNotFound {
                    entity: entity.to_string(),
                    field: leaf.column.clone(),
                }
                .into(),
            );
        }
    });

    failure.map_or(Ok(()), Err)
}

// Bind every join for one root record. `None` means an inner join found no
// partner and the record drops out of the result.
fn bind_joins<'a>(
    schema: &'a BTreeMap<String, EntityModel>,
    tables: &'a BTreeMap<String, Table>,
    joins: &JoinMap,
    root: Slot<'a>,
) -> Result<Option<Scope<'a>>, InternalError> {
    let mut scope = Scope::new();
    scope.insert(Alias::ROOT, Some(root));

    // parents are always allocated before their children
    for (alias, join) in joins.iter() {
        let parent = scope.get(&join.parent).copied().flatten();
        let bound = match parent {
            Some(parent) => {
                let fk = parent.column(&join.via);
                let table = tables
                    .get(&join.entity)
                    .ok_or_else(|| SchemaError::EntityNotFound(join.entity.clone()))?;
                let primary_key = primary_key(schema, &join.entity)?;

                table
                    .rows
                    .get_key_value(&fk)
                    .map(|(key, record)| Slot {
                        key,
                        record,
                        primary_key,
                    })
            }
            None => None,
        };

        if bound.is_none() && !join.outer {
            return Ok(None);
        }
        scope.insert(alias, bound);
    }

    Ok(Some(scope))
}

fn eval_node(scope: &Scope<'_>, node: &FilterNode) -> Result<bool, InternalError> {
    match node {
        FilterNode::And(children) => {
            for child in children {
                if !eval_node(scope, child)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        FilterNode::Or(children) => {
            for child in children {
                if eval_node(scope, child)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        FilterNode::Not(inner) => Ok(!eval_node(scope, inner)?),
        FilterNode::Leaf(leaf) => eval_leaf(scope, leaf),
    }
}

fn eval_leaf(scope: &Scope<'_>, leaf: &Constraint) -> Result<bool, InternalError> {
    let actual = scope
        .get(&leaf.alias)
        .copied()
        .flatten()
        .map_or(Value::Null, |slot| slot.column(&leaf.column));
    let operand = leaf.value.clone().into_key();

    if leaf.op == LookupOp::IsNull {
        let Value::Bool(want_null) = operand else {
            return Err(invalid_operand(leaf.op, "a bool", &operand));
        };
        return Ok(actual.is_null() == want_null);
    }

    // many-valued fields match when any element does
    if let Value::List(items) = &actual {
        for item in items {
            if eval_scalar(leaf.op, item, &operand)? {
                return Ok(true);
            }
        }
        return Ok(false);
    }

    eval_scalar(leaf.op, &actual, &operand)
}

fn eval_scalar(op: LookupOp, actual: &Value, operand: &Value) -> Result<bool, InternalError> {
    if actual.is_null() {
        return Ok(false);
    }

    let matched = match op {
        LookupOp::Exact => actual == operand,
        LookupOp::Startswith => {
            let Value::Text(prefix) = operand else {
                return Err(invalid_operand(op, "text", operand));
            };
            actual.as_text().is_some_and(|text| text.starts_with(prefix.as_str()))
        }
        LookupOp::In => {
            let Value::List(candidates) = operand else {
                return Err(invalid_operand(op, "a list", operand));
            };
            candidates.iter().any(|candidate| candidate.clone().into_key() == *actual)
        }
        LookupOp::Lt => same_variant(actual, operand) && actual < operand,
        LookupOp::Lte => same_variant(actual, operand) && actual <= operand,
        LookupOp::Gt => same_variant(actual, operand) && actual > operand,
        LookupOp::Gte => same_variant(actual, operand) && actual >= operand,
        LookupOp::Range => {
            let Some([low, high]) = operand
                .as_list()
                .and_then(|bounds| <&[Value; 2]>::try_from(bounds).ok())
            else {
                return Err(invalid_operand(op, "a [low, high] list", operand));
            };
            same_variant(actual, low) && actual >= low && actual <= high
        }
        _ => {
            return Err(QueryError::UnsupportedOperator {
                op,
                column: String::new(),
            }
            .into());
        }
    };

    Ok(matched)
}

fn same_variant(left: &Value, right: &Value) -> bool {
    std::mem::discriminant(left) == std::mem::discriminant(right)
}

fn invalid_operand(op: LookupOp, expected: &'static str, found: &Value) -> InternalError {
    QueryError::InvalidOperand {
        op,
        expected,
        found: found.label(),
    }
    .into()
}
