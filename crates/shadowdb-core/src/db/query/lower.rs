use crate::{
    db::{
        SchemaCatalog,
        query::{Alias, Constraint, FilterNode, FilterSpec, JoinMap, LookupOp, Query, QueryError},
    },
    error::InternalError,
};

/// Lower a caller filter into a joined query, the way the host query layer
/// does before execution.
///
/// Every relation hop becomes a join (reused when two lookups share a hop).
/// A lookup on the key of a relation is answered from the local foreign-key
/// column, except `isnull`, which the host lowers through a left outer join
/// and a null check on the joined primary key.
pub fn lower<S: SchemaCatalog + ?Sized>(
    schema: &S,
    entity: &str,
    spec: &FilterSpec,
) -> Result<Query, InternalError> {
    // surfaces EntityNotFound before any lookup is lowered
    schema.entity(entity)?;

    let mut joins = JoinMap::new(entity);
    let filter = lower_node(schema, entity, &mut joins, spec)?;

    Ok(Query {
        entity: entity.to_string(),
        joins,
        filter,
    })
}

fn lower_node<S: SchemaCatalog + ?Sized>(
    schema: &S,
    entity: &str,
    joins: &mut JoinMap,
    spec: &FilterSpec,
) -> Result<FilterNode, InternalError> {
    let node = match spec {
        FilterSpec::And(children) => {
            FilterNode::And(lower_children(schema, entity, joins, children)?)
        }
        FilterSpec::Or(children) => {
            FilterNode::Or(lower_children(schema, entity, joins, children)?)
        }
        FilterSpec::Not(inner) => {
            FilterNode::Not(Box::new(lower_node(schema, entity, joins, inner)?))
        }
        FilterSpec::Lookup { .. } => FilterNode::Leaf(lower_lookup(schema, entity, joins, spec)?),
    };

    Ok(node)
}

fn lower_children<S: SchemaCatalog + ?Sized>(
    schema: &S,
    entity: &str,
    joins: &mut JoinMap,
    children: &[FilterSpec],
) -> Result<Vec<FilterNode>, InternalError> {
    children
        .iter()
        .map(|child| lower_node(schema, entity, joins, child))
        .collect()
}

fn lower_lookup<S: SchemaCatalog + ?Sized>(
    schema: &S,
    entity: &str,
    joins: &mut JoinMap,
    spec: &FilterSpec,
) -> Result<Constraint, InternalError> {
    let Some((path, op, value)) = spec.parsed() else {
        return Err(InternalError::query_invariant("lookup leaf expected"));
    };

    let mut alias = Alias::ROOT;
    let mut current = entity.to_string();

    // Phase 1: one join per relation hop.
    for hop in path.relations() {
        let field = schema.field(&current, hop)?;
        let Some(target) = field.kind.relation_target() else {
            return Err(QueryError::NotARelation {
                entity: current,
                field: hop.clone(),
            }
            .into());
        };
        let target_pk = schema.entity(target)?.primary_key;

        alias = joins.join(alias, hop, target, &target_pk, false);
        current = target.to_string();
    }

    // Phase 2: resolve the terminal column.
    let primary_key = schema.entity(&current)?.primary_key;
    let mut column = path.field().to_string();

    if column != primary_key {
        let field = schema.field(&current, &column)?;

        if op == LookupOp::IsNull
            && let Some(target) = field.kind.relation_target()
        {
            let target_pk = schema.entity(target)?.primary_key;
            alias = joins.join(alias, &field.name, target, &target_pk, true);
            column = target_pk;
        }
    }

    joins.ref_chain(alias);

    Ok(Constraint {
        alias,
        column,
        path,
        op,
        value: value.clone(),
    })
}
