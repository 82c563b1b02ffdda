use crate::{
    db::{
        Host,
        query::{Alias, Constraint, FieldPath, JoinMap, QueryError},
    },
    error::InternalError,
    index::LookupRule,
    obs::sink::{MetricsEvent, record},
};

/// Point `leaf` at `rule`'s shadow column on `alias`, converting the
/// operator and operand to their native form.
pub(crate) fn retarget(leaf: &mut Constraint, rule: &LookupRule, alias: Alias, path: FieldPath) {
    let (op, value) = rule.kind.convert_lookup(leaf.op, &leaf.value);

    leaf.alias = alias;
    leaf.column.clone_from(&rule.shadow.name);
    leaf.path = path;
    leaf.op = op;
    leaf.value = value;

    record(MetricsEvent::FilterRewrite {
        entity: rule.shadow_entity(),
        field: &rule.shadow.name,
    });
}

/// Move a constraint from `from` to `to`: references are taken on the new
/// chain before the old one is released. Returns the joins removed.
pub(crate) fn move_refs(joins: &mut JoinMap, from: Alias, to: Alias) -> usize {
    joins.ref_chain(to);
    joins.unref_chain(from)
}

/// Alias reached by following `relations` from the root, if every hop is joined.
pub(crate) fn target_alias(joins: &JoinMap, relations: &[String]) -> Option<Alias> {
    relations
        .iter()
        .try_fold(Alias::ROOT, |alias, via| joins.find(alias, via))
}

/// Record type reached by following `relations` from `root` in the schema.
pub(crate) fn entity_at(
    host: &dyn Host,
    root: &str,
    relations: &[String],
) -> Result<String, InternalError> {
    let mut current = root.to_string();

    for via in relations {
        let field = host.field(&current, via)?;
        let Some(target) = field.kind.relation_target() else {
            return Err(QueryError::NotARelation {
                entity: current,
                field: via.clone(),
            }
            .into());
        };
        current = target.to_string();
    }

    Ok(current)
}

pub(crate) fn released(entity: &str, joins: usize) {
    if joins > 0 {
        record(MetricsEvent::JoinReleased {
            entity,
            joins: u64::try_from(joins).unwrap_or(u64::MAX),
        });
    }
}
