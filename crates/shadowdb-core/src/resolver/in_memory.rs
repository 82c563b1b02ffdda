use crate::{
    db::query::{Constraint, FilterNode, LookupOp, Query, QueryError},
    error::InternalError,
    index::{JoinStrategy, LookupRule},
    obs::sink::{MetricsEvent, record},
    resolver::{BackendKind, ResolveContext, ResolverBackend, rewrite},
    value::Value,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

///
/// InMemoryJoinBackend
///
/// Serves joins on stores that cannot execute them. Matched leaves are
/// grouped by relation prefix; each group becomes a key-collecting sub-query
/// against its target, deepest first, until only a membership constraint on
/// the origin's foreign key remains.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct InMemoryJoinBackend;

///
/// Group
///
/// Constraints destined for one sub-query, keyed by relation prefix.
///

#[derive(Debug)]
struct Group {
    entity: String,
    constraints: Vec<Constraint>,
}

type Groups = BTreeMap<Vec<String>, Group>;

impl ResolverBackend for InMemoryJoinBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::InMemoryJoin
    }

    fn serves(&self, strategy: JoinStrategy) -> bool {
        strategy == JoinStrategy::InMemory
    }

    fn convert_filters(
        &self,
        ctx: &ResolveContext<'_>,
        query: &mut Query,
    ) -> Result<(), InternalError> {
        let any_rules = ctx
            .registry
            .rules()
            .iter()
            .any(|rule| rule.strategy == JoinStrategy::InMemory);
        if !any_rules {
            return Ok(());
        }

        // Phase 1: find matched leaves; none may sit under OR / NOT.
        let mut scoped = Vec::new();
        query.filter.for_each_leaf_scoped(&mut |leaf, disjunctive| {
            scoped.push((leaf.clone(), disjunctive));
        });

        let mut matched = 0;
        for (leaf, disjunctive) in &scoped {
            if find_rule(ctx, &query.entity, leaf)?.is_none() {
                continue;
            }
            if *disjunctive {
                return Err(QueryError::DisjunctiveJoin {
                    path: leaf.path.to_string(),
                }
                .into());
            }
            matched += 1;
        }
        if matched == 0 {
            return Ok(());
        }

        // Phase 2: pull matched and mergeable top-level leaves into groups.
        let mut children = Vec::new();
        flatten_and(std::mem::replace(&mut query.filter, FilterNode::all()), &mut children);
        let (mut groups, kept, released) = collect_groups(ctx, query, children)?;
        query.filter = FilterNode::And(kept);

        // Phase 3: resolve groups deepest first.
        let mut roots = Vec::new();
        while let Some(prefix) = groups.keys().max_by_key(|prefix| prefix.len()).cloned() {
            let Some(group) = groups.remove(&prefix) else {
                break;
            };
            let Some((via, parent)) = prefix.split_last() else {
                return Err(InternalError::query_invariant(
                    "in-memory group without relation prefix",
                ));
            };

            let keys = sub_query(ctx, group)?;
            let constraint = Constraint::root(via.clone(), LookupOp::In, Value::List(keys));

            if parent.is_empty() {
                roots.push(constraint);
            } else {
                group_at(ctx, &query.entity, &mut groups, parent)?
                    .constraints
                    .push(constraint);
            }
        }

        for constraint in roots {
            query.push_conjunct(constraint);
        }
        rewrite::released(&query.entity, released);

        Ok(())
    }
}

// Nested conjunctions are conjuncts of the query too.
fn flatten_and(node: FilterNode, out: &mut Vec<FilterNode>) {
    match node {
        FilterNode::And(children) => {
            for child in children {
                flatten_and(child, out);
            }
        }
        other => out.push(other),
    }
}

fn find_rule<'a>(
    ctx: &ResolveContext<'a>,
    root: &str,
    leaf: &Constraint,
) -> Result<Option<&'a LookupRule>, InternalError> {
    if leaf.path.is_direct() {
        return Ok(None);
    }

    let target = rewrite::entity_at(ctx.host, root, leaf.path.relations())?;

    Ok(ctx
        .registry
        .find_leaf(root, &leaf.path, &target, leaf.op, &leaf.value)
        .filter(|rule| rule.strategy == JoinStrategy::InMemory))
}

// Split the top-level conjuncts into sub-query groups and the nodes that
// stay in the outer query. Plain leaves on a grouped prefix (or one of its
// ancestors) join the group so their joins can go too.
fn collect_groups(
    ctx: &ResolveContext<'_>,
    query: &mut Query,
    children: Vec<FilterNode>,
) -> Result<(Groups, Vec<FilterNode>, usize), InternalError> {
    let mut groups = Groups::new();
    let mut plain = Vec::new();
    let mut kept = Vec::new();
    let mut released = 0;

    for (index, child) in children.into_iter().enumerate() {
        let FilterNode::Leaf(leaf) = child else {
            kept.push((index, child));
            continue;
        };
        let Some(rule) = find_rule(ctx, &query.entity, &leaf)? else {
            plain.push((index, leaf));
            continue;
        };

        let (op, value) = rule.kind.convert_lookup(leaf.op, &leaf.value);
        released += query.joins.unref_chain(leaf.alias);
        record(MetricsEvent::FilterRewrite {
            entity: rule.shadow_entity(),
            field: &rule.shadow.name,
        });

        group_at(ctx, &query.entity, &mut groups, leaf.path.relations())?
            .constraints
            .push(Constraint::root(rule.shadow_name(), op, value));
    }

    let prefixes: BTreeSet<Vec<String>> = groups
        .keys()
        .flat_map(|prefix| (1..=prefix.len()).map(move |len| prefix[..len].to_vec()))
        .collect();

    for (index, leaf) in plain {
        let relations = leaf.path.relations();
        let mergeable = !relations.is_empty()
            && prefixes.contains(relations)
            && leaf.op.is_native()
            && rewrite::target_alias(&query.joins, relations) == Some(leaf.alias);

        if !mergeable {
            kept.push((index, FilterNode::Leaf(leaf)));
            continue;
        }

        released += query.joins.unref_chain(leaf.alias);
        group_at(ctx, &query.entity, &mut groups, relations)?
            .constraints
            .push(Constraint::root(leaf.column.clone(), leaf.op, leaf.value.clone()));
    }

    kept.sort_by_key(|(index, _)| *index);

    Ok((groups, kept.into_iter().map(|(_, node)| node).collect(), released))
}

fn group_at<'g>(
    ctx: &ResolveContext<'_>,
    root: &str,
    groups: &'g mut Groups,
    prefix: &[String],
) -> Result<&'g mut Group, InternalError> {
    if !groups.contains_key(prefix) {
        let entity = rewrite::entity_at(ctx.host, root, prefix)?;
        groups.insert(
            prefix.to_vec(),
            Group {
                entity,
                constraints: Vec::new(),
            },
        );
    }

    groups
        .get_mut(prefix)
        .ok_or_else(|| InternalError::query_invariant("in-memory group vanished"))
}

fn sub_query(ctx: &ResolveContext<'_>, group: Group) -> Result<Vec<Value>, InternalError> {
    let query = Query::conjunction(group.entity, group.constraints);
    let keys = ctx.host.select_keys(&query)?;

    debug!(entity = %query.entity, keys = keys.len(), "in-memory join sub-query");
    record(MetricsEvent::SubQuery {
        entity: &query.entity,
        keys: u64::try_from(keys.len()).unwrap_or(u64::MAX),
    });

    Ok(keys)
}
