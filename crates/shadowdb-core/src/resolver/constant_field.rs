use crate::{
    db::query::{Query, QueryError},
    error::InternalError,
    index::JoinStrategy,
    resolver::{BackendKind, ResolveContext, ResolverBackend, rewrite},
};

///
/// ConstantFieldJoinBackend
///
/// Keeps the host's join and swaps the terminal column for the shadow on the
/// joined target alias.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct ConstantFieldJoinBackend;

impl ResolverBackend for ConstantFieldJoinBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::ConstantFieldJoin
    }

    fn serves(&self, strategy: JoinStrategy) -> bool {
        strategy == JoinStrategy::ConstantField
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
            .any(|rule| rule.strategy == JoinStrategy::ConstantField);
        if !any_rules {
            return Ok(());
        }

        let Query {
            entity,
            joins,
            filter,
        } = query;
        let entity: &str = entity;
        let mut released = 0;

        filter.try_for_each_leaf_mut(&mut |leaf| {
            if leaf.path.is_direct() {
                return Ok(());
            }

            let relations = leaf.path.relations();
            let target_entity = rewrite::entity_at(ctx.host, entity, relations)?;
            let Some(rule) = ctx
                .registry
                .find_leaf(entity, &leaf.path, &target_entity, leaf.op, &leaf.value)
                .filter(|rule| self.serves(rule.strategy))
            else {
                return Ok(());
            };

            let target = rewrite::target_alias(joins, relations).ok_or_else(|| {
                QueryError::MissingJoinPath {
                    entity: entity.to_string(),
                    path: leaf.path.to_string(),
                }
            })?;

            // joins past the target alias (e.g. an isnull outer join) go away
            let from = leaf.alias;
            let path = leaf.path.with_field(rule.shadow_name());
            rewrite::retarget(leaf, rule, target, path);
            released += rewrite::move_refs(joins, from, target);

            Ok::<_, InternalError>(())
        })?;

        rewrite::released(entity, released);

        Ok(())
    }
}
