use crate::{
    db::{
        query::{Alias, FieldPath, Query},
        write::WriteSet,
    },
    error::InternalError,
    index::JoinStrategy,
    obs::sink::{MetricsEvent, record},
    resolver::{BackendKind, ResolveContext, ResolverBackend, rewrite, write},
};
use tracing::warn;

///
/// ShadowIndexBackend
///
/// Serves direct and denormalized rules: the shadow sits on the record type
/// being queried, so matched leaves read it from the root alias.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct ShadowIndexBackend;

impl ResolverBackend for ShadowIndexBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::ShadowIndex
    }

    fn serves(&self, strategy: JoinStrategy) -> bool {
        matches!(strategy, JoinStrategy::Direct | JoinStrategy::Denormalize)
    }

    fn convert_write(
        &self,
        ctx: &ResolveContext<'_>,
        write: &mut WriteSet,
    ) -> Result<(), InternalError> {
        for rule in ctx.registry.denormalized_from(&write.entity) {
            warn!(
                entity = %write.entity,
                dependent = %rule.entity,
                shadow = %rule.shadow.name,
                "write leaves denormalized shadow stale"
            );
            record(MetricsEvent::DenormalizedStale {
                entity: &write.entity,
                dependent: &rule.entity,
                field: &rule.shadow.name,
            });
        }

        write::convert_rules(ctx, write, |rule| self.serves(rule.strategy))
    }

    fn convert_filters(
        &self,
        ctx: &ResolveContext<'_>,
        query: &mut Query,
    ) -> Result<(), InternalError> {
        let Query {
            entity,
            joins,
            filter,
        } = query;
        let entity: &str = entity;
        let mut released = 0;

        filter.try_for_each_leaf_mut(&mut |leaf| {
            // a direct path reads any shadow on the queried record type,
            // including target-side ones shared by other registrations
            let rule = if leaf.path.is_direct() {
                ctx.registry
                    .find_leaf(entity, &leaf.path, entity, leaf.op, &leaf.value)
            } else {
                ctx.registry
                    .find_origin(entity, &leaf.path, leaf.op, &leaf.value)
                    .filter(|rule| self.serves(rule.strategy))
            };

            if let Some(rule) = rule {
                let from = leaf.alias;
                let path = FieldPath::single(rule.shadow_name());
                rewrite::retarget(leaf, rule, Alias::ROOT, path);
                released += rewrite::move_refs(joins, from, Alias::ROOT);
            }

            Ok::<_, InternalError>(())
        })?;

        rewrite::released(entity, released);

        Ok(())
    }
}
