use crate::{
    db::query::{LookupOp, Query},
    error::InternalError,
    resolver::{BackendKind, ResolveContext, ResolverBackend, rewrite},
};

///
/// FkNullFixBackend
///
/// Hosts lower `fk__isnull` into a left outer join plus a null check on the
/// joined primary key. The foreign-key column on the parent answers the same
/// question without the join.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct FkNullFixBackend;

impl ResolverBackend for FkNullFixBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::FkNullFix
    }

    fn convert_filters(
        &self,
        _ctx: &ResolveContext<'_>,
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
            if leaf.op != LookupOp::IsNull {
                return Ok::<_, InternalError>(());
            }
            let Some(join) = joins.get(leaf.alias) else {
                return Ok(());
            };
            if !join.outer || leaf.column != join.target_column || leaf.path.field() != join.via {
                return Ok(());
            }

            let from = leaf.alias;
            leaf.alias = join.parent;
            leaf.column.clone_from(&join.via);
            if joins.unref(from) {
                released += 1;
            }

            Ok(())
        })?;

        rewrite::released(entity, released);

        Ok(())
    }
}
