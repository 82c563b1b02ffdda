use crate::{
    db::write::{WriteError, WriteKind, WriteRow, WriteSet},
    error::InternalError,
    index::{LookupRule, source_value},
    model::field::FieldModel,
    obs::sink::{MetricsEvent, record},
    resolver::ResolveContext,
    value::Value,
};

/// Inject shadow values for every rule written by `write.entity` that
/// `serves` accepts. Rows are processed positionally.
pub(crate) fn convert_rules(
    ctx: &ResolveContext<'_>,
    write: &mut WriteSet,
    serves: impl Fn(&LookupRule) -> bool,
) -> Result<(), InternalError> {
    let WriteSet { entity, kind, rows } = write;
    let entity: &str = entity;
    let kind = *kind;

    for rule in ctx.registry.written_by(entity).filter(|rule| serves(rule)) {
        ctx.ensure_shadow(rule)?;

        let mut written = 0u64;
        for row in rows.iter_mut() {
            let raw = if rule.is_denormalized() {
                rule.chain.resolve_value(ctx.host, row)?
            } else {
                source_value(row, rule.source())
            };

            let Some(raw) = raw else {
                match kind {
                    WriteKind::Insert => {
                        return Err(WriteError::MissingValue {
                            entity: entity.to_string(),
                            field: rule.path.to_string(),
                        }
                        .into());
                    }
                    WriteKind::Update => {
                        record(MetricsEvent::MissingValueSkipped {
                            entity,
                            field: &rule.shadow.name,
                        });
                        continue;
                    }
                }
            };

            assign_shadow(row, &rule.shadow, rule.kind.convert_value(&raw))?;
            written += 1;
        }

        if written > 0 {
            record(MetricsEvent::ShadowWrite {
                entity,
                field: &rule.shadow.name,
                rows: written,
            });
        }
    }

    Ok(())
}

// Relation-kind shadows reject bare keys; those go through the raw-id column.
fn assign_shadow(
    row: &mut WriteRow,
    shadow: &FieldModel,
    value: Value,
) -> Result<(), InternalError> {
    match row.assign(shadow, value.clone()) {
        Err(WriteError::ExpectedReference { .. }) => Ok(row.assign_raw_id(shadow, value)?),
        other => Ok(other?),
    }
}
