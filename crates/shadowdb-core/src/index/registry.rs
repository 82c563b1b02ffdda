use crate::{
    db::query::{FieldPath, LookupOp},
    index::{JoinStrategy, RegistryError, relation::RelationChain},
    lookup::LookupKind,
    model::field::FieldModel,
    value::Value,
};

/// Prefix shared by every synthesized shadow field.
pub const SHADOW_PREFIX: &str = "idxf_";

/// Shadow field name: `idxf_<field path>_l_<tag>`.
#[must_use]
pub fn shadow_name(path: &str, tag: &str) -> String {
    format!("{SHADOW_PREFIX}{path}_l_{tag}")
}

///
/// LookupRule
///
/// One registered (record type, field path, rule kind) entry together with
/// where its shadow lives and the chain its value is read through.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LookupRule {
    pub entity: String,
    pub path: FieldPath,
    pub kind: LookupKind,
    pub strategy: JoinStrategy,
    pub chain: RelationChain,
    pub shadow: FieldModel,
}

impl LookupRule {
    /// Build a rule, validating the rule kind against the terminal field.
    pub(crate) fn build(
        entity: &str,
        path: &FieldPath,
        kind: LookupKind,
        strategy: JoinStrategy,
        chain: RelationChain,
    ) -> Result<Self, RegistryError> {
        let source = chain.terminal();
        if source.auto_now {
            return Err(RegistryError::AutoNowField {
                entity: chain.terminal_entity().to_string(),
                field: source.name.clone(),
            });
        }
        if !kind.accepts(&source.kind) {
            return Err(RegistryError::IncompatibleKind {
                lookup: kind.tag(),
                field: path.to_string(),
                kind: source.kind.label(),
            });
        }

        // target-side shadows are named after the terminal field only, so a
        // direct registration on the target shares them
        let named_path = if strategy.is_target_side() {
            source.name.clone()
        } else {
            path.to_string()
        };
        let shadow = kind.shadow_field(&shadow_name(&named_path, &kind.tag()), source);

        Ok(Self {
            entity: entity.to_string(),
            path: path.clone(),
            kind,
            strategy,
            chain,
            shadow,
        })
    }

    /// Record type that stores the shadow and whose writes populate it.
    #[must_use]
    pub fn shadow_entity(&self) -> &str {
        if self.strategy.is_target_side() {
            self.chain.terminal_entity()
        } else {
            &self.entity
        }
    }

    #[must_use]
    pub fn shadow_name(&self) -> &str {
        &self.shadow.name
    }

    /// The field the shadow value is computed from.
    #[must_use]
    pub const fn source(&self) -> &FieldModel {
        self.chain.terminal()
    }

    #[must_use]
    pub fn is_denormalized(&self) -> bool {
        self.strategy == JoinStrategy::Denormalize
    }

    /// Origin-side match: a filter on `entity` written as `path` with `op`.
    #[must_use]
    pub fn matches(&self, entity: &str, path: &FieldPath, op: LookupOp, value: &Value) -> bool {
        self.entity == entity && self.path == *path && self.kind.handles(op, value)
    }

    /// Target-side match: a filter reaching field `field` of `entity`,
    /// however many hops it took to get there.
    #[must_use]
    pub fn matches_target(&self, entity: &str, field: &str, op: LookupOp, value: &Value) -> bool {
        self.strategy.is_target_side()
            && self.chain.terminal_entity() == entity
            && self.source().name == field
            && self.kind.handles(op, value)
    }

    fn same_registration(&self, other: &Self) -> bool {
        self.entity == other.entity
            && self.path == other.path
            && self.kind == other.kind
            && self.strategy == other.strategy
    }
}

///
/// Registry
///
/// Registered rules in registration order. Built once at startup and read
/// concurrently afterwards.
///

#[derive(Clone, Debug, Default)]
pub struct Registry {
    rules: Vec<LookupRule>,
}

impl Registry {
    #[must_use]
    pub const fn new() -> Self {
        Self { rules: Vec::new() }
    }

    #[must_use]
    pub fn rules(&self) -> &[LookupRule] {
        &self.rules
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Check a candidate rule against the registered ones.
    ///
    /// `Ok(Some(position))` for an equivalent registration, `Ok(None)` for a
    /// new one, and an error when another shape already owns the shadow name.
    pub(crate) fn admit(&self, rule: &LookupRule) -> Result<Option<usize>, RegistryError> {
        if let Some(position) = self.rules.iter().position(|r| r.same_registration(rule)) {
            return Ok(Some(position));
        }

        let clash = self.rules.iter().any(|existing| {
            existing.shadow_entity() == rule.shadow_entity()
                && existing.shadow.name == rule.shadow.name
                && existing.shadow != rule.shadow
        });
        if clash {
            return Err(RegistryError::DuplicateShadow {
                entity: rule.shadow_entity().to_string(),
                field: rule.shadow.name.clone(),
            });
        }

        Ok(None)
    }

    pub(crate) fn push(&mut self, rule: LookupRule) -> usize {
        self.rules.push(rule);
        self.rules.len() - 1
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<&LookupRule> {
        self.rules.get(position)
    }

    /// Rules whose shadow is written alongside records of `entity`.
    pub fn written_by<'a>(
        &'a self,
        entity: &str,
    ) -> impl Iterator<Item = &'a LookupRule> + use<'a> {
        let entity = entity.to_string();

        self.rules
            .iter()
            .filter(move |rule| rule.shadow_entity() == entity)
    }

    /// Denormalized rules that copy values out of records of `entity`.
    pub fn denormalized_from<'a>(
        &'a self,
        entity: &str,
    ) -> impl Iterator<Item = &'a LookupRule> + use<'a> {
        let entity = entity.to_string();

        self.rules
            .iter()
            .filter(move |rule| rule.is_denormalized() && rule.chain.passes_through(&entity))
    }

    /// The rule registered for filters written against `entity` as `path`,
    /// whatever its strategy.
    #[must_use]
    pub fn find_origin(
        &self,
        entity: &str,
        path: &FieldPath,
        op: LookupOp,
        value: &Value,
    ) -> Option<&LookupRule> {
        self.rules
            .iter()
            .find(|rule| rule.matches(entity, path, op, value))
    }

    /// First target-side rule whose shadow answers `field` of `target`,
    /// whichever origin registered it.
    #[must_use]
    pub fn find_shared(
        &self,
        target: &str,
        field: &str,
        op: LookupOp,
        value: &Value,
    ) -> Option<&LookupRule> {
        self.rules
            .iter()
            .find(|rule| rule.matches_target(target, field, op, value))
    }

    /// Rule answering a filter on `entity` written as `path`, which reaches
    /// record type `target`.
    ///
    /// The registration for that origin and path decides the strategy; a
    /// shared target-side shadow is used only when the origin registered
    /// nothing for the path.
    #[must_use]
    pub fn find_leaf(
        &self,
        entity: &str,
        path: &FieldPath,
        target: &str,
        op: LookupOp,
        value: &Value,
    ) -> Option<&LookupRule> {
        self.find_origin(entity, path, op, value)
            .or_else(|| self.find_shared(target, path.field(), op, value))
    }
}
