//! Resolver facade: an ordered chain of independent rewrite backends.
//!
//! Every backend sees every create/write/filter event in chain order and
//! acts only on the rules and leaves it owns. The chain is fixed at startup.

mod constant_field;
mod fk_null;
mod in_memory;
mod rewrite;
mod shadow;
mod write;


use crate::{
    db::{Host, query::Query, write::WriteSet},
    error::InternalError,
    index::{JoinStrategy, LookupRule, Registry, RegistryError},
    model::field::FieldModel,
    obs::sink::{MetricsEvent, record},
};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fmt,
    sync::RwLock,
};
use tracing::debug;

// re-exports
pub use constant_field::ConstantFieldJoinBackend;
pub use fk_null::FkNullFixBackend;
pub use in_memory::InMemoryJoinBackend;
pub use shadow::ShadowIndexBackend;

///
/// BackendKind
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[display("shadow_index")]
    ShadowIndex,
    #[display("fk_null_fix")]
    FkNullFix,
    #[display("constant_field_join")]
    ConstantFieldJoin,
    #[display("in_memory_join")]
    InMemoryJoin,
}

impl BackendKind {
    pub const DEFAULT: [Self; 4] = [
        Self::ShadowIndex,
        Self::FkNullFix,
        Self::ConstantFieldJoin,
        Self::InMemoryJoin,
    ];

    #[must_use]
    pub fn build(self) -> Box<dyn ResolverBackend> {
        match self {
            Self::ShadowIndex => Box::new(ShadowIndexBackend),
            Self::FkNullFix => Box::new(FkNullFixBackend),
            Self::ConstantFieldJoin => Box::new(ConstantFieldJoinBackend),
            Self::InMemoryJoin => Box::new(InMemoryJoinBackend),
        }
    }
}

///
/// ResolverBackend
///

pub trait ResolverBackend: fmt::Debug + Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Whether this backend materializes and serves rules of `strategy`.
    fn serves(&self, _strategy: JoinStrategy) -> bool {
        false
    }

    /// Materialize the shadow field of a newly registered rule.
    fn create_index(
        &self,
        ctx: &ResolveContext<'_>,
        rule: &LookupRule,
    ) -> Result<(), InternalError> {
        ctx.ensure_shadow(rule)
    }

    /// Inject shadow values for the rules this backend serves.
    fn convert_write(
        &self,
        ctx: &ResolveContext<'_>,
        write: &mut WriteSet,
    ) -> Result<(), InternalError> {
        write::convert_rules(ctx, write, |rule| self.serves(rule.strategy))
    }

    /// Rewrite the leaves this backend owns.
    fn convert_filters(
        &self,
        ctx: &ResolveContext<'_>,
        query: &mut Query,
    ) -> Result<(), InternalError>;
}

///
/// ShadowGuard
///
/// Single-flight guard for shadow field creation: concurrent cold starts
/// issue one `add_field` per (record type, field).
///

#[derive(Debug, Default)]
pub struct ShadowGuard {
    created: RwLock<BTreeSet<(String, String)>>,
}

impl ShadowGuard {
    /// Make sure `field` exists on `entity`; returns whether it was added now.
    pub fn ensure(
        &self,
        host: &dyn Host,
        entity: &str,
        field: &FieldModel,
    ) -> Result<bool, InternalError> {
        let key = (entity.to_string(), field.name.clone());

        // steady state: shared lock only
        let seen = self
            .created
            .read()
            .map_err(|_| InternalError::store_internal("shadow guard poisoned"))?
            .contains(&key);
        if seen {
            return Ok(false);
        }

        let mut created = self
            .created
            .write()
            .map_err(|_| InternalError::store_internal("shadow guard poisoned"))?;
        if created.contains(&key) {
            return Ok(false);
        }

        // the write lock is held across the host call
        let added = host.add_field(entity, field.clone())?;
        created.insert(key);

        Ok(added)
    }
}

///
/// ResolveContext
///
/// Everything a backend may consult during one event.
///

#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    pub registry: &'a Registry,
    pub host: &'a dyn Host,
    pub guard: &'a ShadowGuard,
}

impl ResolveContext<'_> {
    /// Ensure the rule's shadow field exists on its record type.
    pub fn ensure_shadow(&self, rule: &LookupRule) -> Result<(), InternalError> {
        let entity = rule.shadow_entity();
        if self.guard.ensure(self.host, entity, &rule.shadow)? {
            debug!(entity, field = %rule.shadow.name, "created shadow field");
            record(MetricsEvent::IndexCreated {
                entity,
                field: &rule.shadow.name,
            });
        }

        Ok(())
    }
}

impl fmt::Debug for ResolveContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveContext")
            .field("rules", &self.registry.len())
            .finish_non_exhaustive()
    }
}

///
/// Resolver
///

#[derive(Debug)]
pub struct Resolver {
    backends: Vec<Box<dyn ResolverBackend>>,
    guard: ShadowGuard,
}

impl Resolver {
    #[must_use]
    pub fn new(kinds: &[BackendKind]) -> Self {
        Self::with_backends(kinds.iter().map(|kind| kind.build()).collect())
    }

    #[must_use]
    pub fn with_backends(backends: Vec<Box<dyn ResolverBackend>>) -> Self {
        Self {
            backends,
            guard: ShadowGuard::default(),
        }
    }

    pub fn backends(&self) -> impl Iterator<Item = BackendKind> + '_ {
        self.backends.iter().map(|backend| backend.kind())
    }

    /// Whether any enabled backend serves `strategy`.
    #[must_use]
    pub fn claims(&self, strategy: JoinStrategy) -> bool {
        self.backends.iter().any(|backend| backend.serves(strategy))
    }

    const fn context<'a>(
        &'a self,
        registry: &'a Registry,
        host: &'a dyn Host,
    ) -> ResolveContext<'a> {
        ResolveContext {
            registry,
            host,
            guard: &self.guard,
        }
    }

    /// Hand a new rule to the first backend serving its strategy.
    pub fn create_index(
        &self,
        registry: &Registry,
        host: &dyn Host,
        rule: &LookupRule,
    ) -> Result<(), InternalError> {
        let ctx = self.context(registry, host);
        let backend = self
            .backends
            .iter()
            .find(|backend| backend.serves(rule.strategy))
            .ok_or(RegistryError::NoBackend {
                strategy: rule.strategy,
            })?;

        backend.create_index(&ctx, rule)
    }

    pub fn convert_write(
        &self,
        registry: &Registry,
        host: &dyn Host,
        write: &mut WriteSet,
    ) -> Result<(), InternalError> {
        let ctx = self.context(registry, host);
        for backend in &self.backends {
            backend.convert_write(&ctx, write)?;
        }

        Ok(())
    }

    /// Run every backend over the query, then verify alias bookkeeping.
    pub fn convert_filters(
        &self,
        registry: &Registry,
        host: &dyn Host,
        query: &mut Query,
    ) -> Result<(), InternalError> {
        let ctx = self.context(registry, host);
        for backend in &self.backends {
            backend.convert_filters(&ctx, query)?;
        }

        query.check_well_formed()
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(&BackendKind::DEFAULT)
    }
}
