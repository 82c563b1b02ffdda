//! Shadow index registration and the engine entry point.
//!
//! An [`Indexer`] owns the registry of lookup rules and the resolver chain.
//! It is built and populated once at startup through `&mut self`, then shared
//! read-only for write conversion and filter rewriting.

mod declare;
mod registry;
mod relation;


use crate::{
    config::IndexerConfig,
    db::{Host, query::Query, write::WriteSet},
    error::{ErrorClass, ErrorDetail, ErrorOrigin, InternalError},
    resolver::{BackendKind, Resolver},
};
use thiserror::Error as ThisError;
use tracing::debug;

// re-exports
pub use declare::{FieldIndex, JoinStrategy, LookupSpec};
pub use registry::{LookupRule, Registry, SHADOW_PREFIX, shadow_name};
pub use relation::{Hop, RelationChain, source_value};

///
/// RegistryError
///

#[derive(Debug, ThisError)]
pub enum RegistryError {
    #[error(
        "cannot index '{path}' on '{entity}': a hop is not a relation or the field does not exist"
    )]
    UnknownField { entity: String, path: String },

    #[error("unknown lookup '{0}'")]
    UnknownLookup(String),

    #[error("invalid regex pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("field '{field}' on '{entity}' is populated at write time and cannot be indexed")]
    AutoNowField { entity: String, field: String },

    #[error("lookup '{lookup}' cannot index '{field}' of kind {kind}")]
    IncompatibleKind {
        lookup: String,
        field: String,
        kind: String,
    },

    #[error("shadow field '{field}' on '{entity}' is already registered with a different shape")]
    DuplicateShadow { entity: String, field: String },

    #[error("no enabled backend serves the '{strategy}' join strategy")]
    NoBackend { strategy: JoinStrategy },
}

impl RegistryError {
    pub(crate) const fn class(&self) -> ErrorClass {
        ErrorClass::Configuration
    }
}

impl From<RegistryError> for InternalError {
    fn from(err: RegistryError) -> Self {
        Self::with_detail(
            err.class(),
            ErrorOrigin::Registry,
            err.to_string(),
            ErrorDetail::Registry(err),
        )
    }
}

///
/// Indexer
///

#[derive(Debug, Default)]
pub struct Indexer {
    registry: Registry,
    resolver: Resolver,
}

impl Indexer {
    /// An indexer with every backend enabled in the default order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_backends(backends: &[BackendKind]) -> Self {
        Self {
            registry: Registry::new(),
            resolver: Resolver::new(backends),
        }
    }

    /// Build from configuration; declared indexes still need
    /// [`Self::register_declared`] once the host schema is available.
    pub fn from_config(config: &IndexerConfig) -> Result<Self, InternalError> {
        config.validate()?;

        Ok(Self::with_backends(&config.backends))
    }

    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub const fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Register every lookup of one field path.
    ///
    /// Each lookup becomes a rule whose shadow field is created on the host
    /// schema before this returns. Registering an equivalent rule twice is a
    /// no-op.
    pub fn register_index(
        &mut self,
        host: &dyn Host,
        index: FieldIndex,
    ) -> Result<(), InternalError> {
        let strategy = index.effective_strategy();
        if !self.resolver.claims(strategy) {
            return Err(RegistryError::NoBackend { strategy }.into());
        }

        let chain = RelationChain::resolve(host, &index.entity, &index.path)?;

        for spec in &index.lookups {
            let kind = spec.resolve()?;
            let rule =
                LookupRule::build(&index.entity, &index.path, kind, strategy, chain.clone())?;

            if self.registry.admit(&rule)?.is_some() {
                debug!(
                    entity = %index.entity,
                    path = %index.path,
                    shadow = %rule.shadow.name,
                    "lookup already registered"
                );
                continue;
            }

            self.resolver.create_index(&self.registry, host, &rule)?;
            debug!(
                entity = %index.entity,
                path = %index.path,
                strategy = %strategy,
                shadow = %rule.shadow.name,
                "registered lookup"
            );
            self.registry.push(rule);
        }

        Ok(())
    }

    /// Register the `[[index]]` entries of a configuration.
    pub fn register_declared(
        &mut self,
        host: &dyn Host,
        config: &IndexerConfig,
    ) -> Result<(), InternalError> {
        for decl in &config.index {
            self.register_index(host, decl.to_field_index())?;
        }

        Ok(())
    }

    /// Inject shadow values into a write set before it is persisted.
    pub fn convert_write(
        &self,
        host: &dyn Host,
        write: &mut WriteSet,
    ) -> Result<(), InternalError> {
        self.resolver.convert_write(&self.registry, host, write)
    }

    /// Rewrite a lowered query so the store sees only native lookups.
    pub fn rewrite_filters(&self, host: &dyn Host, query: &mut Query) -> Result<(), InternalError> {
        self.resolver.convert_filters(&self.registry, host, query)
    }

    /// Denormalized rules whose shadows copy values out of `entity` records.
    /// Writes to `entity` leave those shadows stale.
    #[must_use]
    pub fn denormalized_dependents(&self, entity: &str) -> Vec<&LookupRule> {
        self.registry.denormalized_from(entity).collect()
    }
}
