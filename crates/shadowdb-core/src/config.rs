//! Declarative indexer configuration.
//!
//! ```toml
//! backends = ["shadow_index", "fk_null_fix", "in_memory_join"]
//!
//! [[index]]
//! entity = "blog::Post"
//! field = "author__name"
//! lookups = ["iexact", "regex:^Dr\\."]
//! strategy = "in_memory"
//! ```

use crate::{
    error::{ErrorClass, ErrorDetail, ErrorOrigin, InternalError},
    index::{FieldIndex, JoinStrategy},
    resolver::BackendKind,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("invalid indexer config: {0}")]
    Parse(String),

    #[error("indexer config enables no backends")]
    NoBackends,

    #[error("backend '{0}' is listed more than once")]
    DuplicateBackend(BackendKind),

    #[error("index on '{entity}.{field}' declares no lookups")]
    EmptyLookups { entity: String, field: String },
}

impl ConfigError {
    pub(crate) const fn class(&self) -> ErrorClass {
        ErrorClass::Configuration
    }
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::with_detail(
            err.class(),
            ErrorOrigin::Config,
            err.to_string(),
            ErrorDetail::Config(err),
        )
    }
}

///
/// IndexerConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IndexerConfig {
    /// Resolver backends in chain order.
    #[serde(default = "default_backends")]
    pub backends: Vec<BackendKind>,

    #[serde(default)]
    pub index: Vec<IndexDecl>,
}

impl IndexerConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, InternalError> {
        let config: Self =
            toml::from_str(source).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), InternalError> {
        if self.backends.is_empty() {
            return Err(ConfigError::NoBackends.into());
        }

        let mut seen = BTreeSet::new();
        for backend in &self.backends {
            if !seen.insert(*backend) {
                return Err(ConfigError::DuplicateBackend(*backend).into());
            }
        }

        if let Some(decl) = self.index.iter().find(|decl| decl.lookups.is_empty()) {
            return Err(ConfigError::EmptyLookups {
                entity: decl.entity.clone(),
                field: decl.field.clone(),
            }
            .into());
        }

        Ok(())
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            backends: default_backends(),
            index: Vec::new(),
        }
    }
}

fn default_backends() -> Vec<BackendKind> {
    BackendKind::DEFAULT.to_vec()
}

///
/// IndexDecl
///
/// One `[[index]]` entry.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IndexDecl {
    pub entity: String,
    pub field: String,
    pub lookups: Vec<String>,

    #[serde(default)]
    pub strategy: Option<JoinStrategy>,
}

impl IndexDecl {
    #[must_use]
    pub fn to_field_index(&self) -> FieldIndex {
        let mut index = self
            .lookups
            .iter()
            .fold(FieldIndex::new(&self.entity, &self.field), |index, lookup| {
                index.lookup(lookup.as_str())
            });
        index.strategy = self.strategy;

        index
    }
}
