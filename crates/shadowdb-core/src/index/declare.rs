use crate::{
    db::query::FieldPath,
    index::RegistryError,
    lookup::{LookupKind, RegexLookup, StandardLookup},
};
use derive_more::Display;
use regex::Regex;
use serde::{Deserialize, Serialize};

const REGEX_PREFIX: &str = "regex:";
const IREGEX_PREFIX: &str = "iregex:";
const STANDARD: &str = "standard";

///
/// JoinStrategy
///
/// How a lookup that crosses foreign keys is served.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinStrategy {
    /// No relation hops; the shadow sits beside the field.
    #[display("direct")]
    Direct,

    /// Copy the transformed terminal value onto the origin record on write.
    #[display("denormalize")]
    Denormalize,

    /// Shadow on the target; reads resolve keys with sub-queries.
    #[display("in_memory")]
    InMemory,

    /// Shadow on the target; reads keep the host join and swap the column.
    #[display("constant_field")]
    ConstantField,
}

impl JoinStrategy {
    /// Whether the shadow lives on the terminal record type.
    #[must_use]
    pub const fn is_target_side(self) -> bool {
        matches!(self, Self::InMemory | Self::ConstantField)
    }
}

///
/// LookupSpec
///
/// One lookup as a caller declares it: a bare operator name (also
/// `regex:<pattern>`, `iregex:<pattern>`, `standard`) or a built rule.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LookupSpec {
    Named(String),
    Kind(LookupKind),
}

impl LookupSpec {
    /// Resolve the declaration into a concrete rule.
    pub fn resolve(&self) -> Result<LookupKind, RegistryError> {
        let name = match self {
            Self::Kind(kind) => return Ok(kind.clone()),
            Self::Named(name) => name.as_str(),
        };

        if name == STANDARD {
            return Ok(StandardLookup::default().into());
        }

        let pattern = name
            .strip_prefix(REGEX_PREFIX)
            .map(|pattern| (pattern, false))
            .or_else(|| name.strip_prefix(IREGEX_PREFIX).map(|pattern| (pattern, true)));
        if let Some((pattern, case_insensitive)) = pattern {
            let regex = RegexLookup::new(pattern, case_insensitive).map_err(|err| {
                RegistryError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: err.to_string(),
                }
            })?;

            return Ok(regex.into());
        }

        LookupKind::from_operator(name)
            .ok_or_else(|| RegistryError::UnknownLookup(name.to_string()))
    }
}

impl From<&str> for LookupSpec {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for LookupSpec {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<LookupKind> for LookupSpec {
    fn from(kind: LookupKind) -> Self {
        Self::Kind(kind)
    }
}

impl From<Regex> for LookupSpec {
    fn from(regex: Regex) -> Self {
        Self::Kind(RegexLookup::from(regex).into())
    }
}

impl From<RegexLookup> for LookupSpec {
    fn from(regex: RegexLookup) -> Self {
        Self::Kind(regex.into())
    }
}

impl From<StandardLookup> for LookupSpec {
    fn from(standard: StandardLookup) -> Self {
        Self::Kind(standard.into())
    }
}

///
/// FieldIndex
///
/// Registration request for one field path of one record type.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldIndex {
    pub entity: String,
    pub path: FieldPath,
    pub lookups: Vec<LookupSpec>,

    /// Defaults to `Denormalize` for dotted paths and `Direct` otherwise.
    pub strategy: Option<JoinStrategy>,
}

impl FieldIndex {
    #[must_use]
    pub fn new(entity: impl Into<String>, path: &str) -> Self {
        Self {
            entity: entity.into(),
            path: FieldPath::parse(path),
            lookups: Vec::new(),
            strategy: None,
        }
    }

    #[must_use]
    pub fn lookup(mut self, lookup: impl Into<LookupSpec>) -> Self {
        self.lookups.push(lookup.into());
        self
    }

    #[must_use]
    pub const fn strategy(mut self, strategy: JoinStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// The strategy actually used: paths without hops are always direct.
    #[must_use]
    pub fn effective_strategy(&self) -> JoinStrategy {
        if self.path.is_direct() {
            return JoinStrategy::Direct;
        }

        match self.strategy {
            None | Some(JoinStrategy::Direct) => JoinStrategy::Denormalize,
            Some(strategy) => strategy,
        }
    }
}
