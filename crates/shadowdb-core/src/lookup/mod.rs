//! Lookup rules: the unit of emulation logic.
//!
//! Each rule maps one relational operator to a write-time value transform
//! and a read-time (operator, value) rewrite against a shadow field. The two
//! transforms must stay in lockstep: a native lookup on the shadow value has
//! to accept exactly the records the original operator would.

mod builtin;
mod date;
mod regex;
mod standard;

#[cfg(test)]
mod tests;

use crate::{
    db::query::LookupOp,
    model::field::{FieldKind, FieldModel},
    value::Value,
};

// re-exports
pub use builtin::{BUILTIN_LOOKUPS, BuiltinLookup};
pub use date::DatePart;
pub use regex::RegexLookup;
pub use standard::StandardLookup;

///
/// LookupKind
///
/// Closed set of rule kinds. Operator names resolve to `Builtin` through
/// [`BUILTIN_LOOKUPS`]; regex rules carry their compiled pattern.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LookupKind {
    Builtin(BuiltinLookup),
    Regex(RegexLookup),
    Standard(StandardLookup),
}

impl LookupKind {
    /// Resolve a bare operator name through the builtin table.
    #[must_use]
    pub fn from_operator(name: &str) -> Option<Self> {
        let op = LookupOp::parse(name)?;

        BUILTIN_LOOKUPS
            .iter()
            .find(|(candidate, _)| *candidate == op)
            .map(|(_, builtin)| Self::Builtin(*builtin))
    }

    /// Operator class used in shadow field names.
    #[must_use]
    pub fn tag(&self) -> String {
        match self {
            Self::Builtin(builtin) => builtin.op().to_string(),
            Self::Regex(regex) => regex.tag(),
            Self::Standard(_) => StandardLookup::TAG.to_string(),
        }
    }

    /// Whether this rule answers `op` with operand `value`.
    #[must_use]
    pub fn handles(&self, op: LookupOp, value: &Value) -> bool {
        match self {
            Self::Builtin(builtin) => builtin.op() == op,
            Self::Regex(regex) => regex.handles(op, value),
            Self::Standard(standard) => standard.handles(op),
        }
    }

    /// Whether the rule can be computed from a field of this kind.
    #[must_use]
    pub fn accepts(&self, kind: &FieldKind) -> bool {
        match self {
            Self::Builtin(builtin) => builtin.accepts(kind),
            Self::Regex(_) => kind.is_text(),
            Self::Standard(_) => true,
        }
    }

    /// Read-time rewrite: the native operator and operand for the shadow.
    #[must_use]
    pub fn convert_lookup(&self, op: LookupOp, value: &Value) -> (LookupOp, Value) {
        match self {
            Self::Builtin(builtin) => builtin.convert_lookup(value),
            Self::Regex(_) => RegexLookup::convert_lookup(),
            Self::Standard(_) => (op, value.clone()),
        }
    }

    /// Write-time transform from the raw field value to the shadow value.
    #[must_use]
    pub fn convert_value(&self, value: &Value) -> Value {
        if value.is_null() {
            return Value::Null;
        }

        match self {
            Self::Builtin(builtin) => builtin.convert_value(value),
            Self::Regex(regex) => regex.convert_value(value),
            Self::Standard(_) => value.clone(),
        }
    }

    /// Shape of the shadow field derived from the source field.
    #[must_use]
    pub fn shadow_field(&self, name: &str, source: &FieldModel) -> FieldModel {
        let kind = match self {
            Self::Builtin(builtin) => builtin.shadow_kind(),
            Self::Regex(_) => FieldKind::Bool,
            Self::Standard(_) => source.kind.clone(),
        };
        let max_len = match kind {
            FieldKind::Text | FieldKind::List(_) => source.max_len,
            _ => None,
        };

        FieldModel {
            name: name.to_string(),
            kind,
            max_len,
            nullable: true,
            auto_now: false,
            shadow: true,
        }
    }
}

impl From<BuiltinLookup> for LookupKind {
    fn from(builtin: BuiltinLookup) -> Self {
        Self::Builtin(builtin)
    }
}

impl From<RegexLookup> for LookupKind {
    fn from(regex: RegexLookup) -> Self {
        Self::Regex(regex)
    }
}

impl From<StandardLookup> for LookupKind {
    fn from(standard: StandardLookup) -> Self {
        Self::Standard(standard)
    }
}
