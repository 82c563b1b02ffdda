use crate::value::Value;
use serde::{Deserialize, Serialize};

///
/// FieldKind
///
/// Scalar shape of a declared field.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum FieldKind {
    Bool,
    Int,
    Text,
    Date,
    Timestamp,
    List(Box<Self>),
    Relation { target: String },
}

impl FieldKind {
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text)
    }

    #[must_use]
    pub const fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Timestamp)
    }

    /// Target record type when this field is a foreign key.
    #[must_use]
    pub fn relation_target(&self) -> Option<&str> {
        match self {
            Self::Relation { target } => Some(target),
            _ => None,
        }
    }

    /// Whether a value may be stored in a field of this kind.
    /// Null is admitted everywhere; nullability is checked separately.
    #[must_use]
    pub fn admits(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null)
            | (Self::Bool, Value::Bool(_))
            | (Self::Int, Value::Int(_))
            | (Self::Text, Value::Text(_))
            | (Self::Date, Value::Date(_))
            | (Self::Timestamp, Value::Timestamp(_)) => true,
            (Self::List(item), Value::List(values)) => values.iter().all(|v| item.admits(v)),
            (Self::Relation { target }, Value::Ref(record)) => record.entity == *target,
            _ => false,
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Bool => "bool".to_string(),
            Self::Int => "int".to_string(),
            Self::Text => "text".to_string(),
            Self::Date => "date".to_string(),
            Self::Timestamp => "timestamp".to_string(),
            Self::List(item) => format!("list<{}>", item.label()),
            Self::Relation { target } => format!("relation<{target}>"),
        }
    }
}

///
/// FieldModel
///
/// Runtime field metadata used by registration, writes, and lowering.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FieldModel {
    /// Field name as used in lookups and write sets.
    pub name: String,
    pub kind: FieldKind,
    pub max_len: Option<u32>,
    pub nullable: bool,

    /// Populated by the host at write time (e.g. creation timestamps).
    pub auto_now: bool,

    /// Synthesized by the engine to hold a precomputed lookup value.
    pub shadow: bool,
}

impl FieldModel {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            max_len: None,
            nullable: false,
            auto_now: false,
            shadow: false,
        }
    }

    #[must_use]
    pub fn text(name: impl Into<String>, max_len: u32) -> Self {
        Self::new(name, FieldKind::Text).max_len(max_len)
    }

    #[must_use]
    pub fn relation(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldKind::Relation {
                target: target.into(),
            },
        )
    }

    #[must_use]
    pub const fn max_len(mut self, max_len: u32) -> Self {
        self.max_len = Some(max_len);
        self
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub const fn auto_now(mut self) -> Self {
        self.auto_now = true;
        self
    }

    /// Column carrying the raw key of a relation field.
    #[must_use]
    pub fn raw_id_column(&self) -> Option<String> {
        self.kind
            .relation_target()
            .map(|_| format!("{}_id", self.name))
    }
}
