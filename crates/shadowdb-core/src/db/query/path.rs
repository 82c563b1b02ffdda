use crate::db::query::LookupOp;
use std::fmt;

/// Separator between relation hops, fields, and the trailing operator.
pub const LOOKUP_SEP: &str = "__";

///
/// FieldPath
///
/// A field reached from a record type through zero or more foreign keys:
/// `author__publisher__name` is relations `[author, publisher]`, field `name`.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FieldPath {
    relations: Vec<String>,
    field: String,
}

impl FieldPath {
    #[must_use]
    pub fn new(relations: Vec<String>, field: impl Into<String>) -> Self {
        Self {
            relations,
            field: field.into(),
        }
    }

    /// A path with no relation hops.
    #[must_use]
    pub fn single(field: impl Into<String>) -> Self {
        Self::new(Vec::new(), field)
    }

    /// Parse a dotted path without an operator suffix.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let mut segments: Vec<String> = path.split(LOOKUP_SEP).map(str::to_string).collect();
        let field = segments.pop().unwrap_or_default();

        Self::new(segments, field)
    }

    #[must_use]
    pub fn relations(&self) -> &[String] {
        &self.relations
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Number of foreign-key hops before the terminal field.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.relations.len()
    }

    #[must_use]
    pub const fn is_direct(&self) -> bool {
        self.relations.is_empty()
    }

    /// The path one hop closer to the origin: `a__b__c` → `a__b`.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (last, rest) = self.relations.split_last()?;

        Some(Self::new(rest.to_vec(), last.clone()))
    }

    /// Same relation hops, different terminal field.
    #[must_use]
    pub fn with_field(&self, field: impl Into<String>) -> Self {
        Self::new(self.relations.clone(), field)
    }

    /// Flattened segments: relations followed by the field.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.relations
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.field.as_str()))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self.segments().collect::<Vec<_>>().join(LOOKUP_SEP);
        write!(f, "{joined}")
    }
}

/// Split a lookup expression into its path and operator.
///
/// A trailing segment naming a known operator is the operator; anything
/// else is part of the path and the operator defaults to `exact`.
#[must_use]
pub fn parse_lookup(expr: &str) -> (FieldPath, LookupOp) {
    if let Some((path, last)) = expr.rsplit_once(LOOKUP_SEP)
        && let Some(op) = LookupOp::parse(last)
    {
        return (FieldPath::parse(path), op);
    }

    (FieldPath::parse(expr), LookupOp::Exact)
}
