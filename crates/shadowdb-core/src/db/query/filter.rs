use crate::{
    db::query::{Alias, FieldPath, LookupOp, parse_lookup},
    value::Value,
};
use std::ops::{BitAnd, BitOr, Not};

///
/// Constraint
///
/// A lowered leaf predicate: which alias and column the store reads, the
/// lookup path as the caller wrote it, and the operator and operand.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Constraint {
    pub alias: Alias,
    pub column: String,
    pub path: FieldPath,
    pub op: LookupOp,
    pub value: Value,
}

impl Constraint {
    /// A constraint on the root record type with no joins.
    #[must_use]
    pub fn root(column: impl Into<String>, op: LookupOp, value: impl Into<Value>) -> Self {
        let column = column.into();

        Self {
            alias: Alias::ROOT,
            path: FieldPath::single(column.clone()),
            column,
            op,
            value: value.into(),
        }
    }
}

///
/// FilterNode
///
/// Boolean filter tree over lowered constraints.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FilterNode {
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
    Leaf(Constraint),
}

impl FilterNode {
    /// An empty conjunction; matches every record.
    #[must_use]
    pub const fn all() -> Self {
        Self::And(Vec::new())
    }

    /// Visit every leaf, depth first.
    pub fn for_each_leaf<'a>(&'a self, f: &mut impl FnMut(&'a Constraint)) {
        match self {
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.for_each_leaf(f);
                }
            }
            Self::Not(inner) => inner.for_each_leaf(f),
            Self::Leaf(constraint) => f(constraint),
        }
    }

    /// Visit every leaf mutably, depth first, stopping at the first error.
    pub fn try_for_each_leaf_mut<E>(
        &mut self,
        f: &mut impl FnMut(&mut Constraint) -> Result<(), E>,
    ) -> Result<(), E> {
        match self {
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.try_for_each_leaf_mut(f)?;
                }
                Ok(())
            }
            Self::Not(inner) => inner.try_for_each_leaf_mut(f),
            Self::Leaf(constraint) => f(constraint),
        }
    }

    /// Collect references to every leaf.
    #[must_use]
    pub fn leaves(&self) -> Vec<&Constraint> {
        let mut out = Vec::new();
        self.for_each_leaf(&mut |leaf| out.push(leaf));
        out
    }

    /// Visit every leaf together with whether an `Or`/`Not` sits above it.
    pub fn for_each_leaf_scoped(&self, f: &mut impl FnMut(&Constraint, bool)) {
        self.walk_scoped(false, f);
    }

    fn walk_scoped(&self, disjunctive: bool, f: &mut impl FnMut(&Constraint, bool)) {
        match self {
            Self::And(children) => {
                for child in children {
                    child.walk_scoped(disjunctive, f);
                }
            }
            Self::Or(children) => {
                for child in children {
                    child.walk_scoped(true, f);
                }
            }
            Self::Not(inner) => inner.walk_scoped(true, f),
            Self::Leaf(constraint) => f(constraint, disjunctive),
        }
    }
}

///
/// FilterSpec
///
/// Unlowered filter as a caller writes it: lookup expressions such as
/// `author__name__iexact` combined with AND / OR / NOT.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FilterSpec {
    Lookup { expr: String, value: Value },
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
}

impl FilterSpec {
    #[must_use]
    pub fn lookup(expr: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lookup {
            expr: expr.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub const fn and(specs: Vec<Self>) -> Self {
        Self::And(specs)
    }

    #[must_use]
    pub const fn or(specs: Vec<Self>) -> Self {
        Self::Or(specs)
    }

    /// Split a lookup leaf into path and operator.
    #[must_use]
    pub fn parsed(&self) -> Option<(FieldPath, LookupOp, &Value)> {
        match self {
            Self::Lookup { expr, value } => {
                let (path, op) = parse_lookup(expr);
                Some((path, op, value))
            }
            _ => None,
        }
    }
}

impl BitAnd for FilterSpec {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::And(vec![self, rhs])
    }
}

impl BitOr for FilterSpec {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::Or(vec![self, rhs])
    }
}

impl Not for FilterSpec {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::Not(Box::new(self))
    }
}
