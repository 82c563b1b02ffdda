//! Filter-tree representation shared with the host query layer.

mod filter;
mod join;
mod lower;
mod op;
mod path;


use crate::error::{ErrorClass, ErrorDetail, ErrorOrigin, InternalError};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

pub use filter::{Constraint, FilterNode, FilterSpec};
pub use join::{Alias, Join, JoinMap};
pub use lower::lower;
pub use op::LookupOp;
pub use path::{FieldPath, LOOKUP_SEP, parse_lookup};

///
/// QueryError
///

#[derive(Debug, ThisError)]
pub enum QueryError {
    #[error("operator '{op}' on '{column}' is not supported by the store")]
    UnsupportedOperator { op: LookupOp, column: String },

    #[error("query on '{entity}' needs joins but the store cannot execute them")]
    JoinsUnsupported { entity: String },

    #[error("in-memory join filter '{path}' cannot be nested under OR/NOT")]
    DisjunctiveJoin { path: String },

    #[error("field '{field}' on record type '{entity}' is not a relation")]
    NotARelation { entity: String, field: String },

    #[error("operand for '{op}' must be {expected}, found {found}")]
    InvalidOperand {
        op: LookupOp,
        expected: &'static str,
        found: &'static str,
    },

    #[error("constraint reads alias {alias} which the query does not define")]
    DanglingAlias { alias: Alias },

    #[error("join {alias} has refcount {found}, but {expected} constraints read through it")]
    RefcountMismatch {
        alias: Alias,
        expected: usize,
        found: usize,
    },

    #[error("no join for path '{path}' in query on '{entity}'")]
    MissingJoinPath { entity: String, path: String },
}

impl QueryError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::UnsupportedOperator { .. }
            | Self::JoinsUnsupported { .. }
            | Self::DisjunctiveJoin { .. }
            | Self::InvalidOperand { .. } => ErrorClass::Unsupported,
            Self::NotARelation { .. } => ErrorClass::NotFound,
            Self::DanglingAlias { .. }
            | Self::RefcountMismatch { .. }
            | Self::MissingJoinPath { .. } => ErrorClass::InvariantViolation,
        }
    }
}

impl From<QueryError> for InternalError {
    fn from(err: QueryError) -> Self {
        Self::with_detail(
            err.class(),
            ErrorOrigin::Query,
            err.to_string(),
            ErrorDetail::Query(err),
        )
    }
}

///
/// Query
///
/// One read against one record type: the filter tree and the joins its
/// constraints read through.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Query {
    pub entity: String,
    pub joins: JoinMap,
    pub filter: FilterNode,
}

impl Query {
    /// A query matching every record of `entity`.
    #[must_use]
    pub fn new(entity: impl Into<String>) -> Self {
        let entity = entity.into();

        Self {
            joins: JoinMap::new(entity.clone()),
            entity,
            filter: FilterNode::all(),
        }
    }

    /// A join-free conjunction of root constraints.
    #[must_use]
    pub fn conjunction(entity: impl Into<String>, constraints: Vec<Constraint>) -> Self {
        let mut query = Self::new(entity);
        query.filter = FilterNode::And(constraints.into_iter().map(FilterNode::Leaf).collect());
        query
    }

    /// AND a constraint into the top level of the filter tree.
    pub fn push_conjunct(&mut self, constraint: Constraint) {
        self.joins.ref_chain(constraint.alias);

        match &mut self.filter {
            FilterNode::And(children) => children.push(FilterNode::Leaf(constraint)),
            other => {
                let previous = std::mem::replace(other, FilterNode::all());
                *other = FilterNode::And(vec![previous, FilterNode::Leaf(constraint)]);
            }
        }
    }

    /// Verify alias bookkeeping: every constraint reads a defined alias and
    /// every join's refcount equals the constraints reading through it.
    pub fn check_well_formed(&self) -> Result<(), InternalError> {
        let mut expected: BTreeMap<Alias, usize> = BTreeMap::new();
        let mut dangling = None;

        self.filter.for_each_leaf(&mut |leaf| {
            if !self.joins.contains(leaf.alias) {
                dangling.get_or_insert(leaf.alias);
                return;
            }
            for hop in self.joins.chain(leaf.alias) {
                *expected.entry(hop).or_default() += 1;
            }
        });

        if let Some(alias) = dangling {
            return Err(QueryError::DanglingAlias { alias }.into());
        }

        for (alias, join) in self.joins.iter() {
            if !self.joins.contains(join.parent) {
                return Err(QueryError::DanglingAlias { alias: join.parent }.into());
            }

            let want = expected.get(&alias).copied().unwrap_or_default();
            if join.refcount != want || want == 0 {
                return Err(QueryError::RefcountMismatch {
                    alias,
                    expected: want,
                    found: join.refcount,
                }
                .into());
            }
        }

        Ok(())
    }
}
