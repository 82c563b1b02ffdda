use crate::db::query::LookupOp;

///
/// StandardLookup
///
/// Pass-through rule: the shadow is a plain copy of the referenced field, so
/// native operators can run on a de-referenced value without a join.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StandardLookup {
    lookup_types: Vec<LookupOp>,
}

impl StandardLookup {
    pub(crate) const TAG: &'static str = "standard";

    /// Restrict the rule to a subset of native operators.
    #[must_use]
    pub fn with_types(lookup_types: Vec<LookupOp>) -> Self {
        Self { lookup_types }
    }

    #[must_use]
    pub fn lookup_types(&self) -> &[LookupOp] {
        &self.lookup_types
    }

    pub(crate) fn handles(&self, op: LookupOp) -> bool {
        self.lookup_types.contains(&op)
    }
}

impl Default for StandardLookup {
    fn default() -> Self {
        Self::with_types(vec![
            LookupOp::Exact,
            LookupOp::In,
            LookupOp::Lt,
            LookupOp::Lte,
            LookupOp::Gt,
            LookupOp::Gte,
            LookupOp::Range,
            LookupOp::IsNull,
        ])
    }
}
