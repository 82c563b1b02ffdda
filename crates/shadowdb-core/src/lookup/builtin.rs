use crate::{
    db::query::LookupOp,
    lookup::DatePart,
    model::field::FieldKind,
    value::{Value, lower, reverse, suffixes},
};

///
/// BUILTIN_LOOKUPS
///
/// Static operator → rule table consulted for bare operator registrations.
///

pub const BUILTIN_LOOKUPS: &[(LookupOp, BuiltinLookup)] = &[
    (LookupOp::Iexact, BuiltinLookup::Iexact),
    (LookupOp::Startswith, BuiltinLookup::Startswith),
    (LookupOp::Istartswith, BuiltinLookup::Istartswith),
    (LookupOp::Endswith, BuiltinLookup::Endswith),
    (LookupOp::Iendswith, BuiltinLookup::Iendswith),
    (LookupOp::Contains, BuiltinLookup::Contains),
    (LookupOp::Icontains, BuiltinLookup::Icontains),
    (LookupOp::Year, BuiltinLookup::DatePart(DatePart::Year)),
    (LookupOp::Month, BuiltinLookup::DatePart(DatePart::Month)),
    (LookupOp::Day, BuiltinLookup::DatePart(DatePart::Day)),
    (LookupOp::WeekDay, BuiltinLookup::DatePart(DatePart::WeekDay)),
];

///
/// BuiltinLookup
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BuiltinLookup {
    Iexact,
    Startswith,
    Istartswith,
    Endswith,
    Iendswith,
    Contains,
    Icontains,
    DatePart(DatePart),
}

impl BuiltinLookup {
    /// The operator this rule answers.
    #[must_use]
    pub const fn op(self) -> LookupOp {
        match self {
            Self::Iexact => LookupOp::Iexact,
            Self::Startswith => LookupOp::Startswith,
            Self::Istartswith => LookupOp::Istartswith,
            Self::Endswith => LookupOp::Endswith,
            Self::Iendswith => LookupOp::Iendswith,
            Self::Contains => LookupOp::Contains,
            Self::Icontains => LookupOp::Icontains,
            Self::DatePart(part) => part.op(),
        }
    }

    #[must_use]
    pub const fn accepts(self, kind: &FieldKind) -> bool {
        match self {
            Self::DatePart(_) => kind.is_temporal(),
            _ => kind.is_text(),
        }
    }

    pub(crate) fn shadow_kind(self) -> FieldKind {
        match self {
            Self::Contains | Self::Icontains => FieldKind::List(Box::new(FieldKind::Text)),
            Self::DatePart(_) => FieldKind::Int,
            _ => FieldKind::Text,
        }
    }

    pub(crate) fn convert_value(self, value: &Value) -> Value {
        match self {
            Self::Startswith => value.clone(),
            Self::Iexact | Self::Istartswith => value.map_text(lower),
            Self::Endswith => value.map_text(reverse),
            Self::Iendswith => value.map_text(|text| lower(&reverse(text))),
            Self::Contains => expand_suffixes(value, false),
            Self::Icontains => expand_suffixes(value, true),
            Self::DatePart(part) => part.extract(value),
        }
    }

    pub(crate) fn convert_lookup(self, value: &Value) -> (LookupOp, Value) {
        match self {
            Self::Iexact => (LookupOp::Exact, value.map_text(lower)),
            Self::Startswith | Self::Contains => (LookupOp::Startswith, value.clone()),
            Self::Istartswith | Self::Icontains => (LookupOp::Startswith, value.map_text(lower)),
            Self::Endswith => (LookupOp::Startswith, value.map_text(reverse)),
            Self::Iendswith => (
                LookupOp::Startswith,
                value.map_text(|text| lower(&reverse(text))),
            ),
            Self::DatePart(_) => (LookupOp::Exact, value.clone()),
        }
    }
}

// Substring emulation: every suffix is stored, so `contains` becomes a
// prefix match against any element of the list.
fn expand_suffixes(value: &Value, case_fold: bool) -> Value {
    let Some(text) = value.as_text() else {
        return Value::Null;
    };
    let text = if case_fold { lower(text) } else { text.to_string() };

    Value::List(suffixes(&text).into_iter().map(Value::Text).collect())
}
