use derive_more::Display;
use std::str::FromStr;

///
/// LookupOp
///
/// Relational-style lookup operator as written at the end of a lookup
/// expression (`name__iexact`). Only the native subset reaches the store.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum LookupOp {
    #[display("exact")]
    Exact,
    #[display("iexact")]
    Iexact,
    #[display("startswith")]
    Startswith,
    #[display("istartswith")]
    Istartswith,
    #[display("endswith")]
    Endswith,
    #[display("iendswith")]
    Iendswith,
    #[display("contains")]
    Contains,
    #[display("icontains")]
    Icontains,
    #[display("regex")]
    Regex,
    #[display("iregex")]
    Iregex,
    #[display("year")]
    Year,
    #[display("month")]
    Month,
    #[display("day")]
    Day,
    #[display("week_day")]
    WeekDay,
    #[display("in")]
    In,
    #[display("lt")]
    Lt,
    #[display("lte")]
    Lte,
    #[display("gt")]
    Gt,
    #[display("gte")]
    Gte,
    #[display("range")]
    Range,
    #[display("isnull")]
    IsNull,
}

impl LookupOp {
    pub const ALL: [Self; 21] = [
        Self::Exact,
        Self::Iexact,
        Self::Startswith,
        Self::Istartswith,
        Self::Endswith,
        Self::Iendswith,
        Self::Contains,
        Self::Icontains,
        Self::Regex,
        Self::Iregex,
        Self::Year,
        Self::Month,
        Self::Day,
        Self::WeekDay,
        Self::In,
        Self::Lt,
        Self::Lte,
        Self::Gt,
        Self::Gte,
        Self::Range,
        Self::IsNull,
    ];

    /// Operators an exact-match/range store evaluates without help.
    #[must_use]
    pub const fn is_native(self) -> bool {
        matches!(
            self,
            Self::Exact
                | Self::Startswith
                | Self::In
                | Self::Lt
                | Self::Lte
                | Self::Gt
                | Self::Gte
                | Self::Range
                | Self::IsNull
        )
    }

    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.to_string() == name)
    }
}

impl FromStr for LookupOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown lookup operator '{s}'"))
    }
}
