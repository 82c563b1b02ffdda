use crate::{db::query::LookupOp, value::Value};
use chrono::Datelike;

///
/// DatePart
///
/// Integer component extracted from a date or timestamp.
/// `WeekDay` is ISO numbered: Monday = 1 … Sunday = 7.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DatePart {
    Year,
    Month,
    Day,
    WeekDay,
}

impl DatePart {
    #[must_use]
    pub const fn op(self) -> LookupOp {
        match self {
            Self::Year => LookupOp::Year,
            Self::Month => LookupOp::Month,
            Self::Day => LookupOp::Day,
            Self::WeekDay => LookupOp::WeekDay,
        }
    }

    /// Extract this part; non-temporal values yield null.
    #[must_use]
    pub fn extract(self, value: &Value) -> Value {
        match value {
            Value::Date(date) => Value::Int(self.of(date)),
            Value::Timestamp(ts) => Value::Int(self.of(&ts.date_naive())),
            _ => Value::Null,
        }
    }

    fn of(self, date: &impl Datelike) -> i64 {
        match self {
            Self::Year => i64::from(date.year()),
            Self::Month => i64::from(date.month()),
            Self::Day => i64::from(date.day()),
            Self::WeekDay => i64::from(date.weekday().number_from_monday()),
        }
    }
}
