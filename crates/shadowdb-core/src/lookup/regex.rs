use crate::{db::query::LookupOp, value::Value};
use regex::{Regex, RegexBuilder};
use std::fmt;
use xxhash_rust::xxh3::xxh3_64;

const CASE_INSENSITIVE_FLAG: &str = "(?i)";

///
/// RegexLookup
///
/// One precompiled pattern. The shadow holds a boolean match result, so the
/// rule only answers filters whose operand is this exact pattern text.
///

#[derive(Clone)]
pub struct RegexLookup {
    pattern: String,
    case_insensitive: bool,
    regex: Regex,
}

impl RegexLookup {
    /// Compile `pattern`; `.` matches newlines and matching is unicode-aware.
    pub fn new(pattern: &str, case_insensitive: bool) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .dot_matches_new_line(true)
            .unicode(true)
            .build()?;

        Ok(Self {
            pattern: pattern.to_string(),
            case_insensitive,
            regex,
        })
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub const fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    #[must_use]
    pub const fn op(&self) -> LookupOp {
        if self.case_insensitive {
            LookupOp::Iregex
        } else {
            LookupOp::Regex
        }
    }

    /// `regex_<hash>` / `iregex_<hash>`; distinct patterns get distinct shadows.
    #[must_use]
    pub fn tag(&self) -> String {
        format!("{}_{:016x}", self.op(), xxh3_64(self.pattern.as_bytes()))
    }

    pub(crate) fn handles(&self, op: LookupOp, value: &Value) -> bool {
        op == self.op() && value.as_text() == Some(self.pattern.as_str())
    }

    pub(crate) fn convert_value(&self, value: &Value) -> Value {
        match value {
            Value::Text(text) => Value::Bool(self.regex.is_match(text)),
            Value::Null => Value::Null,
            _ => Value::Bool(false),
        }
    }

    pub(crate) const fn convert_lookup() -> (LookupOp, Value) {
        (LookupOp::Exact, Value::Bool(true))
    }
}

impl From<Regex> for RegexLookup {
    /// Adopt a compiled pattern; a leading `(?i)` marks it case-insensitive.
    fn from(regex: Regex) -> Self {
        let source = regex.as_str();
        let (pattern, case_insensitive) = match source.strip_prefix(CASE_INSENSITIVE_FLAG) {
            Some(rest) => (rest.to_string(), true),
            None => (source.to_string(), false),
        };

        Self {
            pattern,
            case_insensitive,
            regex,
        }
    }
}

impl fmt::Debug for RegexLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegexLookup")
            .field("pattern", &self.pattern)
            .field("case_insensitive", &self.case_insensitive)
            .finish_non_exhaustive()
    }
}

impl PartialEq for RegexLookup {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.case_insensitive == other.case_insensitive
    }
}

impl Eq for RegexLookup {}
