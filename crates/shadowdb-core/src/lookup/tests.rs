use crate::{
    db::query::LookupOp,
    lookup::{BUILTIN_LOOKUPS, BuiltinLookup, DatePart, LookupKind, RegexLookup, StandardLookup},
    model::field::{FieldKind, FieldModel},
    test_fixtures::{TextMode, TextOp, compare_text},
    value::Value,
};
use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;
use regex::Regex;

// Native evaluation of a rewritten lookup against a stored shadow value,
// the way an exact/prefix store would answer it.
fn native_match(shadow: &Value, op: LookupOp, operand: &Value) -> bool {
    match shadow {
        Value::List(items) => items.iter().any(|item| native_match(item, op, operand)),
        Value::Null => false,
        _ => match op {
            LookupOp::Exact => shadow == operand,
            LookupOp::Startswith => match (shadow, operand) {
                (Value::Text(text), Value::Text(prefix)) => text.starts_with(prefix.as_str()),
                _ => false,
            },
            other => panic!("rewrite produced non-native operator {other}"),
        },
    }
}

fn emulate(kind: &LookupKind, op: LookupOp, actual: &Value, needle: &Value) -> bool {
    let shadow = kind.convert_value(actual);
    let (native_op, operand) = kind.convert_lookup(op, needle);

    native_match(&shadow, native_op, &operand)
}

fn builtin(op: LookupOp) -> LookupKind {
    LookupKind::from_operator(&op.to_string()).expect("builtin rule")
}

// Alphabet avoids context-sensitive lower-casing (final sigma) so that
// reversing and folding commute.
fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9äÄöÖ ]{0,10}"
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (1900i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).expect("valid date"))
}

proptest! {
    #[test]
    fn text_rules_agree_with_relational_semantics(actual in arb_text(), needle in arb_text()) {
        let cases = [
            (LookupOp::Iexact, TextOp::Eq, TextMode::Ci),
            (LookupOp::Startswith, TextOp::StartsWith, TextMode::Cs),
            (LookupOp::Istartswith, TextOp::StartsWith, TextMode::Ci),
            (LookupOp::Endswith, TextOp::EndsWith, TextMode::Cs),
            (LookupOp::Iendswith, TextOp::EndsWith, TextMode::Ci),
            (LookupOp::Contains, TextOp::Contains, TextMode::Cs),
            (LookupOp::Icontains, TextOp::Contains, TextMode::Ci),
        ];
        let actual = Value::Text(actual);
        let needle = Value::Text(needle);

        for (op, text_op, mode) in cases {
            let expected = compare_text(&actual, &needle, text_op, mode).expect("text operands");
            prop_assert_eq!(
                emulate(&builtin(op), op, &actual, &needle),
                expected,
                "{} disagrees for {:?} / {:?}", op, actual, needle
            );
        }
    }

    #[test]
    fn contains_matches_every_substring(
        actual in "[a-z]{0,12}",
        start in 0usize..12,
        len in 0usize..12,
    ) {
        let start = start.min(actual.len());
        let end = (start + len).min(actual.len());
        let needle = Value::Text(actual[start..end].to_string());

        let actual = Value::Text(actual.clone());

        prop_assert!(emulate(&builtin(LookupOp::Contains), LookupOp::Contains, &actual, &needle));
    }

    #[test]
    fn date_parts_agree_with_calendar(date in arb_date(), probe in arb_date()) {
        let cases = [
            (LookupOp::Year, i64::from(probe.year()), i64::from(date.year())),
            (LookupOp::Month, i64::from(probe.month()), i64::from(date.month())),
            (LookupOp::Day, i64::from(probe.day()), i64::from(date.day())),
            (
                LookupOp::WeekDay,
                i64::from(probe.weekday().number_from_monday()),
                i64::from(date.weekday().number_from_monday()),
            ),
        ];

        for (op, wanted, actual_part) in cases {
            let matched = emulate(&builtin(op), op, &Value::Date(date), &Value::Int(wanted));
            prop_assert_eq!(matched, wanted == actual_part, "{} on {}", op, date);
        }
    }
}

#[test]
fn builtin_table_covers_every_emulated_operator() {
    for op in LookupOp::ALL {
        let regex = matches!(op, LookupOp::Regex | LookupOp::Iregex);
        let expected = (!op.is_native() && !regex) || op == LookupOp::Startswith;
        let found = BUILTIN_LOOKUPS.iter().any(|(candidate, _)| *candidate == op);

        assert_eq!(found, expected, "table entry for {op}");
    }

    for (op, builtin) in BUILTIN_LOOKUPS {
        assert_eq!(builtin.op(), *op, "table entry maps {op} to its own rule");
    }
}

#[test]
fn from_operator_rejects_unknown_and_native_exact() {
    assert!(LookupKind::from_operator("soundex").is_none());
    assert!(LookupKind::from_operator("exact").is_none());
    assert_eq!(
        LookupKind::from_operator("month"),
        Some(LookupKind::Builtin(BuiltinLookup::DatePart(DatePart::Month)))
    );
}

#[test]
fn null_raw_values_have_null_shadows() {
    for (_, builtin) in BUILTIN_LOOKUPS {
        assert_eq!(LookupKind::Builtin(*builtin).convert_value(&Value::Null), Value::Null);
    }
}

#[test]
fn contains_of_empty_string_is_single_empty_suffix() {
    let shadow = builtin(LookupOp::Contains).convert_value(&Value::from(""));

    assert_eq!(shadow, Value::List(vec![Value::from("")]));
}

#[test]
fn week_day_is_iso_numbered() {
    // 2024-01-07 was a Sunday, 2024-01-08 a Monday.
    let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).expect("date");
    let monday = NaiveDate::from_ymd_opt(2024, 1, 8).expect("date");

    assert_eq!(DatePart::WeekDay.extract(&Value::Date(sunday)), Value::Int(7));
    assert_eq!(DatePart::WeekDay.extract(&Value::Date(monday)), Value::Int(1));
}

#[test]
fn timestamps_use_their_utc_date() {
    let ts = NaiveDate::from_ymd_opt(2023, 5, 31)
        .and_then(|d| d.and_hms_opt(23, 59, 0))
        .expect("datetime")
        .and_utc();

    assert_eq!(DatePart::Month.extract(&Value::Timestamp(ts)), Value::Int(5));
    assert_eq!(DatePart::Day.extract(&Value::Timestamp(ts)), Value::Int(31));
}

#[test]
fn regex_rule_only_answers_its_own_pattern() {
    let rule = LookupKind::Regex(RegexLookup::new("^a.c$", false).expect("pattern"));

    assert!(rule.handles(LookupOp::Regex, &Value::from("^a.c$")));
    assert!(!rule.handles(LookupOp::Regex, &Value::from("^a.d$")));
    assert!(!rule.handles(LookupOp::Iregex, &Value::from("^a.c$")));
}

#[test]
fn regex_dot_matches_newline_and_case_flag() {
    let sensitive = LookupKind::Regex(RegexLookup::new("^a.c$", false).expect("pattern"));
    let insensitive = LookupKind::Regex(RegexLookup::new("^a.c$", true).expect("pattern"));

    assert_eq!(sensitive.convert_value(&Value::from("a\nc")), Value::Bool(true));
    assert_eq!(sensitive.convert_value(&Value::from("A\nC")), Value::Bool(false));
    assert_eq!(insensitive.convert_value(&Value::from("A\nC")), Value::Bool(true));
    assert_eq!(
        sensitive.convert_lookup(LookupOp::Regex, &Value::from("^a.c$")),
        (LookupOp::Exact, Value::Bool(true))
    );
}

#[test]
fn compiled_regex_with_inline_flag_is_case_insensitive() {
    let rule = RegexLookup::from(Regex::new("(?i)^yond").expect("pattern"));

    assert!(rule.is_case_insensitive());
    assert_eq!(rule.pattern(), "^yond");
    assert_eq!(rule.op(), LookupOp::Iregex);
}

#[test]
fn regex_tags_differ_by_pattern_and_case() {
    let a = RegexLookup::new("^a", false).expect("pattern");
    let b = RegexLookup::new("^b", false).expect("pattern");
    let ai = RegexLookup::new("^a", true).expect("pattern");

    assert_ne!(a.tag(), b.tag());
    assert_ne!(a.tag(), ai.tag());
    assert!(ai.tag().starts_with("iregex_"));
}

#[test]
fn standard_rule_passes_values_through() {
    let rule = LookupKind::Standard(StandardLookup::default());

    assert!(rule.handles(LookupOp::Lt, &Value::Int(3)));
    assert!(!rule.handles(LookupOp::Iexact, &Value::from("x")));
    assert_eq!(
        rule.convert_lookup(LookupOp::Gte, &Value::Int(3)),
        (LookupOp::Gte, Value::Int(3))
    );
    assert_eq!(rule.convert_value(&Value::from("x")), Value::from("x"));
}

#[test]
fn shadow_fields_follow_rule_family() {
    let source = FieldModel::text("name", 64);

    let iexact = builtin(LookupOp::Iexact).shadow_field("idxf_name_l_iexact", &source);
    assert_eq!(iexact.kind, FieldKind::Text);
    assert_eq!(iexact.max_len, Some(64));
    assert!(iexact.shadow && iexact.nullable);

    let contains = builtin(LookupOp::Contains).shadow_field("idxf_name_l_contains", &source);
    assert_eq!(contains.kind, FieldKind::List(Box::new(FieldKind::Text)));

    let date = FieldModel::new("d", FieldKind::Date);
    let month = builtin(LookupOp::Month).shadow_field("idxf_d_l_month", &date);
    assert_eq!(month.kind, FieldKind::Int);
    assert_eq!(month.max_len, None);
}

#[test]
fn rules_check_field_kinds() {
    assert!(builtin(LookupOp::Iexact).accepts(&FieldKind::Text));
    assert!(!builtin(LookupOp::Iexact).accepts(&FieldKind::Int));
    assert!(builtin(LookupOp::Year).accepts(&FieldKind::Timestamp));
    assert!(!builtin(LookupOp::Year).accepts(&FieldKind::Text));
}
