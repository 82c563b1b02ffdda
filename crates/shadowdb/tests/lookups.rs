mod fixtures;

use chrono::{Datelike, Utc};
use fixtures::{AUTHOR, BOOK, keys, library, seed};
use proptest::prelude::*;
use shadowdb::prelude::*;

fn indexed_names(db: &MemoryDb) -> Indexer {
    let mut indexer = Indexer::new();
    indexer
        .register_index(
            db,
            FieldIndex::new(AUTHOR, "name")
                .lookup("iexact")
                .lookup("istartswith")
                .lookup("endswith")
                .lookup("iendswith")
                .lookup("contains")
                .lookup("icontains"),
        )
        .expect("register name lookups");

    indexer
}

#[test]
fn text_lookups_match_native_semantics() {
    let db = library(false);
    let indexer = indexed_names(&db);
    let session = Session::new(&indexer, &db);
    seed(&session);

    let cases: &[(&str, &str, &[i64])] = &[
        ("name__iexact", "itachi", &[1]),
        ("name__iexact", "ITACHI", &[1]),
        ("name__istartswith", "yond", &[2]),
        ("name__startswith", "It", &[1]),
        ("name__startswith", "it", &[]),
        ("name__endswith", "mE", &[2]),
        ("name__endswith", "me", &[]),
        ("name__iendswith", "AIME", &[2]),
        ("name__contains", "Ach", &[1]),
        ("name__contains", "ach", &[]),
        ("name__icontains", "ACH", &[1]),
        ("name__icontains", "i", &[1, 2, 3]),
        ("name__exact", "Jiraiya", &[3]),
    ];

    for (lookup, value, expected) in cases {
        let found = session
            .filter(AUTHOR, &FilterSpec::lookup(*lookup, *value))
            .expect("filter");

        assert_eq!(found, keys(expected), "{lookup} = {value:?}");
    }
}

#[test]
fn lookups_combine_under_boolean_operators() {
    let db = library(false);
    let indexer = indexed_names(&db);
    let session = Session::new(&indexer, &db);
    seed(&session);

    let spec = (FilterSpec::lookup("name__icontains", "i")
        & !FilterSpec::lookup("name__iendswith", "ya"))
        | FilterSpec::lookup("name__iexact", "jiraiya");

    assert_eq!(session.filter(AUTHOR, &spec).expect("filter"), keys(&[1, 2, 3]));
}

#[test]
fn unregistered_emulated_lookups_reach_the_store_untouched() {
    let db = library(false);
    let indexer = Indexer::new();
    let session = Session::new(&indexer, &db);
    seed(&session);

    let err = session
        .filter(AUTHOR, &FilterSpec::lookup("name__iexact", "itachi"))
        .expect_err("store has no iexact");

    assert!(err.is_unsupported());
}

#[test]
fn date_parts_index_timestamps() {
    let db = library(false);
    let mut indexer = Indexer::new();
    indexer
        .register_index(
            &db,
            FieldIndex::new(BOOK, "published")
                .lookup("year")
                .lookup("month")
                .lookup("day")
                .lookup("week_day"),
        )
        .expect("register date parts");
    let session = Session::new(&indexer, &db);

    let now = Utc::now();
    session
        .insert(
            BOOK,
            vec![
                WriteRow::new().with("title", "Today").with("published", now),
                WriteRow::new().with("title", "Unpublished").with("published", Value::Null),
            ],
        )
        .expect("insert");

    let weekday = i64::from(now.weekday().number_from_monday());
    let cases = [
        ("published__year", i64::from(now.year())),
        ("published__month", i64::from(now.month())),
        ("published__day", i64::from(now.day())),
        ("published__week_day", weekday),
    ];

    for (lookup, value) in cases {
        let found = session.filter(BOOK, &FilterSpec::lookup(lookup, value)).expect("filter");
        assert_eq!(found, keys(&[1]), "{lookup}");
    }

    let other_month = i64::from(now.month() % 12 + 1);
    let found = session
        .filter(BOOK, &FilterSpec::lookup("published__month", other_month))
        .expect("filter");
    assert!(found.is_empty());
}

#[test]
fn date_parts_refuse_auto_populated_fields() {
    let db = library(false);
    let mut indexer = Indexer::new();

    let err = indexer
        .register_index(&db, FieldIndex::new(BOOK, "added").lookup("month"))
        .expect_err("auto_now field");

    assert!(err.is_configuration());
}

#[test]
fn regex_lookups_answer_registered_patterns() {
    let db = library(false);
    let mut indexer = Indexer::new();
    indexer
        .register_index(
            &db,
            FieldIndex::new(AUTHOR, "name")
                .lookup("regex:^[A-Z][a-z]+[A-Z]")
                .lookup("iregex:ya$")
                .lookup("iregex:^zzz$"),
        )
        .expect("register patterns");
    let session = Session::new(&indexer, &db);
    seed(&session);

    let camel = session
        .filter(AUTHOR, &FilterSpec::lookup("name__regex", "^[A-Z][a-z]+[A-Z]"))
        .expect("regex");
    assert_eq!(camel, keys(&[1, 2]));

    let suffix = session
        .filter(AUTHOR, &FilterSpec::lookup("name__iregex", "ya$"))
        .expect("iregex");
    assert_eq!(suffix, keys(&[3]));

    let nothing = session
        .filter(AUTHOR, &FilterSpec::lookup("name__iregex", "^zzz$"))
        .expect("iregex");
    assert!(nothing.is_empty());

    let err = session
        .filter(AUTHOR, &FilterSpec::lookup("name__regex", "^J"))
        .expect_err("unregistered pattern");
    assert!(err.is_unsupported());
}

#[test]
fn precompiled_patterns_register_like_strings() {
    let db = library(false);
    let mut indexer = Indexer::new();
    let pattern = shadowdb::__reexports::regex::Regex::new("i$").expect("compile");
    indexer
        .register_index(&db, FieldIndex::new(AUTHOR, "name").lookup(pattern))
        .expect("register");
    let session = Session::new(&indexer, &db);
    seed(&session);

    let found = session
        .filter(AUTHOR, &FilterSpec::lookup("name__regex", "i$"))
        .expect("filter");
    assert_eq!(found, keys(&[1]));
}

#[test]
fn repeated_registration_adds_nothing() {
    let db = library(false);
    let mut indexer = indexed_names(&db);
    let before = db.entity(AUTHOR).expect("author").fields.len();
    let rules = indexer.registry().len();

    indexer
        .register_index(&db, FieldIndex::new(AUTHOR, "name").lookup("iexact").lookup("contains"))
        .expect("re-register");

    assert_eq!(db.entity(AUTHOR).expect("author").fields.len(), before);
    assert_eq!(indexer.registry().len(), rules);
}

#[test]
fn updates_refresh_shadows() {
    let db = library(false);
    let indexer = indexed_names(&db);
    let session = Session::new(&indexer, &db);
    seed(&session);

    session
        .update(AUTHOR, vec![WriteRow::keyed(3).with("name", "Naruto")])
        .expect("update");

    let spec = FilterSpec::lookup("name__iexact", "naruto");
    assert_eq!(session.filter(AUTHOR, &spec).expect("filter"), keys(&[3]));
    let spec = FilterSpec::lookup("name__icontains", "raiya");
    assert!(session.filter(AUTHOR, &spec).expect("filter").is_empty());
}

#[test]
fn inserts_without_indexed_values_are_rejected() {
    let db = library(false);
    let indexer = indexed_names(&db);
    let session = Session::new(&indexer, &db);

    let err = session
        .insert(AUTHOR, vec![WriteRow::new().with("publisher", Value::Null)])
        .expect_err("no name");
    let public: shadowdb::Error = err.into();

    assert_eq!(public.kind, shadowdb::error::ErrorKind::MissingValue);
    assert_eq!(db.len(AUTHOR).expect("len"), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn contains_agrees_with_substring_search(
        names in prop::collection::vec("[a-cA-C]{1,6}", 1..6),
        needle in "[a-cA-C]{0,3}",
    ) {
        let db = library(false);
        let indexer = indexed_names(&db);
        let session = Session::new(&indexer, &db);

        let rows = names.iter().map(|name| WriteRow::new().with("name", name.as_str())).collect();
        let inserted = session.insert(AUTHOR, rows).expect("insert");

        let expected: Vec<Value> = names
            .iter()
            .zip(&inserted)
            .filter(|(name, _)| name.contains(needle.as_str()))
            .map(|(_, key)| key.clone())
            .collect();
        let found = session
            .filter(AUTHOR, &FilterSpec::lookup("name__contains", needle.as_str()))
            .expect("filter");

        prop_assert_eq!(found, expected);
    }
}
