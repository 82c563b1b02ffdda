mod fixtures;

use fixtures::{AUTHOR, BOOK, PUBLISHER, keys, library, seed};
use shadowdb::prelude::*;

fn register_paths(db: &MemoryDb, strategy: JoinStrategy) -> Indexer {
    let mut indexer = Indexer::new();
    indexer
        .register_index(
            db,
            FieldIndex::new(BOOK, "author__name")
                .lookup("iexact")
                .lookup("icontains")
                .strategy(strategy),
        )
        .expect("register author name");
    indexer
        .register_index(
            db,
            FieldIndex::new(BOOK, "author__publisher__name")
                .lookup("iexact")
                .lookup("istartswith")
                .strategy(strategy),
        )
        .expect("register publisher name");

    indexer
}

fn scenarios() -> Vec<(FilterSpec, Vec<Value>)> {
    vec![
        (FilterSpec::lookup("author__name__iexact", "ITACHI"), keys(&[1, 4])),
        (FilterSpec::lookup("author__name__icontains", "AIM"), keys(&[2])),
        (FilterSpec::lookup("author__publisher__name__iexact", "sand books"), keys(&[2])),
        (FilterSpec::lookup("author__publisher__name__istartswith", "KONOHA"), keys(&[1, 4])),
        (
            FilterSpec::lookup("author__publisher__name__istartswith", "k")
                & FilterSpec::lookup("title__startswith", "Ama"),
            keys(&[4]),
        ),
        (
            FilterSpec::lookup("author__name__icontains", "i")
                & FilterSpec::lookup("author__publisher__name__iexact", "konoha press"),
            keys(&[1, 4]),
        ),
        (FilterSpec::lookup("author__name__iexact", "nobody"), keys(&[])),
    ]
}

fn assert_scenarios(strategy: JoinStrategy, joins: bool) {
    let db = library(joins);
    let indexer = register_paths(&db, strategy);
    let session = Session::new(&indexer, &db);
    seed(&session);

    for (spec, expected) in scenarios() {
        let found = session.filter(BOOK, &spec).expect("filter");
        assert_eq!(found, expected, "{strategy}: {spec:?}");
    }
}

#[test]
fn denormalized_paths_answer_join_lookups() {
    assert_scenarios(JoinStrategy::Denormalize, false);
}

#[test]
fn in_memory_joins_answer_join_lookups() {
    assert_scenarios(JoinStrategy::InMemory, false);
}

#[test]
fn constant_field_joins_answer_join_lookups() {
    assert_scenarios(JoinStrategy::ConstantField, true);
}

#[test]
fn denormalized_queries_need_no_joins() {
    let db = library(false);
    let indexer = register_paths(&db, JoinStrategy::Denormalize);
    let session = Session::new(&indexer, &db);

    let query = session
        .query(BOOK, &FilterSpec::lookup("author__publisher__name__iexact", "x"))
        .expect("query");

    assert!(query.joins.is_empty());
}

#[test]
fn target_side_shadows_serve_direct_queries() {
    let db = library(false);
    let indexer = register_paths(&db, JoinStrategy::InMemory);
    let session = Session::new(&indexer, &db);
    seed(&session);

    let authors = session
        .filter(AUTHOR, &FilterSpec::lookup("name__icontains", "IRA"))
        .expect("authors");
    assert_eq!(authors, keys(&[3]));

    let publishers = session
        .filter(PUBLISHER, &FilterSpec::lookup("name__istartswith", "sand"))
        .expect("publishers");
    assert_eq!(publishers, keys(&[2]));
}

#[test]
fn in_memory_joins_reject_disjunctions() {
    let db = library(false);
    let indexer = register_paths(&db, JoinStrategy::InMemory);
    let session = Session::new(&indexer, &db);

    let spec =
        FilterSpec::lookup("author__name__iexact", "itachi") | FilterSpec::lookup("title", "x");
    let err = session.filter(BOOK, &spec).expect_err("disjunction");

    assert!(err.is_unsupported());
}

#[test]
fn joins_without_an_index_need_a_join_capable_store() {
    let db = library(false);
    let indexer = Indexer::new();
    let session = Session::new(&indexer, &db);
    seed(&session);

    let err = session
        .filter(BOOK, &FilterSpec::lookup("author__name", "ItAchi"))
        .expect_err("store has no joins");
    assert!(err.is_unsupported());

    let db = library(true);
    let session = Session::new(&indexer, &db);
    seed(&session);

    let found = session
        .filter(BOOK, &FilterSpec::lookup("author__name", "ItAchi"))
        .expect("joined");
    assert_eq!(found, keys(&[1, 4]));
}

#[test]
fn fk_isnull_needs_no_join() {
    let db = library(false);
    let indexer = Indexer::new();
    let session = Session::new(&indexer, &db);
    seed(&session);

    let orphans = session
        .filter(BOOK, &FilterSpec::lookup("author__isnull", true))
        .expect("isnull");
    assert_eq!(orphans, keys(&[5]));

    let attributed = session
        .filter(BOOK, &FilterSpec::lookup("author__isnull", false))
        .expect("not null");
    assert_eq!(attributed, keys(&[1, 2, 3, 4]));
}

#[test]
fn raw_key_writes_resolve_denormalized_paths() {
    let db = library(false);
    let indexer = register_paths(&db, JoinStrategy::Denormalize);
    let session = Session::new(&indexer, &db);
    seed(&session);

    session
        .insert(BOOK, vec![WriteRow::new().with("title", "Rasengan").with("author_id", 2)])
        .expect("insert by raw key");

    let found = session
        .filter(BOOK, &FilterSpec::lookup("author__publisher__name__iexact", "SAND BOOKS"))
        .expect("filter");
    assert_eq!(found, keys(&[2, 6]));
}

#[test]
fn declared_indexes_load_from_toml() {
    let config = IndexerConfig::from_toml_str(
        r#"
        backends = ["shadow_index", "fk_null_fix", "in_memory_join"]

        [[index]]
        entity = "library::Book"
        field = "author__name"
        lookups = ["iexact"]
        strategy = "in_memory"
        "#,
    )
    .expect("parse");

    let db = library(false);
    let mut indexer = Indexer::from_config(&config).expect("indexer");
    indexer.register_declared(&db, &config).expect("register");
    let session = Session::new(&indexer, &db);
    seed(&session);

    let found = session
        .filter(BOOK, &FilterSpec::lookup("author__name__iexact", "jiraiya"))
        .expect("filter");
    assert_eq!(found, keys(&[3]));
}

#[test]
fn paths_reaching_the_same_publisher_agree() {
    use JoinStrategy::{ConstantField, Denormalize, InMemory};

    let pairs = [
        (Denormalize, Denormalize),
        (InMemory, InMemory),
        (ConstantField, ConstantField),
        (ConstantField, InMemory),
        (InMemory, Denormalize),
    ];

    for (book_strategy, author_strategy) in pairs {
        let joins = book_strategy == ConstantField || author_strategy == ConstantField;
        let db = library(joins);
        let mut indexer = Indexer::new();
        indexer
            .register_index(
                &db,
                FieldIndex::new(BOOK, "author__publisher__name")
                    .lookup("iexact")
                    .strategy(book_strategy),
            )
            .expect("register book path");
        indexer
            .register_index(
                &db,
                FieldIndex::new(AUTHOR, "publisher__name")
                    .lookup("iexact")
                    .strategy(author_strategy),
            )
            .expect("register author path");
        let session = Session::new(&indexer, &db);
        seed(&session);

        for publisher in ["KONOHA PRESS", "sand books", "nobody"] {
            let label = format!("{book_strategy}/{author_strategy}: {publisher}");
            let books = session
                .filter(BOOK, &FilterSpec::lookup("author__publisher__name__iexact", publisher))
                .expect(&label);
            let authors = session
                .filter(AUTHOR, &FilterSpec::lookup("publisher__name__iexact", publisher))
                .expect(&label);

            let mut reached: Vec<Value> = books
                .iter()
                .map(|key| {
                    db.load_field(BOOK, key, "author")
                        .expect("load author")
                        .expect("book exists")
                })
                .collect();
            reached.sort();
            reached.dedup();

            assert_eq!(reached, authors, "{label}");
        }
    }
}
