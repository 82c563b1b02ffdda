#![allow(dead_code)]

use shadowdb::prelude::*;

pub const PUBLISHER: &str = "library::Publisher";
pub const AUTHOR: &str = "library::Author";
pub const BOOK: &str = "library::Book";

/// Publisher ← Author ← Book.
pub fn library(joins: bool) -> MemoryDb {
    let db = if joins {
        MemoryDb::with_joins()
    } else {
        MemoryDb::new()
    };

    db.define(EntityModel::new(PUBLISHER).field(FieldModel::text("name", 64)))
        .expect("define publisher");
    db.define(
        EntityModel::new(AUTHOR)
            .field(FieldModel::text("name", 64))
            .field(FieldModel::relation("publisher", PUBLISHER).nullable()),
    )
    .expect("define author");
    db.define(
        EntityModel::new(BOOK)
            .field(FieldModel::text("title", 128))
            .field(FieldModel::relation("author", AUTHOR).nullable())
            .field(FieldModel::new("published", FieldKind::Timestamp).nullable())
            .field(FieldModel::new("added", FieldKind::Timestamp).auto_now()),
    )
    .expect("define book");

    db
}

/// Two publishers, three authors (one unpublished), five books (one anonymous).
pub fn seed(session: &Session<'_, MemoryDb>) {
    session
        .insert(
            PUBLISHER,
            vec![
                WriteRow::new().with("name", "Konoha Press"),
                WriteRow::new().with("name", "Sand Books"),
            ],
        )
        .expect("publishers");
    session
        .insert(
            AUTHOR,
            vec![
                WriteRow::new()
                    .with("name", "ItAchi")
                    .with("publisher", RecordRef::new(PUBLISHER, 1)),
                WriteRow::new()
                    .with("name", "YondAimE")
                    .with("publisher", RecordRef::new(PUBLISHER, 2)),
                WriteRow::new().with("name", "Jiraiya"),
            ],
        )
        .expect("authors");
    session
        .insert(
            BOOK,
            vec![
                WriteRow::new()
                    .with("title", "Tsukuyomi")
                    .with("author", RecordRef::new(AUTHOR, 1)),
                WriteRow::new()
                    .with("title", "Hiraishin")
                    .with("author", RecordRef::new(AUTHOR, 2)),
                WriteRow::new()
                    .with("title", "Icha Icha")
                    .with("author", RecordRef::new(AUTHOR, 3)),
                WriteRow::new()
                    .with("title", "Amaterasu")
                    .with("author", RecordRef::new(AUTHOR, 1)),
                WriteRow::new().with("title", "Anonymous").with("author", Value::Null),
            ],
        )
        .expect("books");
}

pub fn keys(values: &[i64]) -> Vec<Value> {
    values.iter().copied().map(Value::Int).collect()
}
