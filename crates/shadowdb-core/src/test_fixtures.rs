use crate::{
    db::memory::MemoryDb,
    model::{
        entity::EntityModel,
        field::{FieldKind, FieldModel},
    },
    value::{Value, lower},
};

pub(crate) const PUBLISHER: &str = "blog::Publisher";
pub(crate) const AUTHOR: &str = "blog::Author";
pub(crate) const POST: &str = "blog::Post";

/// Publisher ← Author ← Post, with text, date, and auto-populated fields.
pub(crate) fn blog_db(joins: bool) -> MemoryDb {
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
            .field(FieldModel::new("born", FieldKind::Date).nullable())
            .field(FieldModel::relation("publisher", PUBLISHER).nullable()),
    )
    .expect("define author");
    db.define(
        EntityModel::new(POST)
            .field(FieldModel::text("title", 128))
            .field(FieldModel::relation("author", AUTHOR).nullable())
            .field(FieldModel::new("created", FieldKind::Timestamp).auto_now())
            .field(FieldModel::new("tags", FieldKind::List(Box::new(FieldKind::Text))).nullable()),
    )
    .expect("define post");

    db
}

///
/// TextOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum TextOp {
    Eq,
    StartsWith,
    EndsWith,
    Contains,
}

///
/// TextMode
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum TextMode {
    Cs, // case-sensitive
    Ci, // case-insensitive
}

/// Relational text operator evaluated directly; `None` unless both sides
/// are text.
pub(crate) fn compare_text(
    actual: &Value,
    needle: &Value,
    op: TextOp,
    mode: TextMode,
) -> Option<bool> {
    let (Value::Text(actual), Value::Text(needle)) = (actual, needle) else {
        return None;
    };

    let (actual, needle) = match mode {
        TextMode::Cs => (actual.clone(), needle.clone()),
        TextMode::Ci => (lower(actual), lower(needle)),
    };

    let matched = match op {
        TextOp::Eq => actual == needle,
        TextOp::StartsWith => actual.starts_with(&needle),
        TextOp::EndsWith => actual.ends_with(&needle),
        TextOp::Contains => actual.contains(&needle),
    };

    Some(matched)
}
