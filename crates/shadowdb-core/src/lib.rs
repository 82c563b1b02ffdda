//! Core engine for shadowdb: lookup rules, the shadow index registry, the
//! resolver chain that rewrites writes and filters, and the host traits it
//! runs against.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod index;
pub mod lookup;
pub mod model;
pub mod obs;
pub mod resolver;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, backends, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        db::{
            query::{FilterSpec, LookupOp},
            write::{WriteRow, WriteSet},
        },
        index::{FieldIndex, Indexer, JoinStrategy},
        model::{
            entity::EntityModel,
            field::{FieldKind, FieldModel},
        },
        value::{RecordRef, Value},
    };
}
