//! ## Crate layout
//! - `core`: lookup rules, shadow index registry, resolver chain, host traits,
//!   and the in-memory reference host.
//! - `error`: public error type with a stable kind + origin taxonomy.
//!
//! The `prelude` module carries the vocabulary needed to declare indexes,
//! write records, and filter them through a [`Session`](core::db::session::Session).

pub use shadowdb_core as core;

pub mod error;

pub use error::Error;

/// re-exports
///
/// callers building values and regex lookups need the same versions the
/// engine was compiled against
pub mod __reexports {
    pub use chrono;
    pub use regex;
}

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result alias over the public [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::{
        config::IndexerConfig,
        db::{
            Host, QueryExecutor as _, RecordStore as _, SchemaCatalog as _,
            memory::MemoryDb,
            session::Session,
        },
        lookup::{LookupKind, RegexLookup, StandardLookup},
        prelude::*,
        resolver::BackendKind,
    };
    pub use crate::Error;
}
