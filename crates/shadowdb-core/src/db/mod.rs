//! Host-facing surfaces: the collaborator traits the engine consumes, the
//! filter-tree and write-set representations it rewrites, and an in-memory
//! reference host.

pub mod memory;
pub mod query;
pub mod session;
pub mod write;

mod host;

pub use host::{Host, QueryExecutor, RecordStore, SchemaCatalog, SchemaError};
