//! Runtime schema model.
//!
//! Record types and field descriptors as the host declares them. The engine
//! reads these to validate registrations and synthesizes new field models
//! for shadow attributes; it never removes anything.
pub mod entity;
pub mod field;
