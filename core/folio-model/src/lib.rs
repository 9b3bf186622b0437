//! Content schema for Folio.
//!
//! Defines the contract between the content store, the persistence layer and
//! anything that renders content:
//! - [`DeclaredField`] / [`FieldShape`]: which fields must be objects and which
//!   must be sequences, checked after every mutation and on import, and restored
//!   on every read
//! - [`default_document`]: the bundled starting content

mod defaults;
mod schema;

pub use defaults::default_document;
pub use schema::{
    check_touched, json_type_name, sequence_fields, validate_document, DeclaredField,
    FieldShape, PathStep, ShapeViolation, DECLARED_FIELDS,
};

/// Schema version written into persisted records and export files.
pub const SCHEMA_VERSION: &str = "1.0.0";
