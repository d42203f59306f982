//! Stored collection schemas and their compilation
//!
//! Every tenant database carries a `schemas` collection with one record per
//! collection: a JSON field map and a JSON index list. The compiler turns the
//! field map into a `DescriptorMap` used to validate documents, and pushes the
//! index list down to storage once per connection.

pub mod compiler;
pub mod index;
pub mod store;
pub mod types;

use thiserror::Error;

use crate::database::driver::DriverError;

pub use compiler::{apply_index, compile, compile_str};
pub use index::{parse_indices, IndexDefinition};
pub use store::{get_definition, set_definition, SchemaRecord, SCHEMAS_COLLECTION};
pub use types::{DescriptorMap, FieldDescriptor, TypeDescriptor};

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Unsupported schema type: {0}")]
    UnsupportedType(String),

    #[error("Unsupported array item type: {0}")]
    UnsupportedArrayItem(String),

    #[error(transparent)]
    Database(#[from] DriverError),
}
