//! Compiled collection models
//!
//! A model is an interpreted validator table over one collection, rebuilt
//! from the stored schema every time it is requested.

pub mod handle;
pub mod record;
pub mod registry;

use thiserror::Error;

use crate::schema::SchemaError;

pub use handle::{ModelError, ModelHandle};
pub use record::RecordError;
pub use registry::{get_model, get_public_model, resolve_models, PROTECTED_COLLECTIONS};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Some models are missing: {}", .0.join(", "))]
    MissingModels(Vec<String>),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
