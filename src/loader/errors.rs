use crate::classfile::ClassFileError;
use std::io;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("type '{type_name}' not found by {loader}")]
    TypeNotFound { type_name: String, loader: String },

    #[error("failed to read '{resource}' for type '{type_name}'")]
    Read {
        type_name: String,
        resource: String,
        #[source]
        source: io::Error,
    },

    /// Failure at the transformer seam, wrapped with the type being loaded.
    #[error("failed to transform '{type_name}' (from '{resource}')")]
    LoadTransform {
        type_name: String,
        resource: String,
        #[source]
        source: TransformError,
    },

    #[error("failed to define '{type_name}' (from '{resource}')")]
    Define {
        type_name: String,
        resource: String,
        #[source]
        source: DefineError,
    },
}

impl LoadError {
    /// Name of the type whose resolution failed.
    pub fn type_name(&self) -> &str {
        match self {
            LoadError::TypeNotFound { type_name, .. }
            | LoadError::Read { type_name, .. }
            | LoadError::LoadTransform { type_name, .. }
            | LoadError::Define { type_name, .. } => type_name,
        }
    }
}

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("no transformer registered as '{id}' (known: {})", registry.join(", "))]
    Unavailable { id: String, registry: Vec<String> },

    #[error("transformer '{id}' failed")]
    Failed {
        id: String,
        #[source]
        source: BoxError,
    },
}

#[derive(Error, Debug)]
pub enum DefineError {
    #[error("invalid class file")]
    Format(#[from] ClassFileError),

    #[error("class file declares '{found}'")]
    WrongName { found: String },
}
