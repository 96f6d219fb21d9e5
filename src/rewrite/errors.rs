use crate::classfile::ClassFileError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RewriteError {
    /// The input bytes are not a well-formed class file.
    #[error("malformed class file for '{type_name}'")]
    StructuralParse {
        type_name: String,
        #[source]
        source: ClassFileError,
    },

    /// Bridge synthesis produced output that contradicts its own inputs.
    #[error("inconsistent bridge output for '{type_name}'")]
    OutputConsistency {
        type_name: String,
        #[source]
        violation: ConsistencyViolation,
    },
}

impl RewriteError {
    pub(crate) fn parse(type_name: &str, source: ClassFileError) -> Self {
        RewriteError::StructuralParse {
            type_name: type_name.to_string(),
            source,
        }
    }

    pub(crate) fn consistency(type_name: &str, violation: ConsistencyViolation) -> Self {
        RewriteError::OutputConsistency {
            type_name: type_name.to_string(),
            violation,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyViolation {
    #[error("bridge '{bridge}' invokes '{found}' but the class is '{expected}'")]
    OwnerMismatch {
        bridge: String,
        expected: String,
        found: String,
    },

    #[error("bridge '{name}{descriptor}' collides with a declared method")]
    DuplicateMethod { name: String, descriptor: String },

    #[error("recorded {recorded} markers but emitted {emitted} bridges")]
    BridgeCountMismatch { recorded: usize, emitted: usize },

    #[error("'{name}' could not be encoded: {source}")]
    Encoding {
        name: String,
        #[source]
        source: ClassFileError,
    },
}
