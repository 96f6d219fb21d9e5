//! Selective transforming loader.
//!
//! Resolves dotted type names against a [`ClassPath`]. Names matched by the
//! loader's [`TransformPredicate`] are rewritten through a
//! [`ClassTransformer`] looked up in a [`TransformerRegistry`]; all others
//! are defined from their bytes unchanged.

pub mod classpath;
pub mod defined;
pub mod errors;
pub mod predicate;
pub mod registry;
pub mod state;
pub mod transforming;

pub use classpath::{
    resource_name, ClassPath, DirectorySource, MemorySource, Provenance, ResourceSource,
};
pub use defined::{package_name, DefinedType, PackageInfo};
pub use errors::{BoxError, DefineError, LoadError, TransformError};
pub use predicate::{PatternSet, TransformPredicate, DEFAULT_TRANSFORM_PATTERN};
pub use registry::{ClassTransformer, TransformerRegistry};
pub use state::LoadState;
pub use transforming::TransformingLoader;
