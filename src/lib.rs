//! Compat Bridge: keep removed JVM API methods callable.
//!
//! When a public method is removed from an API, its implementation can be
//! kept under a new name and tagged with `@Removed(original = "...")`. This
//! crate rewrites compiled class files so each tagged method regains a public
//! bridge under its original name, and provides a loader that applies the
//! rewrite lazily to selected types.
//!
//! # Architecture
//!
//! - [`classfile`]: lossless class file codec. Parse, edit, re-encode.
//! - [`rewrite`]: marker scanning and bridge synthesis over a [`ClassFile`].
//! - [`loader`]: [`TransformingLoader`], which resolves names from a class
//!   path and sends predicate-selected types through a registered
//!   transformer exactly once per name.
//! - [`config`]: TOML loader configuration.
//! - [`emit`]: atomic, idempotent class file writes.
//!
//! # Example
//!
//! ```no_run
//! use compat_bridge::loader::{ClassPath, TransformerRegistry, TransformingLoader};
//! use std::sync::Arc;
//!
//! let loader = TransformingLoader::new(
//!     "build",
//!     ClassPath::new().with_directory("build/classes/java/main"),
//!     Arc::new(TransformerRegistry::with_builtins()),
//! );
//!
//! match loader.resolve("org.gradle.api.tasks.bundling.Tar") {
//!     Ok(ty) => println!("{} transformed={}", ty, ty.is_transformed()),
//!     Err(e) => eprintln!("resolve failed: {}", e),
//! }
//! ```

pub mod classfile;
pub mod config;
pub mod emit;
pub mod loader;
pub mod rewrite;

pub use classfile::{ClassFile, ClassFileError};
pub use emit::{ClassWrite, EmitError, EmitResult};
pub use loader::{
    ClassTransformer, DefinedType, LoadError, LoadState, TransformError, TransformerRegistry,
    TransformingLoader,
};
pub use rewrite::{transform, BridgeRewriter, RewriteError};
