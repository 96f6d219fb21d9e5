//! Bridge rewriter: keeps removed public methods callable at runtime.
//!
//! A method that was dropped from the public API is renamed and tagged with
//! the removal marker, whose `original` element names the public method it
//! replaced. [`transform`] finds those markers and appends, for each one, a
//! public bridge under the original name that forwards non-virtually to the
//! renamed implementation on the same class.
//!
//! # Guarantees
//!
//! - Declared methods are copied unchanged (bytes, flags, order)
//! - Bridges are appended after all declared methods, in marker order
//! - A class without markers serializes back to its input bytes
//! - No state is shared between calls
//!
//! # Example
//!
//! ```no_run
//! use compat_bridge::rewrite::transform;
//!
//! let original = std::fs::read("build/classes/com/example/Util.class").unwrap();
//! let rewritten = transform("com.example.Util", &original).unwrap();
//! ```

pub mod bridge;
pub mod errors;
pub mod marker;

pub use bridge::{synthesize, BridgeMethodSpec, SynthesizedBridge};
pub use errors::{ConsistencyViolation, RewriteError};
pub use marker::{scan_markers, RemovedMarker, ORIGINAL_ELEMENT, REMOVED_MARKER_DESCRIPTOR};

use crate::classfile::ClassFile;

/// Identifier under which the bridge rewriter is registered for loaders.
pub const BRIDGE_REWRITER_ID: &str = "compat.bridge-rewriter";

/// Output of a rewrite: the new bytes and the bridges that were added.
#[derive(Debug, Clone)]
pub struct Rewritten {
    pub bytes: Vec<u8>,
    pub bridges: Vec<BridgeMethodSpec>,
}

/// Markers declared by the class in `bytes`, without rewriting it.
pub fn markers(type_name: &str, bytes: &[u8]) -> Result<Vec<RemovedMarker>, RewriteError> {
    let class = ClassFile::parse(bytes).map_err(|e| RewriteError::parse(type_name, e))?;
    scan_markers(&class).map_err(|e| RewriteError::parse(type_name, e))
}

/// Rewrite `bytes`, returning only the new class file bytes.
pub fn transform(type_name: &str, bytes: &[u8]) -> Result<Vec<u8>, RewriteError> {
    rewrite(type_name, bytes).map(|rewritten| rewritten.bytes)
}

/// Rewrite `bytes` and report the synthesized bridges.
///
/// `type_name` is used for diagnostics only; bridges always target the
/// class named by the class file itself.
pub fn rewrite(type_name: &str, bytes: &[u8]) -> Result<Rewritten, RewriteError> {
    let parse_error = |source| RewriteError::parse(type_name, source);

    let mut class = ClassFile::parse(bytes).map_err(parse_error)?;
    let owner = class.name().map_err(parse_error)?.into_owned();

    let markers = scan_markers(&class).map_err(parse_error)?;
    let specs = markers
        .iter()
        .map(BridgeMethodSpec::from_marker)
        .collect::<Result<Vec<_>, _>>()
        .map_err(parse_error)?;

    let declared = class.methods.len();
    for spec in &specs {
        if class.find_method(&spec.name, &spec.descriptor_text).is_some() {
            return Err(RewriteError::consistency(
                type_name,
                ConsistencyViolation::DuplicateMethod {
                    name: spec.name.clone(),
                    descriptor: spec.descriptor_text.clone(),
                },
            ));
        }

        let bridge = synthesize(&mut class, spec).map_err(|source| {
            RewriteError::consistency(
                type_name,
                ConsistencyViolation::Encoding {
                    name: spec.name.clone(),
                    source,
                },
            )
        })?;

        let invoked_owner = class
            .constant_pool
            .member_ref(bridge.method_ref)
            .map(|(invoked_owner, _, _)| invoked_owner.into_owned())
            .map_err(parse_error)?;
        if invoked_owner != owner {
            return Err(RewriteError::consistency(
                type_name,
                ConsistencyViolation::OwnerMismatch {
                    bridge: spec.name.clone(),
                    expected: owner,
                    found: invoked_owner,
                },
            ));
        }

        tracing::debug!(
            type_name,
            bridge = %spec.name,
            target = %spec.target_name,
            descriptor = %spec.descriptor_text,
            "synthesized bridge method"
        );
        class.methods.push(bridge.method);
    }

    let emitted = class.methods.len() - declared;
    if emitted != specs.len() {
        return Err(RewriteError::consistency(
            type_name,
            ConsistencyViolation::BridgeCountMismatch {
                recorded: specs.len(),
                emitted,
            },
        ));
    }

    let bytes = class.to_bytes().map_err(|source| {
        RewriteError::consistency(
            type_name,
            ConsistencyViolation::Encoding {
                name: owner.clone(),
                source,
            },
        )
    })?;

    Ok(Rewritten {
        bytes,
        bridges: specs,
    })
}

/// The rewriter as a value, for registration behind a transformer seam.
#[derive(Debug, Clone, Copy, Default)]
pub struct BridgeRewriter;

impl BridgeRewriter {
    pub fn transform(&self, type_name: &str, bytes: &[u8]) -> Result<Vec<u8>, RewriteError> {
        transform(type_name, bytes)
    }
}
