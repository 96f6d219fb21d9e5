//! Indirection between loaders and the byte transformers they invoke.
//!
//! A loader holds only an identifier; the transformer behind it is looked up
//! at resolution time. A missing identifier or a failing transformer both
//! surface as [`TransformError`].

use super::errors::{BoxError, TransformError};
use crate::rewrite::{BridgeRewriter, BRIDGE_REWRITER_ID};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Rewrites the bytes of one named type.
pub trait ClassTransformer: Send + Sync {
    fn transform(&self, type_name: &str, bytes: &[u8]) -> Result<Vec<u8>, BoxError>;
}

impl ClassTransformer for BridgeRewriter {
    fn transform(&self, type_name: &str, bytes: &[u8]) -> Result<Vec<u8>, BoxError> {
        BridgeRewriter::transform(self, type_name, bytes).map_err(Into::into)
    }
}

/// Thread-safe map from identifier to transformer.
#[derive(Default)]
pub struct TransformerRegistry {
    transformers: RwLock<BTreeMap<String, Arc<dyn ClassTransformer>>>,
}

impl TransformerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the bridge rewriter under [`BRIDGE_REWRITER_ID`].
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register(BRIDGE_REWRITER_ID, Arc::new(BridgeRewriter));
        registry
    }

    /// Register `transformer`, returning any it replaced.
    pub fn register(
        &self,
        id: impl Into<String>,
        transformer: Arc<dyn ClassTransformer>,
    ) -> Option<Arc<dyn ClassTransformer>> {
        self.transformers.write().insert(id.into(), transformer)
    }

    pub fn lookup(&self, id: &str) -> Result<Arc<dyn ClassTransformer>, TransformError> {
        let transformers = self.transformers.read();
        transformers
            .get(id)
            .cloned()
            .ok_or_else(|| TransformError::Unavailable {
                id: id.to_string(),
                registry: transformers.keys().cloned().collect(),
            })
    }

    /// Look up `id` and run it, folding both failure kinds into one error.
    pub fn transform(
        &self,
        id: &str,
        type_name: &str,
        bytes: &[u8],
    ) -> Result<Vec<u8>, TransformError> {
        let transformer = self.lookup(id)?;
        transformer
            .transform(type_name, bytes)
            .map_err(|source| TransformError::Failed {
                id: id.to_string(),
                source,
            })
    }

    pub fn ids(&self) -> Vec<String> {
        self.transformers.read().keys().cloned().collect()
    }
}

impl std::fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}
