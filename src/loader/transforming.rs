//! The selective transforming loader.

use super::classpath::{read_fully, resource_name, ClassPath, Provenance};
use super::defined::{package_name, DefinedType, PackageInfo};
use super::errors::{DefineError, LoadError};
use super::predicate::{PatternSet, TransformPredicate};
use super::registry::TransformerRegistry;
use super::state::{LoadState, SlotTable};
use crate::classfile::ClassFile;
use crate::rewrite::BRIDGE_REWRITER_ID;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Resolves type names from a class path, passing the bytes of names the
/// predicate selects through a registered transformer before defining them.
///
/// Each name is loaded at most once per loader: concurrent `resolve` calls
/// for the same name collapse into a single read, transform and define, and
/// all of them receive the same [`DefinedType`].
pub struct TransformingLoader {
    name: String,
    class_path: ClassPath,
    registry: Arc<TransformerRegistry>,
    transformer_id: String,
    predicate: Box<dyn TransformPredicate>,
    types: SlotTable<DefinedType>,
    packages: Mutex<HashMap<String, Arc<PackageInfo>>>,
}

impl TransformingLoader {
    /// A loader using the default pattern set and the bridge rewriter.
    pub fn new(
        name: impl Into<String>,
        class_path: ClassPath,
        registry: Arc<TransformerRegistry>,
    ) -> Self {
        Self {
            name: name.into(),
            class_path,
            registry,
            transformer_id: BRIDGE_REWRITER_ID.to_string(),
            predicate: Box::new(PatternSet::default()),
            types: SlotTable::default(),
            packages: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_predicate(mut self, predicate: impl TransformPredicate + 'static) -> Self {
        self.predicate = Box::new(predicate);
        self
    }

    pub fn with_transformer_id(mut self, id: impl Into<String>) -> Self {
        self.transformer_id = id.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transformer_id(&self) -> &str {
        &self.transformer_id
    }

    pub fn class_path(&self) -> &ClassPath {
        &self.class_path
    }

    pub fn should_transform(&self, type_name: &str) -> bool {
        self.predicate.should_transform(type_name)
    }

    /// Resolve a dotted type name, loading it on first request.
    pub fn resolve(&self, type_name: &str) -> Result<Arc<DefinedType>, LoadError> {
        self.types.load_once(type_name, || self.load(type_name))
    }

    pub fn state(&self, type_name: &str) -> LoadState {
        self.types.state(type_name)
    }

    /// The type if it has already been loaded.
    pub fn defined(&self, type_name: &str) -> Option<Arc<DefinedType>> {
        self.types.get(type_name)
    }

    /// Package record for a dotted package name.
    pub fn package(&self, package: &str) -> Option<Arc<PackageInfo>> {
        self.packages.lock().get(package).cloned()
    }

    fn load(&self, type_name: &str) -> Result<DefinedType, LoadError> {
        let transform = self.should_transform(type_name);
        if transform {
            tracing::debug!(loader = %self.name, type_name, "intercepting");
        } else {
            tracing::trace!(loader = %self.name, type_name, "default resolution");
        }

        let resource = resource_name(type_name);
        let not_found = || LoadError::TypeNotFound {
            type_name: type_name.to_string(),
            loader: self.to_string(),
        };
        let source = self.class_path.locate(&resource).ok_or_else(not_found)?;
        let bytes = read_fully(source.as_ref(), &resource)
            .map_err(|source| LoadError::Read {
                type_name: type_name.to_string(),
                resource: resource.clone(),
                source,
            })?
            .ok_or_else(not_found)?;
        let provenance = Provenance {
            code_base: source.code_base(),
        };

        let bytes = if transform {
            self.registry
                .transform(&self.transformer_id, type_name, &bytes)
                .map_err(|source| LoadError::LoadTransform {
                    type_name: type_name.to_string(),
                    resource: resource.clone(),
                    source,
                })?
        } else {
            bytes
        };

        self.define(type_name, bytes, provenance, transform)
            .map_err(|source| LoadError::Define {
                type_name: type_name.to_string(),
                resource,
                source,
            })
    }

    fn define(
        &self,
        type_name: &str,
        bytes: Vec<u8>,
        provenance: Provenance,
        transformed: bool,
    ) -> Result<DefinedType, DefineError> {
        let declared = ClassFile::parse(&bytes)?.binary_name()?;
        if declared != type_name {
            return Err(DefineError::WrongName { found: declared });
        }

        let package = self.define_package(package_name(type_name), &provenance);
        tracing::debug!(
            loader = %self.name,
            type_name,
            provenance = %provenance,
            transformed,
            "defined type"
        );
        Ok(DefinedType::new(
            type_name.to_string(),
            bytes,
            provenance,
            package,
            transformed,
        ))
    }

    fn define_package(&self, package: &str, provenance: &Provenance) -> Option<Arc<PackageInfo>> {
        if package.is_empty() {
            return None;
        }
        let mut packages = self.packages.lock();
        let info = packages.entry(package.to_string()).or_insert_with(|| {
            tracing::debug!(loader = %self.name, package, "defined package");
            Arc::new(PackageInfo {
                name: package.to_string(),
                provenance: provenance.clone(),
            })
        });
        Some(Arc::clone(info))
    }
}

impl fmt::Display for TransformingLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransformingLoader({})", self.name)
    }
}

impl fmt::Debug for TransformingLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformingLoader")
            .field("name", &self.name)
            .field("class_path", &self.class_path)
            .field("transformer_id", &self.transformer_id)
            .finish_non_exhaustive()
    }
}
