//! Where raw class bytes come from.
//!
//! A [`ClassPath`] is an ordered list of [`ResourceSource`]s searched first
//! to last. Each source has a code base, and a type defined from a source
//! records that code base as its [`Provenance`].

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Resource name of a dotted type name: `a.b.C` -> `a/b/C.class`.
pub fn resource_name(type_name: &str) -> String {
    format!("{}.class", type_name.replace('.', "/"))
}

/// Code base a type was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Provenance {
    pub code_base: String,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code_base)
    }
}

/// One class path entry.
pub trait ResourceSource: Send + Sync {
    /// Root identifying this entry, used as provenance.
    fn code_base(&self) -> String;

    fn contains(&self, resource: &str) -> bool;

    /// Open a stream over the resource, or `Ok(None)` if absent.
    fn open(&self, resource: &str) -> io::Result<Option<Box<dyn Read + Send + '_>>>;
}

/// A directory of `.class` files laid out by package.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, resource: &str) -> Option<PathBuf> {
        // Resource names are relative and never climb out of the root.
        if resource.starts_with('/') || resource.split('/').any(|seg| seg == "..") {
            return None;
        }
        Some(self.root.join(resource))
    }
}

impl ResourceSource for DirectorySource {
    fn code_base(&self) -> String {
        self.root.display().to_string()
    }

    fn contains(&self, resource: &str) -> bool {
        self.path_of(resource).is_some_and(|p| p.is_file())
    }

    fn open(&self, resource: &str) -> io::Result<Option<Box<dyn Read + Send + '_>>> {
        let Some(path) = self.path_of(resource) else {
            return Ok(None);
        };
        match File::open(path) {
            Ok(file) => Ok(Some(Box::new(file))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Resources held in memory under a label.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    label: String,
    resources: BTreeMap<String, Arc<[u8]>>,
}

impl MemorySource {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            resources: BTreeMap::new(),
        }
    }

    /// Add the bytes of a type under its dotted name.
    pub fn with_type(mut self, type_name: &str, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.insert(resource_name(type_name), bytes);
        self
    }

    pub fn insert(&mut self, resource: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.resources.insert(resource.into(), bytes.into());
    }
}

impl ResourceSource for MemorySource {
    fn code_base(&self) -> String {
        format!("memory:{}", self.label)
    }

    fn contains(&self, resource: &str) -> bool {
        self.resources.contains_key(resource)
    }

    fn open(&self, resource: &str) -> io::Result<Option<Box<dyn Read + Send + '_>>> {
        Ok(self
            .resources
            .get(resource)
            .map(|bytes| Box::new(io::Cursor::new(bytes.as_ref())) as Box<dyn Read + Send + '_>))
    }
}

/// Ordered search path of resource sources.
#[derive(Clone, Default)]
pub struct ClassPath {
    entries: Vec<Arc<dyn ResourceSource>>,
}

impl fmt::Debug for ClassPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.code_base()))
            .finish()
    }
}

impl ClassPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: impl ResourceSource + 'static) {
        self.entries.push(Arc::new(source));
    }

    pub fn with(mut self, source: impl ResourceSource + 'static) -> Self {
        self.push(source);
        self
    }

    pub fn with_directory(self, root: impl Into<PathBuf>) -> Self {
        self.with(DirectorySource::new(root))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry holding `resource`.
    pub fn locate(&self, resource: &str) -> Option<&Arc<dyn ResourceSource>> {
        self.entries.iter().find(|e| e.contains(resource))
    }
}

/// Drain a resource completely. The stream is dropped on every path out.
pub(crate) fn read_fully(
    source: &dyn ResourceSource,
    resource: &str,
) -> io::Result<Option<Vec<u8>>> {
    let Some(mut stream) = source.open(resource)? else {
        return Ok(None);
    };
    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes)?;
    Ok(Some(bytes))
}
