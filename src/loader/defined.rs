use super::classpath::Provenance;
use std::fmt;
use std::sync::Arc;
use xxhash_rust::xxh3::xxh3_64;

/// Package record established when the first type of a package is defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    /// Dotted package name, e.g. `org.gradle.api.tasks.bundling`.
    pub name: String,
    /// Provenance of the type that established the package.
    pub provenance: Provenance,
}

/// A type installed in a loader.
///
/// Handed out as `Arc<DefinedType>`; every resolution of the same name on
/// the same loader returns the same allocation.
#[derive(Debug)]
pub struct DefinedType {
    name: String,
    bytes: Vec<u8>,
    digest: u64,
    provenance: Provenance,
    package: Option<Arc<PackageInfo>>,
    transformed: bool,
}

impl DefinedType {
    pub(crate) fn new(
        name: String,
        bytes: Vec<u8>,
        provenance: Provenance,
        package: Option<Arc<PackageInfo>>,
        transformed: bool,
    ) -> Self {
        let digest = xxh3_64(&bytes);
        Self {
            name,
            bytes,
            digest,
            provenance,
            package,
            transformed,
        }
    }

    /// Dotted binary name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class file bytes as defined (post-transform if transformed).
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// xxh3 hash of [`Self::bytes`].
    pub fn digest(&self) -> u64 {
        self.digest
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// `None` for types in the default package.
    pub fn package(&self) -> Option<&Arc<PackageInfo>> {
        self.package.as_ref()
    }

    pub fn is_transformed(&self) -> bool {
        self.transformed
    }
}

impl fmt::Display for DefinedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.provenance)
    }
}

/// Package segment of a dotted type name; empty for the default package.
pub fn package_name(type_name: &str) -> &str {
    type_name.rfind('.').map_or("", |i| &type_name[..i])
}
