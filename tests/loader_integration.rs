//! Integration tests for the selective transforming loader.

mod common;

use common::{util_class, ClassBuilder, Marker, ACC_PUBLIC};
use compat_bridge::classfile::ClassFile;
use compat_bridge::loader::{
    BoxError, ClassPath, ClassTransformer, DefineError, LoadError, LoadState, MemorySource,
    ResourceSource, TransformError, TransformerRegistry, TransformingLoader,
};
use compat_bridge::rewrite::{BridgeRewriter, RewriteError, BRIDGE_REWRITER_ID};
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

const TAR: &str = "org.gradle.api.tasks.bundling.Tar";

fn tar_class() -> Vec<u8> {
    ClassBuilder::new("org/gradle/api/tasks/bundling/Tar")
        .method(ACC_PUBLIC, "<init>", "()V")
        .marked(
            ACC_PUBLIC,
            "getCompression$v1",
            "()Ljava/lang/Object;",
            Marker::Visible("getCompression".into()),
        )
        .build()
}

/// Bridge rewriter that counts calls and lingers so concurrent callers
/// overlap.
struct Counting {
    calls: AtomicUsize,
    delay: Duration,
}

impl ClassTransformer for Counting {
    fn transform(&self, type_name: &str, bytes: &[u8]) -> Result<Vec<u8>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        BridgeRewriter.transform(type_name, bytes).map_err(Into::into)
    }
}

fn counting_registry(delay: Duration) -> (Arc<TransformerRegistry>, Arc<Counting>) {
    let counting = Arc::new(Counting {
        calls: AtomicUsize::new(0),
        delay,
    });
    let registry = TransformerRegistry::new();
    registry.register(BRIDGE_REWRITER_ID, counting.clone());
    (Arc::new(registry), counting)
}

fn memory_path() -> ClassPath {
    ClassPath::new().with(
        MemorySource::new("fixtures")
            .with_type(TAR, tar_class())
            .with_type("com.example.Util", util_class())
            .with_type("org.gradle.api.tasks.bundling.Zip", {
                ClassBuilder::new("org/gradle/api/tasks/bundling/Zip").build()
            })
            .with_type("Top", ClassBuilder::new("Top").build())
            .with_type("a.Mislabeled", ClassBuilder::new("a/Other").build())
            .with_type(
                "org.gradle.api.tasks.bundling.TarBroken",
                vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0],
            ),
    )
}

#[test]
fn test_concurrent_resolution_defines_once() {
    let (registry, counting) = counting_registry(Duration::from_millis(25));
    let loader = TransformingLoader::new("concurrent", memory_path(), registry);
    let barrier = Barrier::new(16);

    let types: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    loader.resolve(TAR).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    assert!(types.iter().all(|t| Arc::ptr_eq(t, &types[0])));
    assert_eq!(loader.state(TAR), LoadState::Loaded);

    let ty = &types[0];
    assert!(ty.is_transformed());
    assert_eq!(ty.name(), TAR);
    let class = ClassFile::parse(ty.bytes()).unwrap();
    assert!(class
        .find_method("getCompression", "()Ljava/lang/Object;")
        .is_some());
}

#[test]
fn test_repeat_resolution_returns_same_type() {
    let loader = TransformingLoader::new(
        "repeat",
        memory_path(),
        Arc::new(TransformerRegistry::with_builtins()),
    );
    let first = loader.resolve(TAR).unwrap();
    let second = loader.resolve(TAR).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &loader.defined(TAR).unwrap()));
}

#[test]
fn test_non_matching_names_bypass_transformer() {
    let (registry, counting) = counting_registry(Duration::ZERO);
    let loader = TransformingLoader::new("gated", memory_path(), registry);

    assert!(!loader.should_transform("com.example.Util"));
    let util = loader.resolve("com.example.Util").unwrap();
    let zip = loader.resolve("org.gradle.api.tasks.bundling.Zip").unwrap();

    assert_eq!(counting.calls.load(Ordering::SeqCst), 0);
    assert!(!util.is_transformed());
    assert!(!zip.is_transformed());
    assert_eq!(util.bytes(), util_class().as_slice());
}

#[test]
fn test_injected_predicate_selects_types() {
    let (registry, counting) = counting_registry(Duration::ZERO);
    let loader = TransformingLoader::new("custom", memory_path(), registry)
        .with_predicate(|name: &str| name.starts_with("com.example."));

    let util = loader.resolve("com.example.Util").unwrap();
    let tar = loader.resolve(TAR).unwrap();

    assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    assert!(util.is_transformed());
    assert!(!tar.is_transformed());
    let class = ClassFile::parse(util.bytes()).unwrap();
    assert!(class
        .find_method("compress", "(Ljava/lang/String;)[B")
        .is_some());
}

#[test]
fn test_missing_type_is_not_found() {
    let loader = TransformingLoader::new(
        "empty",
        memory_path(),
        Arc::new(TransformerRegistry::with_builtins()),
    );
    let err = loader.resolve("org.gradle.api.tasks.bundling.TarMissing").unwrap_err();
    match &err {
        LoadError::TypeNotFound { type_name, loader } => {
            assert_eq!(type_name, "org.gradle.api.tasks.bundling.TarMissing");
            assert_eq!(loader, "TransformingLoader(empty)");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        loader.state("org.gradle.api.tasks.bundling.TarMissing"),
        LoadState::Failed
    );
    assert_eq!(loader.state("never.Requested"), LoadState::NotLoaded);
}

#[test]
fn test_unregistered_transformer_is_load_transform_error() {
    let loader = TransformingLoader::new(
        "unwired",
        memory_path(),
        Arc::new(TransformerRegistry::new()),
    );
    match loader.resolve(TAR).unwrap_err() {
        LoadError::LoadTransform {
            type_name,
            source: TransformError::Unavailable { id, .. },
            ..
        } => {
            assert_eq!(type_name, TAR);
            assert_eq!(id, BRIDGE_REWRITER_ID);
        }
        other => panic!("unexpected error: {other}"),
    }

    let renamed = TransformingLoader::new(
        "renamed",
        memory_path(),
        Arc::new(TransformerRegistry::with_builtins()),
    )
    .with_transformer_id("compat.other");
    assert!(matches!(
        renamed.resolve(TAR),
        Err(LoadError::LoadTransform {
            source: TransformError::Unavailable { .. },
            ..
        })
    ));
}

#[test]
fn test_failing_transform_keeps_cause_chain() {
    let loader = TransformingLoader::new(
        "broken",
        memory_path(),
        Arc::new(TransformerRegistry::with_builtins()),
    );
    let err = loader
        .resolve("org.gradle.api.tasks.bundling.TarBroken")
        .unwrap_err();

    let LoadError::LoadTransform { source, .. } = &err else {
        panic!("unexpected error: {err}");
    };
    let TransformError::Failed { source, .. } = source else {
        panic!("unexpected transform error: {source}");
    };
    let rewrite = source
        .downcast_ref::<RewriteError>()
        .expect("rewrite error is the cause");
    assert!(matches!(rewrite, RewriteError::StructuralParse { .. }));
}

#[test]
fn test_bytes_declaring_other_name_fail_to_define() {
    let loader = TransformingLoader::new(
        "define",
        memory_path(),
        Arc::new(TransformerRegistry::with_builtins()),
    );
    match loader.resolve("a.Mislabeled").unwrap_err() {
        LoadError::Define {
            source: DefineError::WrongName { found },
            resource,
            ..
        } => {
            assert_eq!(found, "a.Other");
            assert_eq!(resource, "a/Mislabeled.class");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_packages_are_established_once() {
    let loader = TransformingLoader::new(
        "packages",
        memory_path(),
        Arc::new(TransformerRegistry::with_builtins()),
    );
    let tar = loader.resolve(TAR).unwrap();
    let zip = loader.resolve("org.gradle.api.tasks.bundling.Zip").unwrap();
    let top = loader.resolve("Top").unwrap();

    let package = loader.package("org.gradle.api.tasks.bundling").unwrap();
    assert_eq!(package.name, "org.gradle.api.tasks.bundling");
    assert_eq!(package.provenance.code_base, "memory:fixtures");
    assert!(Arc::ptr_eq(tar.package().unwrap(), &package));
    assert!(Arc::ptr_eq(zip.package().unwrap(), &package));
    assert!(top.package().is_none());
    assert!(loader.package("").is_none());
}

#[test]
fn test_directory_class_path_provenance() {
    let dir = TempDir::new().unwrap();
    let package_dir = dir.path().join("org/gradle/api/tasks/bundling");
    std::fs::create_dir_all(&package_dir).unwrap();
    std::fs::write(package_dir.join("Tar.class"), tar_class()).unwrap();

    let loader = TransformingLoader::new(
        "dir",
        ClassPath::new()
            .with(MemorySource::new("empty"))
            .with_directory(dir.path()),
        Arc::new(TransformerRegistry::with_builtins()),
    );
    let tar = loader.resolve(TAR).unwrap();
    assert_eq!(tar.provenance().code_base, dir.path().display().to_string());
    assert!(tar.is_transformed());
}

/// Source whose stream fails mid-read and records when it is dropped.
struct FailingSource {
    dropped: Arc<AtomicBool>,
}

struct FailingStream {
    dropped: Arc<AtomicBool>,
}

impl Read for FailingStream {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::other("disk on fire"))
    }
}

impl Drop for FailingStream {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

impl ResourceSource for FailingSource {
    fn code_base(&self) -> String {
        "failing".to_string()
    }

    fn contains(&self, _resource: &str) -> bool {
        true
    }

    fn open(&self, _resource: &str) -> io::Result<Option<Box<dyn Read + Send + '_>>> {
        Ok(Some(Box::new(FailingStream {
            dropped: Arc::clone(&self.dropped),
        })))
    }
}

#[test]
fn test_read_failure_closes_stream() {
    let dropped = Arc::new(AtomicBool::new(false));
    let loader = TransformingLoader::new(
        "failing",
        ClassPath::new().with(FailingSource {
            dropped: Arc::clone(&dropped),
        }),
        Arc::new(TransformerRegistry::with_builtins()),
    );
    match loader.resolve(TAR).unwrap_err() {
        LoadError::Read {
            resource, source, ..
        } => {
            assert_eq!(resource, "org/gradle/api/tasks/bundling/Tar.class");
            assert_eq!(source.to_string(), "disk on fire");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(dropped.load(Ordering::SeqCst));
}

/// Fails its first call, then delegates to the bridge rewriter.
struct FlakyOnce {
    failed: AtomicBool,
}

impl ClassTransformer for FlakyOnce {
    fn transform(&self, type_name: &str, bytes: &[u8]) -> Result<Vec<u8>, BoxError> {
        if !self.failed.swap(true, Ordering::SeqCst) {
            return Err("transient".into());
        }
        BridgeRewriter.transform(type_name, bytes).map_err(Into::into)
    }
}

#[test]
fn test_failed_resolution_can_be_retried() {
    let registry = TransformerRegistry::new();
    registry.register(
        BRIDGE_REWRITER_ID,
        Arc::new(FlakyOnce {
            failed: AtomicBool::new(false),
        }),
    );
    let loader = TransformingLoader::new("retry", memory_path(), Arc::new(registry));

    assert!(loader.resolve(TAR).is_err());
    assert_eq!(loader.state(TAR), LoadState::Failed);
    assert!(loader.defined(TAR).is_none());

    let tar = loader.resolve(TAR).unwrap();
    assert!(tar.is_transformed());
    assert_eq!(loader.state(TAR), LoadState::Loaded);
}

#[test]
fn test_display() {
    let loader = TransformingLoader::new(
        "ant-and-gradle",
        ClassPath::new(),
        Arc::new(TransformerRegistry::with_builtins()),
    );
    assert_eq!(loader.to_string(), "TransformingLoader(ant-and-gradle)");
    assert_eq!(loader.transformer_id(), BRIDGE_REWRITER_ID);
}
