//! Writing rewritten class files back to disk.
//!
//! A [`ClassWrite`] replaces a file's contents atomically and bumps its
//! mtime so build tools notice. Writing bytes identical to what is already
//! on disk is a no-op, so rewriting a tree twice leaves it untouched the
//! second time.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// Pending replacement of one class file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassWrite {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("cannot write {0}: path has no parent directory")]
    NoParent(PathBuf),

    #[error("failed to write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "EmitResult reports whether the file changed"]
pub enum EmitResult {
    Written { path: PathBuf, bytes: usize },
    /// On-disk contents already matched.
    Unchanged { path: PathBuf },
}

impl ClassWrite {
    pub fn new(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes,
        }
    }

    /// Whether the file on disk already holds these bytes.
    pub fn is_current(&self) -> bool {
        fs::read(&self.path).is_ok_and(|existing| {
            existing.len() == self.bytes.len() && xxh3_64(&existing) == xxh3_64(&self.bytes)
        })
    }

    /// Write via tempfile + fsync + rename, then touch the mtime.
    pub fn apply(&self) -> Result<EmitResult, EmitError> {
        if self.is_current() {
            tracing::debug!(path = %self.path.display(), "class file unchanged");
            return Ok(EmitResult::Unchanged {
                path: self.path.clone(),
            });
        }

        atomic_write(&self.path, &self.bytes)?;
        filetime::set_file_mtime(&self.path, filetime::FileTime::now())
            .map_err(|source| self.io_error(source))?;

        tracing::debug!(path = %self.path.display(), bytes = self.bytes.len(), "class file written");
        Ok(EmitResult::Written {
            path: self.path.clone(),
            bytes: self.bytes.len(),
        })
    }

    fn io_error(&self, source: io::Error) -> EmitError {
        EmitError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EmitError> {
    let io_error = |source| EmitError::Io {
        path: path.to_path_buf(),
        source,
    };
    // Same directory, so the rename never crosses filesystems.
    let parent = match path.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => return Err(EmitError::NoParent(path.to_path_buf())),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(io_error)?;
    temp.write_all(content).map_err(io_error)?;
    temp.as_file().sync_all().map_err(io_error)?;
    temp.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}
