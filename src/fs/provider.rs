//! File lookup for static serving.
//!
//! # Responsibilities
//! - Resolve a request path to a readable resource and its metadata
//! - Report directories so callers can redirect or look for an index file
//! - Keep lookups inside the configured root
//!
//! # Design Decisions
//! - Paths are cleaned lexically before touching the file system
//! - Not found and permission errors are plain `io::Error`s; callers fall
//!   through rather than failing the request

use std::fs::File;
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Metadata of an opened resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
    pub is_dir: bool,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

/// Seekable byte stream of a resource.
pub trait Content: Read + Seek + Send {}

impl<T: Read + Seek + Send> Content for T {}

/// An opened resource. Dropping it releases the underlying handle.
pub struct OpenFile {
    meta: FileMeta,
    content: Box<dyn Content>,
}

impl OpenFile {
    pub fn new(meta: FileMeta, content: impl Content + 'static) -> Self {
        Self {
            meta,
            content: Box::new(content),
        }
    }

    pub fn meta(&self) -> &FileMeta {
        &self.meta
    }

    pub fn is_dir(&self) -> bool {
        self.meta.is_dir
    }

    pub fn content(&mut self) -> &mut dyn Content {
        &mut *self.content
    }
}

impl std::fmt::Debug for OpenFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenFile").field("meta", &self.meta).finish_non_exhaustive()
    }
}

/// Source of static resources.
pub trait FileProvider: Send + Sync + 'static {
    /// Open the resource at `path`, a `/`-separated request path.
    fn open(&self, path: &str) -> io::Result<OpenFile>;
}

/// Serves files below a root directory on disk.
#[derive(Debug, Clone)]
pub struct DirProvider {
    root: PathBuf,
}

impl DirProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        if path.contains('\0') || path.contains('\\') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid character in file path",
            ));
        }

        let cleaned = clean_path(path);
        Ok(self.root.join(cleaned.trim_start_matches('/')))
    }
}

impl FileProvider for DirProvider {
    fn open(&self, path: &str) -> io::Result<OpenFile> {
        let full = self.resolve(path)?;
        let file = File::open(&full)?;
        let metadata = file.metadata()?;

        let meta = FileMeta {
            is_dir: metadata.is_dir(),
            len: metadata.len(),
            modified: metadata.modified().ok(),
        };

        tracing::trace!(path = %path, file = ?full, is_dir = meta.is_dir, "Opened static resource");
        Ok(OpenFile::new(meta, file))
    }
}

/// Canonical form of a `/`-separated path.
///
/// Empty and `.` elements are dropped, `..` removes the preceding element
/// and never climbs above the root. The result always starts with `/`.
pub fn clean_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }

    let mut cleaned = String::with_capacity(path.len() + 1);
    for part in parts {
        cleaned.push('/');
        cleaned.push_str(part);
    }
    if cleaned.is_empty() {
        cleaned.push('/');
    }
    cleaned
}

/// Join `file` onto the directory path `dir` and clean the result.
pub fn join_path(dir: &str, file: &str) -> String {
    clean_path(&format!("{}/{}", dir, file))
}
