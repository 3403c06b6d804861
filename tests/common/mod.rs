//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{self, Cursor};
use std::sync::{Arc, Mutex};
use std::time::{Duration, UNIX_EPOCH};

use axum::body::Bytes;
use axum::http::{Method, Request};
use tracing_subscriber::fmt::MakeWriter;

use segment_router::fs::{clean_path, FileMeta, FileProvider, OpenFile};

/// In-memory sink for formatted log output.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Lines containing `needle`.
    pub fn lines_with(&self, needle: &str) -> usize {
        self.contents().lines().filter(|line| line.contains(needle)).count()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with a subscriber writing into a fresh buffer on this thread.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, LogBuffer) {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .without_time()
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    (result, logs)
}

pub fn request(method: Method, uri: &str) -> Request<Bytes> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Bytes::new())
        .unwrap()
}

pub const MTIME_SECS: u64 = 1_700_000_000;

/// File provider backed by a map, with a fixed modification time.
#[derive(Default)]
pub struct MemoryProvider {
    files: HashMap<String, Vec<u8>>,
    dirs: Vec<String>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, path: &str, body: &str) -> Self {
        self.files.insert(path.to_string(), body.as_bytes().to_vec());
        self
    }

    pub fn dir(mut self, path: &str) -> Self {
        self.dirs.push(path.to_string());
        self
    }
}

impl FileProvider for MemoryProvider {
    fn open(&self, path: &str) -> io::Result<OpenFile> {
        let path = clean_path(path);
        let modified = Some(UNIX_EPOCH + Duration::from_secs(MTIME_SECS));

        if self.dirs.iter().any(|dir| *dir == path) {
            let meta = FileMeta {
                is_dir: true,
                len: 0,
                modified,
            };
            return Ok(OpenFile::new(meta, Cursor::new(Vec::new())));
        }

        match self.files.get(&path) {
            Some(body) => {
                let meta = FileMeta {
                    is_dir: false,
                    len: body.len() as u64,
                    modified,
                };
                Ok(OpenFile::new(meta, Cursor::new(body.clone())))
            }
            None => Err(io::ErrorKind::NotFound.into()),
        }
    }
}
