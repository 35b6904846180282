//! Value types produced by resolution, listing, reads and downloads.
//!
//! These are plain data (no handles or shared state) and serialize to the
//! JSON shapes returned by the request surface.

use serde::Serialize;
use std::path::PathBuf;

/// A virtual path that resolved to a real, contained filesystem path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Canonical absolute path.
    pub path: PathBuf,
    /// Whether `path` named a directory when it was resolved.
    pub is_dir: bool,
}

impl ResolvedPath {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
        }
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    /// Entry name (not full path).
    pub name: String,
    /// Virtual path: the browsed virtual path joined with `name`.
    pub path: String,
    /// Whether the entry is a directory (symlinks are followed).
    pub dir: bool,
    /// Size in bytes.
    pub size: u64,
    /// Modification time, seconds since the Unix epoch.
    pub mtime: i64,
    /// Unix mode bits (file type and permissions).
    pub mode: u32,
    /// Number of hard links.
    pub nlink: u64,
    pub uid: u32,
    pub gid: u32,
}

/// Requested read window. `None` fields take their defaults at read time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadWindow {
    /// Start offset; `None` means the current end of file.
    pub offset: Option<u64>,
    /// Bytes wanted; `None` means up to the current end of file.
    pub length: Option<u64>,
}

impl ReadWindow {
    /// Window with no offset or length: reports the current end of file.
    pub fn tail() -> Self {
        Self::default()
    }

    pub fn new(offset: u64, length: u64) -> Self {
        Self {
            offset: Some(offset),
            length: Some(length),
        }
    }

    pub fn from_offset(offset: u64) -> Self {
        Self {
            offset: Some(offset),
            length: None,
        }
    }
}

/// Result of a bounded read.
///
/// `data` may be shorter than the requested length; `offset` is always the
/// offset that was actually served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadChunk {
    pub offset: u64,
    pub data: Vec<u8>,
}

impl ReadChunk {
    /// Offset a poller should ask for next.
    pub fn next_offset(&self) -> u64 {
        self.offset + self.data.len() as u64
    }

    /// JSON shape: `{"offset": n, "data": "..."}` with lossy UTF-8 data.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "offset": self.offset,
            "data": String::from_utf8_lossy(&self.data),
        })
    }
}

/// A file ready to be streamed by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Canonical path of the file to stream.
    pub path: PathBuf,
    /// Suggested filename (last segment of `path`).
    pub filename: String,
    pub content_type: String,
    /// Size at the time the download was prepared.
    pub size: u64,
}

impl Download {
    /// `Content-Disposition` header value.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.filename)
    }
}
