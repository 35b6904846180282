//! Error types for attachment resolution and file serving.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Files error type.
///
/// Each variant maps onto one response status class via
/// [`FilesError::status_code`].
#[derive(Debug, Error)]
pub enum FilesError {
    /// Missing or malformed request parameter.
    #[error("{0}")]
    InvalidRequest(String),

    /// A file operation was asked to act on a directory.
    #[error("Cannot {0} a directory")]
    IsADirectory(&'static str),

    /// No attachment matches, or a file attachment was addressed as a directory.
    #[error("not found: {0}")]
    NotFound(String),

    /// Attachment name is empty after normalization.
    #[error("invalid attachment name: {0:?}")]
    InvalidName(String),

    /// Canonical path lies outside the attachment root.
    #[error("'{}' is inaccessible", .0.display())]
    Inaccessible(PathBuf),

    /// The candidate path could not be canonicalized.
    #[error("Failed to determine canonical path of '{}': {source}", path.display())]
    Canonicalize {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The serving process may not read the path.
    #[error("Failed to access '{}': Access denied", .0.display())]
    AccessDenied(PathBuf),

    /// OS-level failure while operating on a path.
    #[error("Failed to {op} '{}': {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The files actor is no longer running.
    #[error("files actor shut down")]
    Shutdown,
}

impl FilesError {
    /// Create an InvalidRequest error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create an Io error for `op` on `path`.
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Status code reported to the caller for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            FilesError::InvalidRequest(_)
            | FilesError::IsADirectory(_)
            | FilesError::InvalidName(_) => 400,
            FilesError::NotFound(_) => 404,
            FilesError::Inaccessible(_)
            | FilesError::Canonicalize { .. }
            | FilesError::AccessDenied(_)
            | FilesError::Io { .. }
            | FilesError::Shutdown => 500,
        }
    }

    /// Returns true for errors caused by the caller rather than the server.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

/// Files result type.
pub type FilesResult<T> = Result<T, FilesError>;
