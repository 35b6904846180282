//! Attachment registry: virtual name → canonical real path.
//!
//! The registry is plain owned state. It is held by exactly one
//! [`FilesActor`](crate::actor), which serializes every mutation and lookup,
//! so it carries no locks of its own.

use rustix::fs::{Access, access};
use rustix::io::Errno;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{FilesError, FilesResult};

/// Maps attachment names to canonical real paths.
///
/// Attaching a name that already exists replaces the previous mapping.
#[derive(Debug, Default, Clone)]
pub struct PathRegistry {
    paths: BTreeMap<String, PathBuf>,
}

impl PathRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize an attachment name: strip trailing `/`.
    fn normalize_name(name: &str) -> &str {
        name.trim_end_matches('/')
    }

    /// Attach `host_path` under `name`.
    ///
    /// The host path is canonicalized (symlinks followed) and must be
    /// readable by this process. Returns the canonical path that was stored.
    pub fn attach(&mut self, host_path: &Path, name: &str) -> FilesResult<PathBuf> {
        let name = Self::normalize_name(name);
        if name.is_empty() {
            return Err(FilesError::InvalidName(name.to_string()));
        }

        let real = dunce::canonicalize(host_path)
            .map_err(|e| FilesError::io("get realpath of", host_path, e))?;

        check_readable(&real)?;

        if let Some(previous) = self.paths.insert(name.to_string(), real.clone()) {
            tracing::debug!(name, previous = %previous.display(), "replacing attachment");
        }
        tracing::info!(name, path = %real.display(), "attached");
        Ok(real)
    }

    /// Remove the attachment for `name`.
    ///
    /// Returns `true` if a mapping was removed. Unknown names are a no-op.
    pub fn detach(&mut self, name: &str) -> bool {
        let name = Self::normalize_name(name);
        let removed = self.paths.remove(name).is_some();
        if removed {
            tracing::info!(name, "detached");
        }
        removed
    }

    /// Look up the real path attached under exactly `name`.
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.paths.get(name).map(PathBuf::as_path)
    }

    /// Copy of the full name → real path mapping, for diagnostics.
    pub fn snapshot(&self) -> BTreeMap<String, PathBuf> {
        self.paths.clone()
    }
}

fn check_readable(path: &Path) -> FilesResult<()> {
    match access(path, Access::READ_OK) {
        Ok(()) => Ok(()),
        Err(Errno::ACCESS) => Err(FilesError::AccessDenied(path.to_path_buf())),
        Err(e) => Err(FilesError::io("access", path, e.into())),
    }
}
