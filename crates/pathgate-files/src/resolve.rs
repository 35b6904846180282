//! Virtual path resolution with longest-prefix matching.
//!
//! Suppose `/1/2/hello_world.txt` exists and `/1/2` is attached as
//! `sandbox`. Resolving the virtual path `sandbox/hello_world.txt` yields
//! the real path `/1/2/hello_world.txt`.
//!
//! The longest registered prefix of the virtual path wins; the remaining
//! segments are joined onto that attachment's canonical root, the result is
//! canonicalized, and it must still lie under the root. Symlinks and `..`
//! segments that lead outside the root are rejected.

use std::path::Path;

use crate::error::{FilesError, FilesResult};
use crate::registry::PathRegistry;
use crate::types::ResolvedPath;

/// Find the longest registered prefix of `virtual_path`.
///
/// Returns the attachment's real path and the unmatched trailing segments,
/// in order. A single trailing `/` is ignored. Returns `None` when no
/// prefix is registered, including for the empty path.
pub fn longest_prefix<'r, 'p>(
    registry: &'r PathRegistry,
    virtual_path: &'p str,
) -> Option<(&'r Path, Vec<&'p str>)> {
    let trimmed = virtual_path.strip_suffix('/').unwrap_or(virtual_path);
    if trimmed.is_empty() {
        return None;
    }

    let tokens: Vec<&str> = trimmed.split('/').collect();
    (1..=tokens.len()).rev().find_map(|end| {
        let prefix = tokens[..end].join("/");
        registry
            .get(&prefix)
            .map(|root| (root, tokens[end..].to_vec()))
    })
}

/// Resolve a virtual path against the registry.
///
/// - `Ok(Some(_))`: the path exists and is contained in its attachment.
/// - `Ok(None)`: no attachment matches, or a file attachment was addressed
///   as if it had children.
/// - `Err(_)`: canonicalization failed or the result escapes the root.
pub fn resolve(registry: &PathRegistry, virtual_path: &str) -> FilesResult<Option<ResolvedPath>> {
    let Some((root, suffix)) = longest_prefix(registry, virtual_path) else {
        return Ok(None);
    };

    // Empty segments (`a//b`, trailing `/`) contribute nothing.
    let segments: Vec<&str> = suffix.into_iter().filter(|s| !s.is_empty()).collect();

    if !is_dir(root) {
        if !segments.is_empty() {
            // Addressing a file attachment as a directory is a client
            // mistake, reported the same as an absent path.
            return Ok(None);
        }
        return Ok(Some(ResolvedPath::file(root)));
    }

    // Both sides of the containment check must be canonical, so the root
    // is re-canonicalized in case a symlink above it changed since attach.
    let canonical_root = dunce::canonicalize(root).map_err(|source| {
        tracing::warn!(root = %root.display(), error = %source, "attachment root no longer resolves");
        FilesError::Canonicalize {
            path: root.to_path_buf(),
            source,
        }
    })?;

    let mut candidate = canonical_root.clone();
    candidate.extend(&segments);

    let canonical = dunce::canonicalize(&candidate).map_err(|source| {
        tracing::warn!(
            virtual_path,
            candidate = %candidate.display(),
            error = %source,
            "failed to canonicalize resolved path"
        );
        FilesError::Canonicalize {
            path: candidate.clone(),
            source,
        }
    })?;

    // Component-wise: `/foo` does not contain `/foobar`.
    if !canonical.starts_with(&canonical_root) {
        tracing::warn!(
            virtual_path,
            candidate = %candidate.display(),
            canonical = %canonical.display(),
            root = %canonical_root.display(),
            "resolved path escapes attachment root"
        );
        return Err(FilesError::Inaccessible(candidate));
    }

    let is_dir = is_dir(&canonical);
    Ok(Some(ResolvedPath {
        path: canonical,
        is_dir,
    }))
}

/// Like [`resolve`], but maps `Ok(None)` to [`FilesError::NotFound`].
pub fn resolve_existing(registry: &PathRegistry, virtual_path: &str) -> FilesResult<ResolvedPath> {
    resolve(registry, virtual_path)?.ok_or_else(|| FilesError::not_found(virtual_path))
}

fn is_dir(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}
