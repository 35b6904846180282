//! Directory listings.
//!
//! Listings are best-effort over a live filesystem: an entry whose
//! metadata cannot be read (deleted mid-listing, dangling symlink) is
//! logged and skipped rather than failing the whole listing.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use tokio::fs;

use crate::error::{FilesError, FilesResult};
use crate::types::FileInfo;

/// List the direct children of `dir`.
///
/// Entries are ordered by their full real path, bytewise. Each entry's
/// `path` is `virtual_prefix` joined with the entry name.
pub async fn list_directory(dir: &Path, virtual_prefix: &str) -> FilesResult<Vec<FileInfo>> {
    let mut read_dir = fs::read_dir(dir)
        .await
        .map_err(|e| FilesError::io("list", dir, e))?;

    let mut files: BTreeMap<OsString, FileInfo> = BTreeMap::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|e| FilesError::io("list", dir, e))?
    {
        let full_path = dir.join(entry.file_name());

        // Follows symlinks, so a link to a directory lists as a directory.
        let meta = match fs::metadata(&full_path).await {
            Ok(meta) => meta,
            Err(e) => {
                tracing::warn!(
                    path = %full_path.display(),
                    error = %e,
                    "found in listing but stat failed"
                );
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        let info = file_info(join_virtual(virtual_prefix, &name), name, &meta);
        files.insert(full_path.into_os_string(), info);
    }

    Ok(files.into_values().collect())
}

/// Join a virtual directory path and a child name with exactly one `/`.
pub fn join_virtual(prefix: &str, name: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), name)
}

fn file_info(path: String, name: String, meta: &std::fs::Metadata) -> FileInfo {
    FileInfo {
        name,
        path,
        dir: meta.is_dir(),
        size: meta.len(),
        mtime: meta.mtime(),
        mode: meta.mode(),
        nlink: meta.nlink(),
        uid: meta.uid(),
        gid: meta.gid(),
    }
}
