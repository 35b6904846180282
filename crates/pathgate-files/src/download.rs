//! Whole-file downloads, served by reference.

use tokio::fs;

use crate::error::{FilesError, FilesResult};
use crate::mime::MimeTypes;
use crate::types::{Download, ResolvedPath};

/// Prepare a resolved file for streaming.
///
/// The file itself is not opened or buffered here; the transport streams
/// it from [`Download::path`].
pub async fn prepare_download(resolved: &ResolvedPath, mime: &MimeTypes) -> FilesResult<Download> {
    if resolved.is_dir {
        return Err(FilesError::IsADirectory("download"));
    }

    let path = &resolved.path;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            FilesError::io(
                "determine basename of",
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"),
            )
        })?;

    let meta = fs::metadata(path)
        .await
        .map_err(|e| FilesError::io("stat", path, e))?;
    if meta.is_dir() {
        return Err(FilesError::IsADirectory("download"));
    }

    let content_type = mime.content_type_for(&filename).to_string();
    tracing::debug!(path = %path.display(), %content_type, size = meta.len(), "prepared download");

    Ok(Download {
        path: path.clone(),
        filename,
        content_type,
        size: meta.len(),
    })
}
