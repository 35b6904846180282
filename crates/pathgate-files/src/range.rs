//! Bounded reads for paging through and tailing live files.
//!
//! A read with no offset reports the current end of file and returns no
//! data; pollers then ask for that offset repeatedly and receive whatever
//! has been appended since. Every read is capped at
//! [`max_read_length`] bytes regardless of the requested length.
//!
//! The file is opened per call and dropped on every exit path, including
//! when the calling future is cancelled.

use rustix::fs::{OFlags, fcntl_getfl, fcntl_setfl};
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::constants::max_read_length;
use crate::error::{FilesError, FilesResult};
use crate::types::{ReadChunk, ReadWindow};

/// Read a bounded window of the file at `path`.
///
/// The caller is responsible for rejecting directories beforehand.
pub async fn read_range(path: &Path, window: ReadWindow) -> FilesResult<ReadChunk> {
    let mut file = File::open(path)
        .await
        .map_err(|e| logged(FilesError::io("open file at", path, e)))?;

    let size = file
        .seek(SeekFrom::End(0))
        .await
        .map_err(|e| logged(FilesError::io("determine size of", path, e)))?;

    let offset = window.offset.unwrap_or(size);
    if offset >= size {
        // Nothing new yet; report where the end currently is.
        return Ok(ReadChunk {
            offset: size,
            data: Vec::new(),
        });
    }

    let length = window.length.unwrap_or(size - offset).min(max_read_length());

    file.seek(SeekFrom::Start(offset))
        .await
        .map_err(|e| logged(FilesError::io("seek file at", path, e)))?;

    set_nonblocking(&file)
        .map_err(|e| logged(FilesError::io("set nonblocking on", path, e)))?;

    // One read only: a short read is returned as-is.
    let mut data = vec![0u8; length as usize];
    let n = file
        .read(&mut data)
        .await
        .map_err(|e| logged(FilesError::io("read file at", path, e)))?;
    data.truncate(n);

    tracing::trace!(path = %path.display(), offset, requested = length, read = n, "bounded read");
    Ok(ReadChunk { offset, data })
}

fn logged(err: FilesError) -> FilesError {
    tracing::warn!("{err}");
    err
}

fn set_nonblocking(file: &File) -> std::io::Result<()> {
    let flags = fcntl_getfl(file)?;
    fcntl_setfl(file, flags | OFlags::NONBLOCK)?;
    Ok(())
}
