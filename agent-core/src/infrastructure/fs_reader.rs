// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Bounded local filesystem access. Every function here assumes the path
//! has already cleared policy admission; this module performs no policy
//! checks of its own, only I/O and the read-size bounds in §4.E.

use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;

use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::domain::file_entry::{FileEntry, ReadChunk, DEFAULT_STREAM_CHUNK_BYTES, MAX_CHUNK_BYTES};
use crate::domain::PulsaarError;

fn entry_from_metadata(name: String, metadata: &std::fs::Metadata) -> FileEntry {
    let modified = metadata
        .modified()
        .ok()
        .map(chrono::DateTime::<chrono::Utc>::from)
        .unwrap_or_else(chrono::Utc::now);
    FileEntry {
        name,
        is_directory: metadata.is_dir(),
        size_bytes: metadata.size(),
        mode: format!("{:o}", metadata.permissions().mode() & 0o7777),
        modified,
    }
}

/// List(path) -> entries. Entries whose stat fails are silently skipped.
/// Subdirectories are not recursed. Order is filesystem order.
pub async fn list_dir(path: &Path) -> Result<Vec<FileEntry>, PulsaarError> {
    let mut read_dir = fs::read_dir(path).await.map_err(|e| map_io_error(path, e))?;

    let mut entries = Vec::new();
    loop {
        let next = match read_dir.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(_) => break,
        };
        let name = next.file_name().to_string_lossy().into_owned();
        let Ok(metadata) = next.metadata().await else {
            continue;
        };
        entries.push(entry_from_metadata(name, &metadata));
    }
    Ok(entries)
}

/// Stat(path) -> entry. No symlink following; the final path component is
/// the name.
pub async fn stat(path: &Path) -> Result<FileEntry, PulsaarError> {
    let metadata = fs::symlink_metadata(path)
        .await
        .map_err(|e| map_io_error(path, e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    Ok(entry_from_metadata(name, &metadata))
}

/// Read(path, offset, length) -> bytes + eof. `length == 0` means "up to
/// the max chunk size". `length` above the max fails closed before the
/// file is opened.
pub async fn read_range(path: &Path, offset: u64, length: u64) -> Result<ReadChunk, PulsaarError> {
    let length = if length == 0 { MAX_CHUNK_BYTES } else { length };
    if length > MAX_CHUNK_BYTES {
        return Err(PulsaarError::InvalidArgument(format!(
            "read length {length} exceeds maximum of {MAX_CHUNK_BYTES} bytes"
        )));
    }

    let mut file = fs::File::open(path).await.map_err(|e| map_io_error(path, e))?;
    file.seek(std::io::SeekFrom::Start(offset))
        .await
        .map_err(|e| map_io_error(path, e))?;

    let mut data = vec![0u8; length as usize];
    let mut filled = 0usize;
    while filled < data.len() {
        let n = file
            .read(&mut data[filled..])
            .await
            .map_err(|e| map_io_error(path, e))?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    data.truncate(filled);
    let eof = (filled as u64) < length;
    Ok(ReadChunk { data, eof })
}

/// A scoped, sequential reader for Stream. The underlying file handle is
/// released when this value is dropped — cancellation, error, or running
/// to completion all go through the same `Drop` path.
pub struct ChunkedReader {
    file: fs::File,
    chunk_size: u64,
    offset: u64,
    total_size: u64,
    done: bool,
}

impl ChunkedReader {
    pub async fn open(path: &Path, chunk_size: u64) -> Result<Self, PulsaarError> {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_STREAM_CHUNK_BYTES
        } else {
            chunk_size
        };
        if chunk_size > MAX_CHUNK_BYTES {
            return Err(PulsaarError::InvalidArgument(format!(
                "chunk size {chunk_size} exceeds maximum of {MAX_CHUNK_BYTES} bytes"
            )));
        }
        let file = fs::File::open(path).await.map_err(|e| map_io_error(path, e))?;
        let total_size = file
            .metadata()
            .await
            .map_err(|e| map_io_error(path, e))?
            .len();
        Ok(Self {
            file,
            chunk_size,
            offset: 0,
            total_size,
            done: false,
        })
    }

    /// Reads sequentially from offset zero. Returns `None` once the
    /// terminal eof chunk has already been emitted.
    pub async fn next_chunk(&mut self) -> Result<Option<ReadChunk>, PulsaarError> {
        if self.done {
            return Ok(None);
        }
        let remaining = self.total_size.saturating_sub(self.offset);
        let to_read = remaining.min(self.chunk_size) as usize;

        let mut data = vec![0u8; to_read];
        let mut filled = 0usize;
        while filled < to_read {
            let n = self
                .file
                .read(&mut data[filled..])
                .await
                .map_err(|_| PulsaarError::Internal("stream read failed".to_string()))?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        data.truncate(filled);
        self.offset += filled as u64;
        let eof = self.offset >= self.total_size;
        if eof {
            self.done = true;
        }
        Ok(Some(ReadChunk { data, eof }))
    }
}

fn map_io_error(path: &Path, err: std::io::Error) -> PulsaarError {
    match err.kind() {
        std::io::ErrorKind::NotFound => {
            PulsaarError::NotFound(format!("{}: not found", path.display()))
        }
        std::io::ErrorKind::PermissionDenied => {
            PulsaarError::Internal(format!("{}: {err}", path.display()))
        }
        _ => PulsaarError::Internal(format!("{}: {err}", path.display())),
    }
}
