// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! File Entry and Read response value types (agent responses). Pure data,
//! no I/O — `infrastructure::fs_reader` is what populates these from the
//! local filesystem.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub name: String,
    pub is_directory: bool,
    pub size_bytes: u64,
    pub mode: String,
    pub modified: DateTime<Utc>,
}

/// Maximum bytes the agent will read or stream in a single message.
pub const MAX_CHUNK_BYTES: u64 = 1024 * 1024;
/// Default Stream chunk size when the caller requests `0`.
pub const DEFAULT_STREAM_CHUNK_BYTES: u64 = 64 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct ReadChunk {
    pub data: Vec<u8>,
    pub eof: bool,
}
