// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod explore;
pub mod health;
pub mod read;
pub mod stat;
pub mod stream;

use pulsaar_agent_core::proto::FileInfo;

/// Shared `ls -l`-ish rendering for a single file entry, used by both
/// `explore` (many entries) and `stat` (one entry).
pub fn format_entry(entry: &FileInfo) -> String {
    let kind = if entry.is_dir { 'd' } else { '-' };
    let mtime = entry
        .mtime
        .as_ref()
        .and_then(|ts| chrono::DateTime::from_timestamp(ts.seconds, ts.nanos.max(0) as u32))
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "{kind} {:>4} {:>12} {mtime} {}",
        entry.mode, entry.size_bytes, entry.name
    )
}
