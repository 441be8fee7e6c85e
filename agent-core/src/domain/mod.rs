// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod audit;
pub mod errors;
pub mod file_entry;
pub mod path_policy;
pub mod policy_source;
pub mod rate_governor;

pub use audit::{AuditRecord, OperationKind};
pub use errors::PulsaarError;
pub use file_entry::{FileEntry, ReadChunk, DEFAULT_STREAM_CHUNK_BYTES, MAX_CHUNK_BYTES};
pub use policy_source::EffectivePolicy;
pub use rate_governor::RateGovernor;
