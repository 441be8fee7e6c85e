// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod audit_emitter;
pub mod client_tls;
pub mod cluster;
pub mod fs_reader;
pub mod tls;

pub use audit_emitter::AuditEmitter;
pub use client_tls::ClientTlsMaterial;
pub use tls::{TlsIdentity, TlsMaterialLoader};
