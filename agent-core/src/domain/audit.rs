// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Audit Record (component C data model): the shape emitted to the local
//! sink and, best-effort, to the aggregator. Value type, no behavior.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationKind {
    List,
    Stat,
    Read,
    Stream,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationKind::List => "LIST",
            OperationKind::Stat => "STAT",
            OperationKind::Read => "READ",
            OperationKind::Stream => "STREAM",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub operation: OperationKind,
    pub path: String,
    pub agent_id: String,
}

impl AuditRecord {
    pub fn new(operation: OperationKind, path: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            path: path.into(),
            agent_id: agent_id.into(),
        }
    }
}
