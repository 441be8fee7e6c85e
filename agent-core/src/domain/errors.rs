// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use thiserror::Error;

/// Closed sum of error kinds an agent operation can fail with. Kept as a
/// kind, not an exception hierarchy, so callers pattern-match rather than
/// catch; maps 1:1 onto `tonic::Code` at the RPC boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PulsaarError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("unimplemented: {0}")]
    Unimplemented(String),
}

impl From<PulsaarError> for tonic::Status {
    fn from(err: PulsaarError) -> Self {
        let message = err.to_string();
        let code = match err {
            PulsaarError::PermissionDenied(_) => tonic::Code::PermissionDenied,
            PulsaarError::InvalidArgument(_) => tonic::Code::InvalidArgument,
            PulsaarError::ResourceExhausted(_) => tonic::Code::ResourceExhausted,
            PulsaarError::NotFound(_) => tonic::Code::NotFound,
            PulsaarError::Unavailable(_) => tonic::Code::Unavailable,
            PulsaarError::Internal(_) => tonic::Code::Internal,
            PulsaarError::Unimplemented(_) => tonic::Code::Unimplemented,
        };
        tonic::Status::new(code, message)
    }
}
