//! # pulsaar-agent-core
//!
//! The read-only file-access subsystem that backs Pulsaar: an in-pod agent
//! serving bounded filesystem operations under a deny-by-default path
//! policy, and the cluster-facing plumbing (identity, attachment,
//! transport) a client-side broker composes to reach it.
//!
//! ## Layer structure
//!
//! ```text
//! presentation/    gRPC service surface (PulsaarAgent)
//!      |
//! application/     broker orchestration (identity -> attach -> transport -> RPC)
//!      |
//! domain/          path policy, rate governor, audit record, file entry
//!      |
//! infrastructure/  TLS material, cluster-API adapters, local filesystem
//! ```
//!
//! `domain` has no knowledge of tonic, kube, or tokio I/O; it is pure
//! decision logic that `presentation` and `application` drive.

pub mod domain;
pub mod infrastructure;
pub mod application;
pub mod presentation;

pub use domain::*;

/// Generated protobuf/gRPC bindings for the `pulsaar.v1` service.
pub mod proto {
    tonic::include_proto!("pulsaar.v1");
}

/// Cargo-reported version, surfaced verbatim by the Health RPC.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
