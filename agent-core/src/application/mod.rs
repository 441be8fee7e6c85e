// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Access Broker (component J): the client-side orchestrator. Composes
//! Cluster Identity Gate (G) -> Agent Attach (H) -> Transport Factory (I)
//! -> the chosen RPC against the Agent RPC Server (E), surfacing a single
//! actionable error and releasing all prior resources in reverse order on
//! any step's failure.

pub mod broker;
pub mod call_context;
pub mod grpc_channel;

pub use broker::Broker;
pub use call_context::{CallContext, WorkloadRef};
