// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod agent_service;
pub mod server;

pub use agent_service::{AgentService, HealthInfo};
pub use server::{start_grpc_server, AGENT_PORT};
