// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Presentation layer: the gRPC surface the agent exposes to the broker.

pub mod grpc;
