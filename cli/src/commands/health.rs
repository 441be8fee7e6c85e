// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! `pulsaar health`: Health() -> {ready, version, status, commit, date}.

use anyhow::Result;
use colored::Colorize;

use pulsaar_agent_core::application::{Broker, CallContext, WorkloadRef};
use pulsaar_agent_core::infrastructure::cluster::TransportKind;

pub async fn run(broker: &Broker, workload: WorkloadRef, transport: TransportKind) -> Result<()> {
    let ctx = CallContext::new(workload, "/".to_string(), transport);
    let health = broker.health(&ctx).await?;

    let ready = if health.ready {
        "ready".green()
    } else {
        "not ready".red()
    };
    println!("{ready} version={} commit={} date={}", health.version, health.commit, health.date);
    println!("{}", health.status_message);
    Ok(())
}
