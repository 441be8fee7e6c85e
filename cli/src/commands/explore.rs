// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! `pulsaar explore`: List(path) -> entries.

use anyhow::Result;

use pulsaar_agent_core::application::{Broker, CallContext, WorkloadRef};
use pulsaar_agent_core::infrastructure::cluster::TransportKind;

use super::format_entry;

pub async fn run(
    broker: &Broker,
    workload: WorkloadRef,
    path: String,
    transport: TransportKind,
) -> Result<()> {
    let ctx = CallContext::new(workload, path, transport);
    let entries = broker.list(&ctx).await?;
    for entry in &entries {
        println!("{}", format_entry(entry));
    }
    if entries.is_empty() {
        eprintln!("(empty)");
    }
    Ok(())
}
