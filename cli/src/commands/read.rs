// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! `pulsaar read`: one-shot Read(path, offset, length) -> bytes + eof.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};

use pulsaar_agent_core::application::{Broker, CallContext, WorkloadRef};
use pulsaar_agent_core::infrastructure::cluster::TransportKind;

#[allow(clippy::too_many_arguments)]
pub async fn run(
    broker: &Broker,
    workload: WorkloadRef,
    path: String,
    offset: u64,
    length: u64,
    transport: TransportKind,
    out: Option<PathBuf>,
) -> Result<()> {
    let ctx = CallContext::new(workload, path, transport).with_range(offset, length);
    let response = broker.read(&ctx).await?;

    match out {
        Some(out_path) => {
            std::fs::write(&out_path, &response.data)
                .with_context(|| format!("writing {}", out_path.display()))?;
        }
        None => {
            std::io::stdout()
                .write_all(&response.data)
                .context("writing to stdout")?;
        }
    }

    if !response.eof {
        eprintln!(
            "note: {} bytes read, more remain past offset {}",
            response.data.len(),
            offset + response.data.len() as u64
        );
    }
    Ok(())
}
