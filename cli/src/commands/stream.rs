// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! `pulsaar stream`: Stream(path, chunk_size) -> sequence of bytes + eof,
//! concatenated to stdout or `--out` as chunks arrive.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};

use pulsaar_agent_core::application::{Broker, CallContext, WorkloadRef};
use pulsaar_agent_core::infrastructure::cluster::TransportKind;

pub async fn run(
    broker: &Broker,
    workload: WorkloadRef,
    path: String,
    chunk_size: u64,
    transport: TransportKind,
    out: Option<PathBuf>,
) -> Result<()> {
    let ctx = CallContext::new(workload, path, transport).with_chunk_size(chunk_size);
    let mut active = broker.stream(&ctx).await?;

    let mut sink: Box<dyn Write> = match &out {
        Some(out_path) => Box::new(
            std::fs::File::create(out_path)
                .with_context(|| format!("creating {}", out_path.display()))?,
        ),
        None => Box::new(std::io::stdout()),
    };

    let mut total = 0u64;
    while let Some(chunk) = active.next().await? {
        sink.write_all(&chunk.data).context("writing stream chunk")?;
        total += chunk.data.len() as u64;
        if chunk.eof {
            break;
        }
    }
    sink.flush().context("flushing stream output")?;
    eprintln!("note: {total} bytes streamed");
    Ok(())
}
