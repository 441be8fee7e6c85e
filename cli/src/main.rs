// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Pulsaar CLI
//!
//! The `pulsaar` binary is the client-side Access Broker: it authenticates
//! the caller against the cluster, authorizes the target workload,
//! attaches an agent if one is not already present, procures a transport,
//! and drives the read-only file RPC.
//!
//! ## Commands
//!
//! - `pulsaar explore <workload> [path]` - List(path)
//! - `pulsaar read <workload> <path>` - Read(path, offset, length)
//! - `pulsaar stream <workload> <path>` - Stream(path, chunk_size)
//! - `pulsaar stat <workload> <path>` - Stat(path)
//! - `pulsaar health <workload>` - Health()

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod client_setup;
mod commands;

use pulsaar_agent_core::application::{Broker, WorkloadRef};
use pulsaar_agent_core::infrastructure::cluster::TransportKind;

/// Pulsaar - auditable, read-only access to files inside running workloads
#[derive(Parser)]
#[command(name = "pulsaar")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Target namespace
    #[arg(short, long, global = true, default_value = "default")]
    namespace: String,

    /// Transport used to reach the agent
    #[arg(long, global = true, default_value = "pod-forward")]
    transport: String,

    /// Bearer token used to authenticate against the cluster
    #[arg(long, global = true, env = "PULSAAR_BEARER_TOKEN")]
    token: Option<String>,

    /// Image used when an agent must be attached to the workload
    #[arg(long, global = true, env = "PULSAAR_AGENT_IMAGE", default_value = "ghcr.io/100monkeys-ai/pulsaar-agent:latest")]
    agent_image: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "PULSAAR_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a directory's entries
    Explore {
        /// Workload name
        workload: String,
        /// Directory path (defaults to the agent's policy root)
        #[arg(default_value = "/")]
        path: String,
    },
    /// Read a bounded range of a file
    Read {
        /// Workload name
        workload: String,
        /// File path
        path: String,
        /// Byte offset to start reading from
        #[arg(long, default_value_t = 0)]
        offset: u64,
        /// Bytes to read (0 means up to 1 MiB)
        #[arg(long, default_value_t = 0)]
        length: u64,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Stream a file's contents to completion
    Stream {
        /// Workload name
        workload: String,
        /// File path
        path: String,
        /// Chunk size in bytes (0 means the default of 64 KiB)
        #[arg(long, default_value_t = 0)]
        chunk_size: u64,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Stat a single path
    Stat {
        /// Workload name
        workload: String,
        /// File or directory path
        path: String,
    },
    /// Check the agent's health
    Health {
        /// Workload name
        workload: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;
    rustls::crypto::ring::default_provider().install_default().ok();

    if let Err(err) = run(cli).await {
        eprintln!("{} {err:#}", "error:".red().bold());
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let transport = TransportKind::parse(&cli.transport).map_err(anyhow::Error::from)?;

    let client = client_setup::build_cluster_client().await?;
    let api_host = client_setup::api_host(&client);
    let bearer_token = client_setup::resolve_bearer_token(cli.token)?;
    let client_tls = client_setup::load_client_tls()?;

    let broker = Broker::new(client, api_host, bearer_token, cli.agent_image, client_tls);

    match cli.command {
        Commands::Explore { workload, path } => {
            let workload = WorkloadRef::new(cli.namespace, workload);
            commands::explore::run(&broker, workload, path, transport).await
        }
        Commands::Read { workload, path, offset, length, out } => {
            let workload = WorkloadRef::new(cli.namespace, workload);
            commands::read::run(&broker, workload, path, offset, length, transport, out).await
        }
        Commands::Stream { workload, path, chunk_size, out } => {
            let workload = WorkloadRef::new(cli.namespace, workload);
            commands::stream::run(&broker, workload, path, chunk_size, transport, out).await
        }
        Commands::Stat { workload, path } => {
            let workload = WorkloadRef::new(cli.namespace, workload);
            commands::stat::run(&broker, workload, path, transport).await
        }
        Commands::Health { workload } => {
            let workload = WorkloadRef::new(cli.namespace, workload);
            commands::health::run(&broker, workload, transport).await
        }
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
