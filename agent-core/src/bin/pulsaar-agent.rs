// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! The in-pod agent process: resolves its Effective Policy (F), wires up
//! the Rate Governor (B) and Audit Emitter (C), and serves the
//! `PulsaarAgent` RPCs (E) under the TLS Material Loader (D).

use std::env;
use std::net::SocketAddr;

use pulsaar_agent_core::domain::policy_source::{self, EffectivePolicy};
use pulsaar_agent_core::domain::RateGovernor;
use pulsaar_agent_core::infrastructure::cluster::policy_source_k8s;
use pulsaar_agent_core::infrastructure::AuditEmitter;
use pulsaar_agent_core::presentation::grpc::{start_grpc_server, AgentService, HealthInfo, AGENT_PORT};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    rustls::crypto::ring::default_provider()
        .install_default()
        .ok();

    let namespace = policy_source_k8s::self_namespace();
    let pod_name = policy_source_k8s::self_pod_name();

    let policy = resolve_effective_policy(&namespace, pod_name.as_deref()).await;
    tracing::info!(roots = ?policy.roots(), "effective policy resolved");

    let governor = RateGovernor::with_defaults();
    let agent_id = hostname::get()
        .ok()
        .and_then(|s| s.into_string().ok())
        .unwrap_or_else(|| "pulsaar-agent".to_string());
    let audit = AuditEmitter::new(agent_id);
    let health = HealthInfo {
        version: pulsaar_agent_core::VERSION.to_string(),
        commit: env::var("PULSAAR_BUILD_COMMIT").unwrap_or_else(|_| "unknown".to_string()),
        date: env::var("PULSAAR_BUILD_DATE").unwrap_or_else(|_| "unknown".to_string()),
    };

    let service = AgentService::new(policy, governor, audit, health);
    let addr = SocketAddr::from(([0, 0, 0, 0], AGENT_PORT));
    tracing::info!(%addr, "starting pulsaar-agent");
    start_grpc_server(addr, service).await?;
    Ok(())
}

/// Cluster-API failure while resolving the policy is "absent", not
/// fatal: it falls through to the environment variable and then the
/// default, same as an absent annotation or config object would.
async fn resolve_effective_policy(namespace: &str, pod_name: Option<&str>) -> EffectivePolicy {
    let Some(pod_name) = pod_name else {
        tracing::warn!("PULSAAR_POD_NAME not set, skipping workload annotation and namespace config lookups");
        return policy_source::resolve([None, None, policy_source_k8s::env_allowed_roots()]);
    };

    match kube::Client::try_default().await {
        Ok(client) => {
            pulsaar_agent_core::infrastructure::cluster::PolicySourceResolver::new(client)
                .resolve(namespace, pod_name)
                .await
        }
        Err(err) => {
            tracing::warn!(error = %err, "cluster API unreachable at startup, falling back to environment/default policy");
            policy_source::resolve([None, None, policy_source_k8s::env_allowed_roots()])
        }
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
