// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Transport Factory (component I). Produces a dialable endpoint to the
//! agent via pod-forward or cluster-API proxy. Scoped acquisition:
//! cleanup is guaranteed on all exit paths via `Drop`.
//!
//! `PodForward` dials the agent directly over a loopback port. `ApiProxy`
//! dials the cluster API host itself; reaching the agent from there
//! requires every RPC's path to be prefixed with the pod's proxy
//! subresource path, which the generated gRPC client cannot do on its
//! own (see `application/grpc_channel.rs`'s `AgentChannel`) — so this
//! factory hands back that prefix alongside the endpoint instead of
//! baking it into the endpoint URL.

use std::time::Duration;

use k8s_openapi::api::core::v1::Pod;
use kube::api::Api;
use kube::Client;
use tokio::net::TcpListener;

use crate::domain::PulsaarError;
use crate::infrastructure::cluster::agent_attach::AGENT_PORT;

const SETTLE_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    PodForward,
    ApiProxy,
}

impl TransportKind {
    pub fn parse(name: &str) -> Result<Self, PulsaarError> {
        match name {
            "pod-forward" => Ok(Self::PodForward),
            "api-proxy" => Ok(Self::ApiProxy),
            other => Err(PulsaarError::InvalidArgument(format!(
                "unknown transport selector: {other}"
            ))),
        }
    }
}

/// Guards the background forwarding task. Dropping it aborts the task,
/// which is the guaranteed-release equivalent of killing a forwarding
/// subprocess.
struct PodForwardGuard {
    abort: tokio::task::AbortHandle,
}

impl Drop for PodForwardGuard {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

/// A TLS-dialable endpoint plus whatever scoped resource keeps it alive.
/// For `ApiProxy` there is nothing to release; for `PodForward` dropping
/// this value tears down the forwarding task. `path_prefix`, when set,
/// must be spliced onto every RPC's path before it reaches `endpoint`.
pub struct Transport {
    pub endpoint: String,
    pub path_prefix: Option<String>,
    _forward_guard: Option<PodForwardGuard>,
}

pub struct TransportFactory {
    client: Client,
    api_host: String,
}

impl TransportFactory {
    pub fn new(client: Client, api_host: impl Into<String>) -> Self {
        Self {
            client,
            api_host: api_host.into(),
        }
    }

    pub async fn establish(
        &self,
        kind: TransportKind,
        namespace: &str,
        pod_name: &str,
    ) -> Result<Transport, PulsaarError> {
        match kind {
            TransportKind::PodForward => self.establish_pod_forward(namespace, pod_name).await,
            TransportKind::ApiProxy => Ok(Transport {
                endpoint: self.api_host.clone(),
                path_prefix: Some(api_proxy_path_prefix(namespace, pod_name)),
                _forward_guard: None,
            }),
        }
    }

    async fn establish_pod_forward(
        &self,
        namespace: &str,
        pod_name: &str,
    ) -> Result<Transport, PulsaarError> {
        // Bind an ephemeral loopback port and immediately release it, to
        // learn a free port without holding it open.
        let probe = TcpListener::bind(("127.0.0.1", 0))
            .await
            .map_err(|e| PulsaarError::Internal(format!("binding probe socket: {e}")))?;
        let local_port = probe
            .local_addr()
            .map_err(|e| PulsaarError::Internal(format!("reading probe socket address: {e}")))?
            .port();
        drop(probe);

        let listener = TcpListener::bind(("127.0.0.1", local_port))
            .await
            .map_err(|e| PulsaarError::Internal(format!("binding forwarding socket: {e}")))?;

        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pod_name = pod_name.to_string();
        let remote_port = AGENT_PORT as u16;

        let task = tokio::spawn(async move {
            loop {
                let (mut inbound, _) = match listener.accept().await {
                    Ok(pair) => pair,
                    Err(_) => break,
                };
                let mut forwarder = match pods.portforward(&pod_name, &[remote_port]).await {
                    Ok(forwarder) => forwarder,
                    Err(_) => continue,
                };
                let Some(mut upstream) = forwarder.take_stream(remote_port) else {
                    continue;
                };
                tokio::spawn(async move {
                    let _ = tokio::io::copy_bidirectional(&mut inbound, &mut upstream).await;
                });
            }
        });
        let abort = task.abort_handle();

        // Let the forwarding task's first accept loop iteration settle.
        tokio::time::sleep(SETTLE_INTERVAL).await;

        Ok(Transport {
            endpoint: format!("https://127.0.0.1:{local_port}"),
            path_prefix: None,
            _forward_guard: Some(PodForwardGuard { abort }),
        })
    }
}

/// The pod-proxy subresource path prefix (no host, no trailing slash) to
/// splice onto each RPC's path when dialing the agent through the
/// cluster API rather than directly.
fn api_proxy_path_prefix(namespace: &str, name: &str) -> String {
    format!("/api/v1/namespaces/{namespace}/pods/{name}/proxy")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_kind_parses_known_names() {
        assert_eq!(TransportKind::parse("pod-forward"), Ok(TransportKind::PodForward));
        assert_eq!(TransportKind::parse("api-proxy"), Ok(TransportKind::ApiProxy));
    }

    #[test]
    fn transport_kind_rejects_unknown_name() {
        assert!(TransportKind::parse("carrier-pigeon").is_err());
    }

    #[test]
    fn api_proxy_path_prefix_is_well_formed() {
        assert_eq!(
            api_proxy_path_prefix("default", "my-pod"),
            "/api/v1/namespaces/default/pods/my-pod/proxy"
        );
    }
}
