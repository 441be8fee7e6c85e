// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent Attach (component H). Idempotently materializes a `pulsaar-agent`
//! ephemeral container in a workload that lacks one, then waits for it to
//! report running.

use std::time::Duration;

use k8s_openapi::api::core::v1::{ContainerPort, EphemeralContainer, EphemeralContainerCommon, Pod};
use kube::api::{Api, PostParams};
use kube::Client;

use crate::domain::PulsaarError;

pub const AGENT_CONTAINER_NAME: &str = "pulsaar-agent";
pub const AGENT_PORT: i32 = 50051;

const READINESS_POLL_INTERVAL: Duration = Duration::from_secs(1);
const READINESS_TIMEOUT: Duration = Duration::from_secs(30);

pub struct AgentAttacher {
    client: Client,
}

impl AgentAttacher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Ensures `pulsaar-agent` is present (as a regular or ephemeral
    /// container) in `namespace/name`, patching it in and waiting for
    /// readiness if it is absent. Re-entrance is a fast no-op.
    pub async fn ensure_attached(
        &self,
        namespace: &str,
        name: &str,
        agent_image: &str,
    ) -> Result<(), PulsaarError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pod = api
            .get(name)
            .await
            .map_err(|e| Self::map_get_error(name, e))?;

        if Self::already_present(&pod) {
            return Ok(());
        }

        self.patch_ephemeral_container(&api, &pod, agent_image)
            .await?;
        self.await_readiness(&api, name).await
    }

    fn already_present(pod: &Pod) -> bool {
        let spec_has = pod
            .spec
            .as_ref()
            .map(|s| s.containers.iter().any(|c| c.name == AGENT_CONTAINER_NAME))
            .unwrap_or(false);
        let ephemeral_has = pod
            .spec
            .as_ref()
            .and_then(|s| s.ephemeral_containers.as_ref())
            .map(|cs| cs.iter().any(|c| c.name == AGENT_CONTAINER_NAME))
            .unwrap_or(false);
        spec_has || ephemeral_has
    }

    async fn patch_ephemeral_container(
        &self,
        api: &Api<Pod>,
        pod: &Pod,
        agent_image: &str,
    ) -> Result<(), PulsaarError> {
        let mut updated = pod.clone();
        let spec = updated
            .spec
            .as_mut()
            .ok_or_else(|| PulsaarError::Internal("pod has no spec".to_string()))?;

        let mut ephemeral_containers = spec.ephemeral_containers.clone().unwrap_or_default();
        ephemeral_containers.push(EphemeralContainer {
            common: EphemeralContainerCommon {
                name: AGENT_CONTAINER_NAME.to_string(),
                image: Some(agent_image.to_string()),
                ports: Some(vec![ContainerPort {
                    name: Some("grpc".to_string()),
                    container_port: AGENT_PORT,
                    ..Default::default()
                }]),
                ..Default::default()
            },
            ..Default::default()
        });
        spec.ephemeral_containers = Some(ephemeral_containers);

        let body = serde_json::to_vec(&updated)
            .map_err(|e| PulsaarError::Internal(format!("serializing pod patch: {e}")))?;

        api.replace_subresource("ephemeralcontainers", &updated.metadata.name.clone().unwrap_or_default(), &PostParams::default(), body)
            .await
            .map_err(|e| PulsaarError::PermissionDenied(format!("ephemeral-containers patch rejected: {e}")))?;
        Ok(())
    }

    async fn await_readiness(&self, api: &Api<Pod>, name: &str) -> Result<(), PulsaarError> {
        let deadline = tokio::time::Instant::now() + READINESS_TIMEOUT;
        loop {
            let pod = api
                .get(name)
                .await
                .map_err(|e| Self::map_get_error(name, e))?;

            let running = pod
                .status
                .as_ref()
                .and_then(|s| s.ephemeral_container_statuses.as_ref())
                .and_then(|statuses| statuses.iter().find(|s| s.name == AGENT_CONTAINER_NAME))
                .and_then(|s| s.state.as_ref())
                .map(|state| state.running.is_some())
                .unwrap_or(false);

            if running {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(PulsaarError::Unavailable(format!(
                    "{AGENT_CONTAINER_NAME} did not become ready within {}s",
                    READINESS_TIMEOUT.as_secs()
                )));
            }
            tokio::time::sleep(READINESS_POLL_INTERVAL).await;
        }
    }

    fn map_get_error(name: &str, err: kube::Error) -> PulsaarError {
        match err {
            kube::Error::Api(ref api_err) if api_err.code == 404 => {
                PulsaarError::NotFound(format!("workload {name} not found"))
            }
            kube::Error::Api(ref api_err) if api_err.code == 403 => {
                PulsaarError::PermissionDenied(format!("insufficient permissions for {name}: {api_err}"))
            }
            other => PulsaarError::Unavailable(format!("cluster API error: {other}")),
        }
    }
}
