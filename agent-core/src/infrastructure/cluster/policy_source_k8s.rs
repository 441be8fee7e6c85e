// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Cluster-backed candidates for Policy Source (component F): the
//! workload's own annotation and the namespace config object. A
//! cluster-API failure here is "absent", not fatal — resolution simply
//! falls through to the next source.

use std::fs;

use k8s_openapi::api::core::v1::{ConfigMap, Pod};
use kube::api::Api;
use kube::Client;

use crate::domain::policy_source::{self, EffectivePolicy};

pub const ANNOTATION_KEY: &str = "pulsaar.io/allowed-roots";
pub const CONFIG_OBJECT_NAME: &str = "pulsaar-config";
pub const CONFIG_OBJECT_KEY: &str = "allowed-roots";

pub const ENV_ALLOWED_ROOTS: &str = "PULSAAR_ALLOWED_ROOTS";
pub const ENV_NAMESPACE: &str = "PULSAAR_NAMESPACE";
pub const ENV_POD_NAME: &str = "PULSAAR_POD_NAME";

const IN_CLUSTER_NAMESPACE_FILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

pub struct PolicySourceResolver {
    client: Client,
}

impl PolicySourceResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn workload_annotation(&self, namespace: &str, pod_name: &str) -> Option<String> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pod = api.get(pod_name).await.ok()?;
        pod.metadata.annotations?.get(ANNOTATION_KEY).cloned()
    }

    async fn namespace_config_object(&self, namespace: &str) -> Option<String> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        let config_map = api.get(CONFIG_OBJECT_NAME).await.ok()?;
        config_map.data?.get(CONFIG_OBJECT_KEY).cloned()
    }

    /// Resolve the effective policy for `namespace/pod_name`, consulting
    /// the annotation, the namespace config object, and the environment
    /// in that order.
    pub async fn resolve(&self, namespace: &str, pod_name: &str) -> EffectivePolicy {
        let annotation = self.workload_annotation(namespace, pod_name).await;
        let config_object = self.namespace_config_object(namespace).await;
        let env = env_allowed_roots();
        policy_source::resolve([annotation, config_object, env])
    }
}

pub fn env_allowed_roots() -> Option<String> {
    std::env::var(ENV_ALLOWED_ROOTS).ok()
}

/// The agent's own namespace, for looking up its own policy sources.
/// Prefers `PULSAAR_NAMESPACE`, then the in-cluster service-account
/// namespace file, then "default".
pub fn self_namespace() -> String {
    std::env::var(ENV_NAMESPACE)
        .ok()
        .or_else(|| fs::read_to_string(IN_CLUSTER_NAMESPACE_FILE).ok().map(|s| s.trim().to_string()))
        .unwrap_or_else(|| "default".to_string())
}

/// The agent's own pod name, read from `PULSAAR_POD_NAME`.
pub fn self_pod_name() -> Option<String> {
    std::env::var(ENV_POD_NAME).ok()
}
