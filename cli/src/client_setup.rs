// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Assembles the cluster client, bearer token, and TLS material the
//! Access Broker (J) needs, from `kube`'s ambient kubeconfig/in-cluster
//! discovery plus the broker's own environment variables.

use anyhow::{Context, Result};

use pulsaar_agent_core::infrastructure::ClientTlsMaterial;

const IN_CLUSTER_TOKEN_FILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Builds a cluster client using the same discovery `kubectl` uses
/// (`KUBECONFIG`, then `~/.kube/config`, then in-cluster config).
pub async fn build_cluster_client() -> Result<kube::Client> {
    kube::Client::try_default()
        .await
        .context("connecting to the cluster API (checked KUBECONFIG and in-cluster config)")
}

/// The cluster API's base URL, used to build the `ApiProxy` transport's
/// proxy URL (§4.I).
pub fn api_host(client: &kube::Client) -> String {
    client.cluster_url().to_string()
}

/// Resolves the caller's bearer token: an explicit `--token`/
/// `PULSAAR_BEARER_TOKEN` wins; otherwise the ambient in-cluster
/// service-account token when running inside a cluster. Client
/// certificate auth is not a substitute — the Identity Gate (G) always
/// authorizes via `TokenReview`.
pub fn resolve_bearer_token(explicit: Option<String>) -> Result<String> {
    if let Some(token) = explicit {
        return Ok(token);
    }
    std::fs::read_to_string(IN_CLUSTER_TOKEN_FILE)
        .map(|s| s.trim().to_string())
        .context(
            "no bearer token available: pass --token (or set PULSAAR_BEARER_TOKEN), \
             or run from inside a cluster with an in-cluster service-account token",
        )
}

/// Loads the broker's client TLS material from `PULSAAR_CLIENT_CERT_FILE`
/// / `_KEY_FILE` / `PULSAAR_CA_FILE`.
pub fn load_client_tls() -> Result<ClientTlsMaterial> {
    ClientTlsMaterial::load().map_err(anyhow::Error::from)
}
