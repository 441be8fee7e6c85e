// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Audit Emitter (component C): always writes a structured log line
//! synchronously; best-effort POSTs the same record to an aggregator
//! when one is configured. Aggregator unavailability never fails the
//! RPC that triggered the record.

use std::env;
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::audit::{AuditRecord, OperationKind};

pub const ENV_AUDIT_AGGREGATOR_URL: &str = "PULSAAR_AUDIT_AGGREGATOR_URL";

const AGGREGATOR_TIMEOUT: Duration = Duration::from_secs(3);

pub struct AuditEmitter {
    agent_id: String,
    aggregator_url: Option<String>,
    http: reqwest::Client,
}

impl AuditEmitter {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            aggregator_url: env::var(ENV_AUDIT_AGGREGATOR_URL).ok(),
            http: reqwest::Client::new(),
        }
    }

    /// Synchronously logs one structured line, then (if an aggregator is
    /// configured) spawns a fire-and-forget POST. Must be called before
    /// any filesystem syscall for the same request.
    pub fn record(&self, kind: OperationKind, path: &str) {
        let record = AuditRecord::new(kind, path, self.agent_id.clone());

        info!(
            timestamp = %record.timestamp.to_rfc3339(),
            operation = %record.operation,
            path = %record.path,
            agent_id = %record.agent_id,
            "audit"
        );

        if let Some(url) = self.aggregator_url.clone() {
            let http = self.http.clone();
            tokio::spawn(async move {
                let result = http
                    .post(&url)
                    .timeout(AGGREGATOR_TIMEOUT)
                    .json(&record)
                    .send()
                    .await;
                if let Err(err) = result {
                    warn!(error = %err, url, "audit aggregator delivery failed, swallowed");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn record_without_aggregator_does_not_panic() {
        let emitter = AuditEmitter {
            agent_id: "test-agent".to_string(),
            aggregator_url: None,
            http: reqwest::Client::new(),
        };
        emitter.record(OperationKind::Read, "/tmp/x");
    }

    #[tokio::test]
    async fn aggregator_failure_is_swallowed() {
        let emitter = AuditEmitter {
            agent_id: "test-agent".to_string(),
            aggregator_url: Some("http://127.0.0.1:1".to_string()),
            http: reqwest::Client::new(),
        };
        emitter.record(OperationKind::List, "/tmp");
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn record_posts_expected_json_body_to_aggregator() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "operation": "READ",
                "path": "/tmp/secret",
                "agent_id": "test-agent",
            })))
            .with_status(200)
            .create_async()
            .await;

        let emitter = AuditEmitter {
            agent_id: "test-agent".to_string(),
            aggregator_url: Some(server.url()),
            http: reqwest::Client::new(),
        };
        emitter.record(OperationKind::Read, "/tmp/secret");
        tokio::time::sleep(Duration::from_millis(100)).await;

        mock.assert_async().await;
    }
}
