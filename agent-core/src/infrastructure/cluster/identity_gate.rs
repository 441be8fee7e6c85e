// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Cluster Identity Gate (component G). Validates the caller's bearer
//! token against the cluster, then authorizes "read workload" for the
//! resolved identity. Both steps fail closed.

use k8s_openapi::api::authentication::v1::{TokenReview, TokenReviewSpec};
use k8s_openapi::api::authorization::v1::{
    ResourceAttributes, SubjectAccessReview, SubjectAccessReviewSpec,
};
use kube::api::{Api, PostParams};
use kube::Client;

use crate::domain::PulsaarError;

pub struct IdentityGate {
    client: Client,
}

impl IdentityGate {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// TokenReview then SubjectAccessReview for `get pods` on the target
    /// workload. Fails closed on either an unauthenticated token or a
    /// denied RBAC decision.
    pub async fn authorize(
        &self,
        bearer_token: &str,
        namespace: &str,
        name: &str,
    ) -> Result<(), PulsaarError> {
        let (username, groups) = self.review_token(bearer_token).await?;
        self.review_subject_access(&username, &groups, namespace, name)
            .await
    }

    async fn review_token(&self, bearer_token: &str) -> Result<(String, Vec<String>), PulsaarError> {
        let api: Api<TokenReview> = Api::all(self.client.clone());
        let review = TokenReview {
            spec: TokenReviewSpec {
                token: Some(bearer_token.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let result = api
            .create(&PostParams::default(), &review)
            .await
            .map_err(|e| PulsaarError::Unavailable(format!("TokenReview unreachable: {e}")))?;

        let status = result
            .status
            .ok_or_else(|| PulsaarError::Internal("TokenReview returned no status".to_string()))?;

        if !status.authenticated.unwrap_or(false) {
            return Err(PulsaarError::PermissionDenied(
                "bearer token did not authenticate".to_string(),
            ));
        }

        let user = status
            .user
            .ok_or_else(|| PulsaarError::Internal("TokenReview authenticated with no user info".to_string()))?;

        Ok((user.username.unwrap_or_default(), user.groups.unwrap_or_default()))
    }

    async fn review_subject_access(
        &self,
        username: &str,
        groups: &[String],
        namespace: &str,
        name: &str,
    ) -> Result<(), PulsaarError> {
        let api: Api<SubjectAccessReview> = Api::all(self.client.clone());
        let review = SubjectAccessReview {
            spec: SubjectAccessReviewSpec {
                user: Some(username.to_string()),
                groups: Some(groups.to_vec()),
                resource_attributes: Some(ResourceAttributes {
                    namespace: Some(namespace.to_string()),
                    verb: Some("get".to_string()),
                    resource: Some("pods".to_string()),
                    name: Some(name.to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        };

        let result = api
            .create(&PostParams::default(), &review)
            .await
            .map_err(|e| PulsaarError::Unavailable(format!("SubjectAccessReview unreachable: {e}")))?;

        let allowed = result.status.map(|s| s.allowed).unwrap_or(false);
        if !allowed {
            return Err(PulsaarError::PermissionDenied(format!(
                "user {username} is not authorized to get pod {namespace}/{name}"
            )));
        }
        Ok(())
    }
}
