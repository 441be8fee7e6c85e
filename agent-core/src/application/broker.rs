// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Access Broker (component J). Orchestrates Identity Gate (G) -> Agent
//! Attach (H) -> Transport Factory (I) -> the chosen RPC on the agent
//! (E). Never retries silently; every retry is caller-driven. On any
//! step's failure the broker surfaces a single actionable error; prior
//! resources (the transport, any forwarding task) are released in
//! reverse order simply by going out of scope.

use tonic::{Status, Streaming};

use crate::domain::PulsaarError;
use crate::infrastructure::cluster::{AgentAttacher, IdentityGate, Transport, TransportFactory};
use crate::infrastructure::ClientTlsMaterial;
use crate::proto;
use crate::proto::pulsaar_agent_client::PulsaarAgentClient;

use super::call_context::CallContext;
use super::grpc_channel;

/// Composes the four collaborating steps and the bearer token / agent
/// image the broker needs to drive them. One `Broker` serves one CLI
/// invocation's worth of calls; it holds no state across invocations.
pub struct Broker {
    identity_gate: IdentityGate,
    attacher: AgentAttacher,
    transport_factory: TransportFactory,
    client_tls: ClientTlsMaterial,
    bearer_token: String,
    agent_image: String,
}

impl Broker {
    pub fn new(
        client: kube::Client,
        api_host: impl Into<String>,
        bearer_token: impl Into<String>,
        agent_image: impl Into<String>,
        client_tls: ClientTlsMaterial,
    ) -> Self {
        Self {
            identity_gate: IdentityGate::new(client.clone()),
            attacher: AgentAttacher::new(client.clone()),
            transport_factory: TransportFactory::new(client, api_host),
            client_tls,
            bearer_token: bearer_token.into(),
            agent_image: agent_image.into(),
        }
    }

    /// Identity Gate -> Agent Attach -> Transport Factory -> connected
    /// channel. Shared by every RPC below.
    async fn connect(
        &self,
        ctx: &CallContext,
    ) -> Result<(PulsaarAgentClient<grpc_channel::AgentChannel>, Transport), PulsaarError> {
        self.identity_gate
            .authorize(&self.bearer_token, &ctx.workload.namespace, &ctx.workload.name)
            .await?;

        self.attacher
            .ensure_attached(&ctx.workload.namespace, &ctx.workload.name, &self.agent_image)
            .await?;

        let transport = self
            .transport_factory
            .establish(ctx.transport, &ctx.workload.namespace, &ctx.workload.name)
            .await?;

        let channel = grpc_channel::connect(
            &transport.endpoint,
            transport.path_prefix.as_deref(),
            &self.client_tls,
        )
        .await?;
        Ok((PulsaarAgentClient::new(channel), transport))
    }

    pub async fn list(&self, ctx: &CallContext) -> Result<Vec<proto::FileInfo>, PulsaarError> {
        let (mut client, _transport) = self.connect(ctx).await?;
        let response = client
            .list(proto::ListRequest {
                path: ctx.path.clone(),
                allowed_roots: vec![],
            })
            .await
            .map_err(status_to_error)?;
        Ok(response.into_inner().entries)
    }

    pub async fn stat(&self, ctx: &CallContext) -> Result<proto::FileInfo, PulsaarError> {
        let (mut client, _transport) = self.connect(ctx).await?;
        let response = client
            .stat(proto::StatRequest {
                path: ctx.path.clone(),
                allowed_roots: vec![],
            })
            .await
            .map_err(status_to_error)?;
        response
            .into_inner()
            .info
            .ok_or_else(|| PulsaarError::Internal("stat response carried no file info".to_string()))
    }

    pub async fn read(&self, ctx: &CallContext) -> Result<proto::ReadResponse, PulsaarError> {
        let (mut client, _transport) = self.connect(ctx).await?;
        let response = client
            .read(proto::ReadRequest {
                path: ctx.path.clone(),
                offset: ctx.offset.unwrap_or(0),
                length: ctx.length.unwrap_or(0),
                allowed_roots: vec![],
            })
            .await
            .map_err(status_to_error)?;
        Ok(response.into_inner())
    }

    /// Returns a live stream. The returned `ActiveStream` owns the
    /// transport (and any forwarding task) for as long as the caller
    /// holds it; dropping it before the terminal `eof` message cancels
    /// the RPC and releases the transport.
    pub async fn stream(&self, ctx: &CallContext) -> Result<ActiveStream, PulsaarError> {
        let (mut client, transport) = self.connect(ctx).await?;
        let response = client
            .stream(proto::StreamRequest {
                path: ctx.path.clone(),
                chunk_size: ctx.chunk_size.unwrap_or(0),
                allowed_roots: vec![],
            })
            .await
            .map_err(status_to_error)?;
        Ok(ActiveStream {
            inner: response.into_inner(),
            _transport: transport,
        })
    }

    pub async fn health(&self, ctx: &CallContext) -> Result<proto::HealthResponse, PulsaarError> {
        let (mut client, _transport) = self.connect(ctx).await?;
        let response = client
            .health(proto::HealthRequest {})
            .await
            .map_err(status_to_error)?;
        Ok(response.into_inner())
    }
}

/// A live Stream RPC plus the transport keeping it alive. Scoped: the
/// transport (and, for PodForward, the background forwarding task) is
/// released when this value is dropped, on any exit path.
pub struct ActiveStream {
    inner: Streaming<proto::ReadResponse>,
    _transport: Transport,
}

impl ActiveStream {
    /// Pulls the next chunk. Returns `Ok(None)` once the stream has
    /// closed after its terminal `eof=true` message.
    pub async fn next(&mut self) -> Result<Option<proto::ReadResponse>, PulsaarError> {
        self.inner.message().await.map_err(status_to_error)
    }
}

fn status_to_error(status: Status) -> PulsaarError {
    let message = status.message().to_string();
    match status.code() {
        tonic::Code::PermissionDenied => PulsaarError::PermissionDenied(message),
        tonic::Code::InvalidArgument => PulsaarError::InvalidArgument(message),
        tonic::Code::ResourceExhausted => PulsaarError::ResourceExhausted(message),
        tonic::Code::NotFound => PulsaarError::NotFound(message),
        tonic::Code::Unavailable => PulsaarError::Unavailable(message),
        tonic::Code::Unimplemented => PulsaarError::Unimplemented(message),
        _ => PulsaarError::Internal(message),
    }
}
