// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Wires the TLS Material Loader (D) into a tonic server hosting the
//! Agent RPC Server (E).

use std::net::SocketAddr;

use tonic::transport::{Certificate, Identity, Server, ServerTlsConfig};

use crate::domain::PulsaarError;
use crate::infrastructure::TlsMaterialLoader;
use crate::presentation::grpc::agent_service::AgentService;
use crate::proto::pulsaar_agent_server::PulsaarAgentServer;

/// The well-known agent port.
pub const AGENT_PORT: u16 = 50051;

/// Loads TLS material exactly once, then serves `service` until the
/// process is terminated or the listener fails.
pub async fn start_grpc_server(addr: SocketAddr, service: AgentService) -> Result<(), PulsaarError> {
    let identity = TlsMaterialLoader::server_identity()?;
    let tonic_identity = Identity::from_pem(identity.cert_pem, identity.key_pem);
    let mut tls_config = ServerTlsConfig::new().identity(tonic_identity);

    if let Some(ca_pem) = TlsMaterialLoader::client_ca_or_none()? {
        tracing::info!("client CA configured, requiring and verifying client certificates");
        tls_config = tls_config.client_ca_root(Certificate::from_pem(ca_pem));
    } else {
        tracing::warn!("no client CA configured, accepting any TLS client (mTLS disabled)");
    }

    Server::builder()
        .tls_config(tls_config)
        .map_err(|e| PulsaarError::Internal(format!("invalid TLS configuration: {e}")))?
        .add_service(PulsaarAgentServer::new(service))
        .serve(addr)
        .await
        .map_err(|e| PulsaarError::Internal(format!("grpc server error: {e}")))
}
