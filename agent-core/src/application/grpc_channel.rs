// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Dials a TLS-secured `tonic::transport::Channel` to whatever endpoint
//! the Transport Factory (I) produced. A custom `tower::Service<Uri>`
//! connector is used rather than `tonic`'s built-in `ClientTlsConfig` so
//! the "no trust root configured" MVP default (§9 open question iv) can
//! skip certificate verification entirely, which `tonic` does not expose
//! directly.
//!
//! The generated `PulsaarAgentClient` always issues each RPC against its
//! literal absolute method path (e.g. `/pulsaar.v1.PulsaarAgent/List`),
//! ignoring any path segment on the `Channel`'s own `Endpoint` URI. For
//! the `ApiProxy` transport the agent only answers behind the cluster
//! API's pod-proxy subresource path, so that prefix has to be spliced
//! onto every outgoing request's path at the connection layer instead —
//! `AgentChannel` wraps the dialed `Channel` and does exactly that.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use http::uri::PathAndQuery;
use http::Uri;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio_rustls::{client::TlsStream, TlsConnector};
use tonic::body::Body;
use tonic::transport::{Channel, Endpoint};
use tower::Service;

use crate::domain::PulsaarError;
use crate::infrastructure::ClientTlsMaterial;

#[derive(Clone)]
struct RustlsConnector {
    tls: Arc<rustls::ClientConfig>,
}

impl Service<Uri> for RustlsConnector {
    type Response = TokioIo<TlsStream<TcpStream>>;
    type Error = std::io::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, uri: Uri) -> Self::Future {
        let tls = self.tls.clone();
        Box::pin(async move {
            let host = uri.host().unwrap_or("localhost").to_string();
            let port = uri.port_u16().unwrap_or(443);
            let tcp = TcpStream::connect((host.as_str(), port)).await?;
            tcp.set_nodelay(true).ok();

            let server_name = rustls::pki_types::ServerName::try_from(host)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?
                .to_owned();
            let connector = TlsConnector::from(tls);
            let stream = connector.connect(server_name, tcp).await?;
            Ok(TokioIo::new(stream))
        })
    }
}

/// Wraps a dialed `Channel`, prefixing every outgoing request's path with
/// `proxy_prefix` before handing it to the inner channel. A no-op pass
/// through when `proxy_prefix` is `None` (the `PodForward` case, which
/// dials the agent directly).
#[derive(Clone)]
pub struct AgentChannel {
    inner: Channel,
    proxy_prefix: Option<Arc<str>>,
}

impl Service<http::Request<Body>> for AgentChannel {
    type Response = http::Response<Body>;
    type Error = Box<dyn std::error::Error + Send + Sync>;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Service::<http::Request<Body>>::poll_ready(&mut self.inner, cx).map_err(Into::into)
    }

    fn call(&mut self, mut req: http::Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();
        let proxy_prefix = self.proxy_prefix.clone();
        Box::pin(async move {
            if let Some(prefix) = proxy_prefix {
                let method_path = req.uri().path_and_query().cloned().unwrap_or_else(|| {
                    PathAndQuery::from_static("/")
                });
                let rewritten = format!("{prefix}{method_path}");
                let path_and_query = PathAndQuery::try_from(rewritten)
                    .map_err(|e| -> Self::Error { Box::new(e) })?;
                let mut parts = req.uri().clone().into_parts();
                parts.path_and_query = Some(path_and_query);
                *req.uri_mut() = Uri::from_parts(parts).map_err(|e| -> Self::Error { Box::new(e) })?;
            }
            inner.call(req).await.map_err(Into::into)
        })
    }
}

/// Dials `endpoint_url` (e.g. `https://127.0.0.1:50123` for PodForward, or
/// the cluster-API host for ApiProxy) and returns a channel ready for the
/// generated `PulsaarAgentClient`. `proxy_prefix`, when set, is spliced
/// onto every RPC's path so it routes through the cluster API's pod-proxy
/// subresource instead of a bare gRPC method path on the API host.
pub async fn connect(
    endpoint_url: &str,
    proxy_prefix: Option<&str>,
    tls: &ClientTlsMaterial,
) -> Result<AgentChannel, PulsaarError> {
    let config = tls.rustls_config()?;
    let endpoint = Endpoint::from_shared(endpoint_url.to_string())
        .map_err(|e| PulsaarError::InvalidArgument(format!("invalid transport endpoint: {e}")))?;

    let connector = RustlsConnector {
        tls: Arc::new(config),
    };

    let inner = endpoint
        .connect_with_connector(connector)
        .await
        .map_err(|e| PulsaarError::Unavailable(format!("failed to connect to agent: {e}")))?;

    Ok(AgentChannel {
        inner,
        proxy_prefix: proxy_prefix.map(Arc::from),
    })
}
