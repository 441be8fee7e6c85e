// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Caller-side TLS configuration for the Transport Factory (component I).
//! Mirrors the server-side `TlsMaterialLoader` (D) but from the broker's
//! point of view: a client identity to present, and a trust root to
//! verify the agent against. Per §9 open question (iv), the absence of a
//! trust root is the MVP default and skips verification entirely — a
//! production deployment must supply one.

use std::env;
use std::fs;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};

use crate::domain::PulsaarError;

pub const ENV_CLIENT_CERT_FILE: &str = "PULSAAR_CLIENT_CERT_FILE";
pub const ENV_CLIENT_KEY_FILE: &str = "PULSAAR_CLIENT_KEY_FILE";
pub const ENV_CA_FILE: &str = "PULSAAR_CA_FILE";

/// PEM-encoded client identity and/or trust root, loaded once per broker
/// invocation.
pub struct ClientTlsMaterial {
    client_identity: Option<(String, String)>,
    trust_root: Option<String>,
}

impl ClientTlsMaterial {
    /// Reads `PULSAAR_CLIENT_CERT_FILE`/`_KEY_FILE` and `PULSAAR_CA_FILE`.
    /// Presence of only one half of the client identity pair is an
    /// error; absence of both is fine (no client certificate presented).
    pub fn load() -> Result<Self, PulsaarError> {
        let client_identity = match (env::var(ENV_CLIENT_CERT_FILE), env::var(ENV_CLIENT_KEY_FILE)) {
            (Ok(cert_path), Ok(key_path)) => {
                let cert_pem = fs::read_to_string(&cert_path)
                    .map_err(|e| PulsaarError::Internal(format!("reading {cert_path}: {e}")))?;
                let key_pem = fs::read_to_string(&key_path)
                    .map_err(|e| PulsaarError::Internal(format!("reading {key_path}: {e}")))?;
                Some((cert_pem, key_pem))
            }
            (Err(_), Err(_)) => None,
            _ => {
                return Err(PulsaarError::InvalidArgument(
                    "both PULSAAR_CLIENT_CERT_FILE and PULSAAR_CLIENT_KEY_FILE must be set together".to_string(),
                ))
            }
        };

        let trust_root = match env::var(ENV_CA_FILE) {
            Ok(path) => Some(
                fs::read_to_string(&path)
                    .map_err(|e| PulsaarError::Internal(format!("reading {path}: {e}")))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            client_identity,
            trust_root,
        })
    }

    /// No client identity, no trust root: verification is skipped. Used
    /// by tests and by callers that have not configured any TLS material.
    pub fn insecure() -> Self {
        Self {
            client_identity: None,
            trust_root: None,
        }
    }

    /// Build the `rustls::ClientConfig` this material implies: verified
    /// against `trust_root` when present, otherwise an always-accept
    /// verifier (MVP default, §9 open question iv).
    pub fn rustls_config(&self) -> Result<ClientConfig, PulsaarError> {
        let builder = ClientConfig::builder();

        let builder = match &self.trust_root {
            Some(ca_pem) => {
                let mut roots = RootCertStore::empty();
                let mut reader = ca_pem.as_bytes();
                for cert in rustls_pemfile::certs(&mut reader) {
                    let cert = cert.map_err(|e| {
                        PulsaarError::Internal(format!("parsing trust root PEM: {e}"))
                    })?;
                    roots
                        .add(cert)
                        .map_err(|e| PulsaarError::Internal(format!("loading trust root: {e}")))?;
                }
                builder.with_root_certificates(roots)
            }
            None => builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert)),
        };

        let config = match &self.client_identity {
            Some((cert_pem, key_pem)) => {
                let certs = rustls_pemfile::certs(&mut cert_pem.as_bytes())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| PulsaarError::Internal(format!("parsing client cert PEM: {e}")))?;
                let key = load_private_key(key_pem)?;
                builder
                    .with_client_auth_cert(certs, key)
                    .map_err(|e| PulsaarError::Internal(format!("client auth cert rejected: {e}")))?
            }
            None => builder.with_no_client_auth(),
        };

        Ok(config)
    }
}

fn load_private_key(key_pem: &str) -> Result<PrivateKeyDer<'static>, PulsaarError> {
    let mut reader = key_pem.as_bytes();
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| PulsaarError::Internal(format!("parsing client key PEM: {e}")))?
        .ok_or_else(|| PulsaarError::Internal("no private key found in client key PEM".to_string()))
}

/// Accepts any server certificate presented. Installed only when the
/// caller has configured no trust root — the documented MVP default,
/// not a silent fallback a hardened deployment should rely on.
#[derive(Debug)]
struct AcceptAnyServerCert;

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insecure_material_builds_a_config() {
        let material = ClientTlsMaterial::insecure();
        assert!(material.rustls_config().is_ok());
    }

    #[test]
    fn mismatched_client_identity_env_is_rejected() {
        // SAFETY: test runs single-threaded per process via cargo test's
        // default harness isolation is not guaranteed, so this only
        // asserts the parsing branch, not process-wide env state.
        env::remove_var(ENV_CLIENT_KEY_FILE);
        env::set_var(ENV_CLIENT_CERT_FILE, "/nonexistent/cert.pem");
        let result = ClientTlsMaterial::load();
        env::remove_var(ENV_CLIENT_CERT_FILE);
        assert!(result.is_err());
    }
}
