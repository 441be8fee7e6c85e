// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! TLS Material Loader (component D). Invoked exactly once per agent
//! lifetime. Loads a caller-provided identity from the environment, or
//! falls back to an in-memory self-signed certificate.

use std::env;
use std::fs;

use rand::rngs::OsRng;
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, SanType};
use rsa::pkcs8::EncodePrivateKey;
use rsa::RsaPrivateKey;

use crate::domain::PulsaarError;

const RSA_KEY_BITS: usize = 2048;
const CERT_VALIDITY_DAYS: i64 = 365;

pub const ENV_TLS_CERT_FILE: &str = "PULSAAR_TLS_CERT_FILE";
pub const ENV_TLS_KEY_FILE: &str = "PULSAAR_TLS_KEY_FILE";
pub const ENV_TLS_CA_FILE: &str = "PULSAAR_TLS_CA_FILE";

/// PEM-encoded certificate and private key pair.
#[derive(Clone)]
pub struct TlsIdentity {
    pub cert_pem: String,
    pub key_pem: String,
}

/// Load or self-generate the agent's server identity, and load the
/// optional client trust root that enables mTLS.
pub struct TlsMaterialLoader;

impl TlsMaterialLoader {
    /// Load a caller-provided cert+key pair, or self-generate one.
    pub fn server_identity() -> Result<TlsIdentity, PulsaarError> {
        match (env::var(ENV_TLS_CERT_FILE), env::var(ENV_TLS_KEY_FILE)) {
            (Ok(cert_path), Ok(key_path)) => {
                let cert_pem = fs::read_to_string(&cert_path).map_err(|e| {
                    PulsaarError::Internal(format!("reading {cert_path}: {e}"))
                })?;
                let key_pem = fs::read_to_string(&key_path).map_err(|e| {
                    PulsaarError::Internal(format!("reading {key_path}: {e}"))
                })?;
                Ok(TlsIdentity { cert_pem, key_pem })
            }
            _ => Self::self_signed(),
        }
    }

    /// A missing ca-file means mTLS is disabled: the server accepts any
    /// TLS client. A present one means client certificates are required
    /// and verified against it.
    pub fn client_ca_or_none() -> Result<Option<String>, PulsaarError> {
        match env::var(ENV_TLS_CA_FILE) {
            Ok(path) => {
                let pem = fs::read_to_string(&path)
                    .map_err(|e| PulsaarError::Internal(format!("reading {path}: {e}")))?;
                Ok(Some(pem))
            }
            Err(_) => Ok(None),
        }
    }

    fn self_signed() -> Result<TlsIdentity, PulsaarError> {
        let private_key = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
            .map_err(|e| PulsaarError::Internal(format!("generating RSA key: {e}")))?;
        let pkcs8_der = private_key
            .to_pkcs8_der()
            .map_err(|e| PulsaarError::Internal(format!("encoding RSA key: {e}")))?;
        let key_pair = KeyPair::from_pkcs8_der(pkcs8_der.as_bytes())
            .map_err(|e| PulsaarError::Internal(format!("loading RSA key into rcgen: {e}")))?;

        let mut params = CertificateParams::new(Vec::<String>::new())
            .map_err(|e| PulsaarError::Internal(format!("certificate params: {e}")))?;
        let mut dn = DistinguishedName::new();
        dn.push(DnType::OrganizationName, "Pulsaar");
        params.distinguished_name = dn;
        params.not_after = time::OffsetDateTime::now_utc() + time::Duration::days(CERT_VALIDITY_DAYS);
        params.subject_alt_names = vec![
            SanType::DnsName("localhost".try_into().map_err(|_| {
                PulsaarError::Internal("invalid SAN dns name".to_string())
            })?),
            SanType::IpAddress("127.0.0.1".parse().expect("valid loopback address")),
        ];

        let cert = params
            .self_signed(&key_pair)
            .map_err(|e| PulsaarError::Internal(format!("self-signing certificate: {e}")))?;

        Ok(TlsIdentity {
            cert_pem: cert.pem(),
            key_pem: key_pair.serialize_pem(),
        })
    }
}
