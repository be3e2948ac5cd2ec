//! Runtime configuration resolution.

use std::path::PathBuf;

use serde::Serialize;

use crate::certificates::{CERTIFICATE_PATH, PRIVATE_KEY_PATH};
use crate::config::schema::RawConfig;
use crate::config::validation::{validate_options, ValidationFailure};
use crate::state::loki::LokiTarget;

/// Plaintext port kept open for health checks while the main port speaks TLS.
pub const TLS_HEALTHCHECK_PORT: u16 = 2810;

/// Where the workload finds its server certificate and key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TlsPaths {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl Default for TlsPaths {
    fn default() -> Self {
        Self {
            cert_path: PathBuf::from(CERTIFICATE_PATH),
            key_path: PathBuf::from(PRIVATE_KEY_PATH),
        }
    }
}

/// Validated configuration for one reconciliation pass.
///
/// Only [`ConfigResolver::resolve`] builds one, and nothing mutates it
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    listen_port: u16,
    loki_endpoint: String,
    loki_host_port: String,
    tls: Option<TlsPaths>,
    tls_healthcheck_port: u16,
}

impl ResolvedConfig {
    pub fn listen_port(&self) -> u16 {
        self.listen_port
    }

    pub fn loki_endpoint(&self) -> &str {
        &self.loki_endpoint
    }

    pub fn loki_host_port(&self) -> &str {
        &self.loki_host_port
    }

    /// Certificate and key paths, present together or not at all.
    pub fn tls(&self) -> Option<&TlsPaths> {
        self.tls.as_ref()
    }

    pub fn tls_healthcheck_port(&self) -> u16 {
        self.tls_healthcheck_port
    }
}

/// Derives a [`ResolvedConfig`] from raw inputs. Pure.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigResolver;

impl ConfigResolver {
    pub fn resolve(
        raw: &RawConfig,
        peer_endpoints: &[String],
        tls_ready: bool,
    ) -> Result<ResolvedConfig, ValidationFailure> {
        let options = validate_options(raw)?;
        let loki = LokiTarget::from_candidates(peer_endpoints);

        let (tls, tls_healthcheck_port) = if tls_ready {
            (Some(TlsPaths::default()), TLS_HEALTHCHECK_PORT)
        } else {
            (None, options.port)
        };

        Ok(ResolvedConfig {
            listen_port: options.port,
            loki_endpoint: loki.endpoint,
            loki_host_port: loki.host_port,
            tls,
            tls_healthcheck_port,
        })
    }
}
