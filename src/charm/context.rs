//! Per-trigger input gathered from the relation data bus.

use std::path::Path;

use crate::certificates::request::local_hostname;
use crate::certificates::{CertificateAssignment, CertificateMaterial, CertificateRequest};
use crate::config::loader::{read_to_string, ConfigError};
use crate::config::schema::{CertificatesRelationConfig, EventSnapshot, RawConfig};
use crate::state::loki::discover_endpoints;

/// Everything a reconciliation pass reads besides the workload itself.
#[derive(Debug, Clone, Default)]
pub struct EventContext {
    pub options: RawConfig,
    /// Loki push URLs, `None` when `send-loki-logs` is not related.
    pub loki_endpoints: Option<Vec<String>>,
    pub certificates: CertificateAssignment,
    /// What this unit asks the certificate provider for.
    pub certificate_request: CertificateRequest,
    /// Whether the `http-endpoint` relation exists.
    pub http_endpoint: bool,
}

impl EventContext {
    /// Build the context from a snapshot, loading assigned certificate files.
    pub fn from_snapshot(snapshot: &EventSnapshot) -> Result<Self, ConfigError> {
        let relations = &snapshot.relations;

        let loki_endpoints = relations
            .send_loki_logs
            .as_ref()
            .map(|loki| discover_endpoints(&loki.units));

        let certificates = match &relations.certificates {
            None => CertificateAssignment::RelationAbsent,
            Some(relation) => load_assignment(relation)?,
        };

        let unit = &snapshot.unit;
        let certificate_request = CertificateRequest::for_unit(
            &unit.name,
            unit.fqdn.clone().unwrap_or_else(local_hostname),
            [unit.bind_address, unit.ingress_address],
        );

        Ok(Self {
            options: snapshot.options.clone(),
            loki_endpoints,
            certificates,
            certificate_request,
            http_endpoint: relations.http_endpoint.is_some(),
        })
    }

    /// Endpoints to resolve against; empty when Loki is not related.
    pub fn peer_endpoints(&self) -> &[String] {
        self.loki_endpoints.as_deref().unwrap_or_default()
    }
}

fn load_assignment(
    relation: &CertificatesRelationConfig,
) -> Result<CertificateAssignment, ConfigError> {
    let (Some(cert_path), Some(key_path)) =
        (&relation.certificate_file, &relation.private_key_file)
    else {
        tracing::info!("Certificate relation created, waiting for the provider to assign a pair");
        return Ok(CertificateAssignment::Pending);
    };

    let certificate = read_to_string(cert_path)?;
    let private_key = read_to_string(key_path)?;

    let material = CertificateMaterial::from_pem(certificate, private_key).map_err(|source| {
        let path: &Path = if source.concerns_private_key() {
            key_path
        } else {
            cert_path
        };
        ConfigError::Certificate {
            path: path.to_path_buf(),
            source,
        }
    })?;

    Ok(CertificateAssignment::Assigned(material))
}
