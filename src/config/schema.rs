//! Event snapshot schema definitions.
//!
//! An event snapshot describes everything the host framework would hand the
//! operator for one trigger: charm options, relation data, and where the
//! workload filesystem lives. All types derive Serde traits for
//! deserialization from TOML.

use std::net::IpAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Untyped charm options as supplied by the operator.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RawConfig(toml::Table);

impl RawConfig {
    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.0.get(key)
    }

    /// Builder-style setter, mostly handy in tests.
    pub fn with(mut self, key: &str, value: toml::Value) -> Self {
        self.0.insert(key.to_string(), value);
        self
    }
}

/// Root of an event snapshot file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EventSnapshot {
    /// Charm options (`port`).
    pub options: RawConfig,

    /// Identity and network binding of this unit.
    pub unit: UnitConfig,

    /// Relation data, keyed by endpoint.
    pub relations: RelationsConfig,

    /// Workload filesystem and probe settings.
    pub workload: WorkloadConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// This unit's name and the addresses of its `certificates` binding.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UnitConfig {
    /// Unit name in the form `<app>/<number>`.
    pub name: String,

    /// Common name to request. Defaults to the local host name.
    pub fqdn: Option<String>,

    pub bind_address: Option<IpAddr>,
    pub ingress_address: Option<IpAddr>,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            name: "falcosidekick/0".to_string(),
            fqdn: None,
            bind_address: None,
            ingress_address: None,
        }
    }
}

/// Relations the operator knows about. A missing table means the relation
/// has not been created.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelationsConfig {
    pub send_loki_logs: Option<LokiRelationConfig>,
    pub certificates: Option<CertificatesRelationConfig>,
    pub http_endpoint: Option<HttpEndpointRelationConfig>,
}

/// Remote unit data of the `send-loki-logs` relation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LokiRelationConfig {
    pub units: Vec<LokiUnitData>,
}

/// Data bag published by one Loki unit.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LokiUnitData {
    /// JSON document of the form `{"url": "..."}`.
    pub endpoint: Option<String>,
}

/// Certificate assigned over the `certificates` relation.
///
/// Both files must be set for the assignment to count; until then the
/// provider is still processing the request.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CertificatesRelationConfig {
    pub certificate_file: Option<PathBuf>,
    pub private_key_file: Option<PathBuf>,
}

/// The `http-endpoint` relation carries no inbound data.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct HttpEndpointRelationConfig {}

/// Workload settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Host directory standing in for the container root filesystem.
    pub root: PathBuf,

    /// Host used to reach the workload for health probes.
    pub probe_host: String,

    /// Health probe timeout in seconds.
    pub probe_timeout_secs: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/var/lib/falcosidekick-operator/workload"),
            probe_host: "127.0.0.1".to_string(),
            probe_timeout_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
