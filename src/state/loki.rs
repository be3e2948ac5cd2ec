//! Loki push endpoint discovery.
//!
//! # Responsibilities
//! - Extract push URLs from `send-loki-logs` unit data
//! - Split the selected URL into the `hostport`/`endpoint` pair Falcosidekick expects

use serde::Deserialize;
use url::Url;

use crate::config::schema::LokiUnitData;

/// Push path used when no endpoint is known.
pub const DEFAULT_LOKI_ENDPOINT: &str = "/loki/api/v1/push";

#[derive(Debug, Deserialize)]
struct EndpointDocument {
    url: String,
}

/// Collect the push URLs published by Loki units, in unit order.
///
/// Units that have not published an endpoint yet, or published something that
/// is not `{"url": ...}`, are skipped.
pub fn discover_endpoints(units: &[LokiUnitData]) -> Vec<String> {
    units
        .iter()
        .filter_map(|unit| unit.endpoint.as_deref())
        .filter_map(|raw| match serde_json::from_str::<EndpointDocument>(raw) {
            Ok(doc) => Some(doc.url),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed Loki endpoint data");
                None
            }
        })
        .collect()
}

/// Where Falcosidekick should push logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LokiTarget {
    /// Path component, e.g. `/loki/api/v1/push`.
    pub endpoint: String,
    /// `scheme://host:port`, empty when no endpoint is known.
    pub host_port: String,
}

impl Default for LokiTarget {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_LOKI_ENDPOINT.to_string(),
            host_port: String::new(),
        }
    }
}

impl LokiTarget {
    /// Build the target from the first candidate. Later candidates are never
    /// consulted, even when the first one does not parse.
    pub fn from_candidates(candidates: &[String]) -> Self {
        let Some(first) = candidates.first() else {
            return Self::default();
        };

        let url = match Url::parse(first) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(
                    url = %first,
                    error = %e,
                    "Unparsable Loki endpoint, using defaults"
                );
                return Self::default();
            }
        };
        let Some(host) = url.host_str() else {
            tracing::warn!(url = %first, "Loki endpoint has no host, using defaults");
            return Self::default();
        };

        let host_port = match url.port_or_known_default() {
            Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
            None => format!("{}://{}", url.scheme(), host),
        };
        let endpoint = match url.path() {
            "" | "/" => DEFAULT_LOKI_ENDPOINT.to_string(),
            path => path.to_string(),
        };

        Self { endpoint, host_port }
    }
}
