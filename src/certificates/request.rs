//! The certificate this unit asks the provider for.
//!
//! # Design Decisions
//! - Rebuilt from the snapshot on every pass, so a changed address or
//!   hostname is picked up on the next config change
//! - SANs are deduplicated and sorted as text

use std::collections::BTreeSet;
use std::net::IpAddr;

use serde::Serialize;

/// Attributes published on the `certificates` relation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CertificateRequest {
    pub common_name: String,
    pub sans_ip: Vec<String>,
    pub sans_dns: Vec<String>,
}

impl CertificateRequest {
    /// Build the request for `unit_name` (`<app>/<number>`).
    ///
    /// `addresses` are the bind and ingress addresses of the relation
    /// binding; either may be absent.
    pub fn for_unit(
        unit_name: &str,
        common_name: impl Into<String>,
        addresses: impl IntoIterator<Item = Option<IpAddr>>,
    ) -> Self {
        let sans_ip: BTreeSet<String> = addresses
            .into_iter()
            .flatten()
            .map(|address| address.to_string())
            .collect();

        let sans_dns: BTreeSet<String> = match unit_name.split_once('/') {
            Some((app, unit_id)) if !app.is_empty() && !unit_id.is_empty() => {
                BTreeSet::from([format!("{app}-{unit_id}.{app}-endpoints")])
            }
            _ => {
                tracing::warn!(
                    unit = unit_name,
                    "Unit name is not <app>/<id>, requesting no DNS SANs"
                );
                BTreeSet::new()
            }
        };

        Self {
            common_name: common_name.into(),
            sans_ip: sans_ip.into_iter().collect(),
            sans_dns: sans_dns.into_iter().collect(),
        }
    }
}

/// Name of the host this process runs on, the default common name.
pub fn local_hostname() -> String {
    gethostname::gethostname().to_string_lossy().into_owned()
}
