//! Falcosidekick workload rendering.
//!
//! # Responsibilities
//! - Render `falcosidekick.yaml` from a [`ResolvedConfig`]
//! - Render the service layer (command plus readiness check)
//! - Push either file only when its content changed

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::state::ResolvedConfig;
use crate::workload::storage::{StorageError, WorkloadStorage};

/// Name of the workload container and of its service.
pub const CONTAINER_NAME: &str = "falcosidekick";

pub const CONFIG_PATH: &str = "/etc/falcosidekick/falcosidekick.yaml";
pub const LAYER_PATH: &str = "/etc/falcosidekick/layer.yaml";

/// Plaintext path answered by Falcosidekick for liveness probes.
pub const HEALTH_CHECK_PATH: &str = "/ping";

const NO_TLS_PATHS: [&str; 2] = [HEALTH_CHECK_PATH, "/healthz"];
const READY_CHECK_NAME: &str = "falcosidekick-ready";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to render {file}: {source}")]
    Yaml {
        file: &'static str,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Serialize)]
struct SidekickConfig<'a> {
    listenaddress: &'a str,
    listenport: u16,
    debug: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tlsserver: Option<TlsServer<'a>>,
    loki: LokiOutput<'a>,
}

#[derive(Serialize)]
struct TlsServer<'a> {
    deploy: bool,
    certfile: &'a Path,
    keyfile: &'a Path,
    notlsport: u16,
    notlspaths: &'a [&'a str],
}

#[derive(Serialize)]
struct LokiOutput<'a> {
    hostport: &'a str,
    endpoint: &'a str,
}

#[derive(Serialize)]
struct Layer<'a> {
    summary: &'a str,
    description: &'a str,
    services: BTreeMap<&'a str, Service<'a>>,
    checks: BTreeMap<&'a str, Check>,
}

#[derive(Serialize)]
struct Service<'a> {
    #[serde(rename = "override")]
    override_: &'a str,
    summary: &'a str,
    command: String,
    startup: &'a str,
}

#[derive(Serialize)]
struct Check {
    #[serde(rename = "override")]
    override_: &'static str,
    level: &'static str,
    http: HttpCheck,
}

#[derive(Serialize)]
struct HttpCheck {
    url: String,
}

/// Renders and stores the Falcosidekick workload files.
#[derive(Debug, Clone, Copy, Default)]
pub struct Falcosidekick;

impl Falcosidekick {
    pub fn render_config(&self, state: &ResolvedConfig) -> Result<String, RenderError> {
        let tlsserver = state.tls().map(|tls| TlsServer {
            deploy: true,
            certfile: &tls.cert_path,
            keyfile: &tls.key_path,
            notlsport: state.tls_healthcheck_port(),
            notlspaths: &NO_TLS_PATHS,
        });

        let config = SidekickConfig {
            listenaddress: "",
            listenport: state.listen_port(),
            debug: false,
            tlsserver,
            loki: LokiOutput {
                hostport: state.loki_host_port(),
                endpoint: state.loki_endpoint(),
            },
        };

        serde_yaml::to_string(&config).map_err(|source| RenderError::Yaml {
            file: CONFIG_PATH,
            source,
        })
    }

    pub fn render_layer(&self, state: &ResolvedConfig) -> Result<String, RenderError> {
        let mut services = BTreeMap::new();
        services.insert(
            CONTAINER_NAME,
            Service {
                override_: "replace",
                summary: "Falcosidekick",
                command: format!("falcosidekick -c {CONFIG_PATH}"),
                startup: "enabled",
            },
        );

        let mut checks = BTreeMap::new();
        checks.insert(
            READY_CHECK_NAME,
            Check {
                override_: "replace",
                level: "ready",
                http: HttpCheck {
                    url: health_check_url("localhost", state),
                },
            },
        );

        let layer = Layer {
            summary: "Falcosidekick layer",
            description: "Service and readiness check for Falcosidekick",
            services,
            checks,
        };

        serde_yaml::to_string(&layer).map_err(|source| RenderError::Yaml {
            file: LAYER_PATH,
            source,
        })
    }

    /// Push the config and layer files. Returns whether either changed.
    pub fn configure<S>(&self, storage: &mut S, state: &ResolvedConfig) -> Result<bool, RenderError>
    where
        S: WorkloadStorage + ?Sized,
    {
        let config = self.render_config(state)?;
        let layer = self.render_layer(state)?;

        let config_changed = push_if_changed(storage, Path::new(CONFIG_PATH), config.as_bytes())?;
        let layer_changed = push_if_changed(storage, Path::new(LAYER_PATH), layer.as_bytes())?;

        Ok(config_changed || layer_changed)
    }
}

/// URL of the plaintext readiness endpoint on `host`.
pub fn health_check_url(host: &str, state: &ResolvedConfig) -> String {
    format!(
        "http://{host}:{}{HEALTH_CHECK_PATH}",
        state.tls_healthcheck_port()
    )
}

fn push_if_changed<S>(storage: &mut S, path: &Path, content: &[u8]) -> Result<bool, StorageError>
where
    S: WorkloadStorage + ?Sized,
{
    if storage.read_optional(path)?.as_deref() == Some(content) {
        tracing::debug!(path = %path.display(), "Workload file up to date");
        return Ok(false);
    }
    storage.push(path, content)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RawConfig;
    use crate::state::ConfigResolver;
    use crate::workload::memory::MemoryStorage;

    fn state(tls_ready: bool) -> ResolvedConfig {
        let endpoints = vec!["http://loki:3100/loki/api/v1/push".to_string()];
        ConfigResolver::resolve(&RawConfig::default(), &endpoints, tls_ready).unwrap()
    }

    #[test]
    fn test_plaintext_config_has_no_tlsserver() {
        let rendered = Falcosidekick.render_config(&state(false)).unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();

        assert_eq!(doc["listenport"], serde_yaml::Value::from(2801));
        assert_eq!(doc["loki"]["hostport"], serde_yaml::Value::from("http://loki:3100"));
        assert_eq!(doc["loki"]["endpoint"], serde_yaml::Value::from("/loki/api/v1/push"));
        assert!(doc.get("tlsserver").is_none());
    }

    #[test]
    fn test_tls_config_deploys_tlsserver() {
        let rendered = Falcosidekick.render_config(&state(true)).unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();

        let tls = &doc["tlsserver"];
        assert_eq!(tls["deploy"], serde_yaml::Value::from(true));
        assert_eq!(
            tls["certfile"],
            serde_yaml::Value::from("/etc/falcosidekick/certs/server/server.crt")
        );
        assert_eq!(
            tls["keyfile"],
            serde_yaml::Value::from("/etc/falcosidekick/certs/server/server.key")
        );
        assert_eq!(tls["notlsport"], serde_yaml::Value::from(2810));
    }

    #[test]
    fn test_layer_checks_healthcheck_port() {
        let rendered = Falcosidekick.render_layer(&state(true)).unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();

        assert_eq!(
            doc["checks"]["falcosidekick-ready"]["http"]["url"],
            serde_yaml::Value::from("http://localhost:2810/ping")
        );
        assert_eq!(
            doc["services"]["falcosidekick"]["command"],
            serde_yaml::Value::from("falcosidekick -c /etc/falcosidekick/falcosidekick.yaml")
        );
    }

    #[test]
    fn test_configure_only_writes_on_change() {
        let mut storage = MemoryStorage::new();

        assert!(Falcosidekick.configure(&mut storage, &state(false)).unwrap());
        assert_eq!(storage.write_count(), 2);

        storage.reset_write_count();
        assert!(!Falcosidekick.configure(&mut storage, &state(false)).unwrap());
        assert_eq!(storage.write_count(), 0);

        assert!(Falcosidekick.configure(&mut storage, &state(true)).unwrap());
        assert_eq!(storage.write_count(), 2);
    }
}
