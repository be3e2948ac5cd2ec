//! Reconciliation of the Falcosidekick workload.
//!
//! # Responsibilities
//! - Sequence one reconciliation pass per trigger
//! - Map outcomes to a unit status
//! - Decide whether the workload must restart
//! - Describe what to publish on the `http-endpoint` and `certificates` relations

use serde::Serialize;
use thiserror::Error;

use crate::certificates::{
    CertificateAssignment, CertificateReconciler, CertificateRequest, Reconciliation,
};
use crate::charm::context::EventContext;
use crate::charm::status::UnitStatus;
use crate::config::validation::ValidationFailure;
use crate::state::{ConfigResolver, ResolvedConfig};
use crate::workload::falcosidekick::{Falcosidekick, RenderError, CONTAINER_NAME};
use crate::workload::storage::{StorageError, WorkloadStorage};

/// Relation endpoints the workload cannot run without, in check order.
pub const REQUIRED_RELATIONS: [&str; 2] = ["send-loki-logs", "certificates"];

/// Lifecycle triggers that start a reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Trigger {
    Install,
    ConfigChanged,
    PebbleReady,
    RelationChanged,
}

#[derive(Debug, Error)]
pub enum OperatorError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Render(RenderError),
}

impl OperatorError {
    /// Transient failures should be retried on the next trigger.
    pub fn is_transient(&self) -> bool {
        match self {
            OperatorError::Storage(e) => e.is_transient(),
            OperatorError::Render(_) => false,
        }
    }
}

impl From<RenderError> for OperatorError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Storage(e) => OperatorError::Storage(e),
            other => OperatorError::Render(other),
        }
    }
}

/// Data published to consumers of the `http-endpoint` relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointAdvert {
    pub path: String,
    pub scheme: &'static str,
    pub listen_port: u16,
    pub set_ports: bool,
}

/// What a reconciliation pass did.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub trigger: Trigger,
    pub status: UnitStatus,
    pub state: Option<ResolvedConfig>,
    pub certificates: Option<Reconciliation>,
    pub restart_required: bool,
    pub http_endpoint: Option<EndpointAdvert>,
    /// Set whenever the `certificates` relation exists, whatever the status.
    pub certificate_request: Option<CertificateRequest>,
}

impl ReconcileReport {
    fn stopped(
        trigger: Trigger,
        status: UnitStatus,
        certificate_request: Option<CertificateRequest>,
    ) -> Self {
        Self {
            trigger,
            status,
            state: None,
            certificates: None,
            restart_required: false,
            http_endpoint: None,
            certificate_request,
        }
    }
}

/// An operator that derives its state fresh on every trigger.
pub trait StatefulOperator {
    /// Resolve the configuration the workload should run with.
    fn current_state(&self, context: &EventContext) -> Result<ResolvedConfig, ValidationFailure>;

    /// Drive the workload towards the current state.
    fn reconcile(
        &mut self,
        trigger: Trigger,
        context: &EventContext,
    ) -> Result<ReconcileReport, OperatorError>;
}

/// Operator for the Falcosidekick workload.
pub struct FalcosidekickOperator<S> {
    storage: S,
    certificates: CertificateReconciler,
    workload: Falcosidekick,
}

impl<S: WorkloadStorage> FalcosidekickOperator<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            certificates: CertificateReconciler::default(),
            workload: Falcosidekick,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}

impl<S: WorkloadStorage> StatefulOperator for FalcosidekickOperator<S> {
    fn current_state(&self, context: &EventContext) -> Result<ResolvedConfig, ValidationFailure> {
        let tls_ready = context.certificates.material().is_some();
        ConfigResolver::resolve(&context.options, context.peer_endpoints(), tls_ready)
    }

    fn reconcile(
        &mut self,
        trigger: Trigger,
        context: &EventContext,
    ) -> Result<ReconcileReport, OperatorError> {
        let certificate_request = context
            .certificates
            .relation_created()
            .then(|| context.certificate_request.clone());

        if trigger == Trigger::Install {
            return Ok(ReconcileReport::stopped(
                trigger,
                UnitStatus::Maintenance("Installing containers".into()),
                certificate_request,
            ));
        }

        if !self.storage.can_connect() {
            tracing::warn!(container = CONTAINER_NAME, "Pebble is not ready");
            return Ok(ReconcileReport::stopped(
                trigger,
                UnitStatus::Waiting("Workload not ready".into()),
                certificate_request,
            ));
        }

        tracing::info!(container = CONTAINER_NAME, ?trigger, "Configuring workload");
        let state = match self.current_state(context) {
            Ok(state) => state,
            Err(e) => {
                tracing::error!("{}", e);
                return Ok(ReconcileReport::stopped(
                    trigger,
                    UnitStatus::Blocked(e.to_string()),
                    certificate_request,
                ));
            }
        };

        if let Some(missing) = missing_relation(context) {
            tracing::warn!(relation = missing, "Required relation missing");
            return Ok(ReconcileReport::stopped(
                trigger,
                UnitStatus::Blocked(format!("Required relations: [{missing}]")),
                certificate_request,
            ));
        }

        let certificates = self
            .certificates
            .reconcile(&mut self.storage, &context.certificates)?;
        let workload_changed = self.workload.configure(&mut self.storage, &state)?;
        let restart_required = certificates.is_changed() || workload_changed;
        if restart_required {
            tracing::info!(
                container = CONTAINER_NAME,
                certificates = ?certificates,
                workload_changed,
                "Workload restart required"
            );
        }

        let http_endpoint = context.http_endpoint.then(|| EndpointAdvert {
            path: "/".to_string(),
            scheme: if state.tls().is_some() { "https" } else { "http" },
            listen_port: state.listen_port(),
            set_ports: true,
        });

        let status = match context.certificates {
            CertificateAssignment::Pending => {
                UnitStatus::Waiting("Waiting for TLS certificate".into())
            }
            _ => UnitStatus::Active,
        };

        Ok(ReconcileReport {
            trigger,
            status,
            state: Some(state),
            certificates: Some(certificates),
            restart_required,
            http_endpoint,
            certificate_request,
        })
    }
}

fn missing_relation(context: &EventContext) -> Option<&'static str> {
    let [loki, certificates] = REQUIRED_RELATIONS;
    if context.loki_endpoints.is_none() {
        return Some(loki);
    }
    if !context.certificates.relation_created() {
        return Some(certificates);
    }
    None
}
