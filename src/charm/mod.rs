//! Operator lifecycle.
//!
//! # Data Flow
//! ```text
//! trigger (install / config-changed / pebble-ready / relation-changed)
//!     + EventContext (options, relation data)
//!     → operator.rs
//!         → workload reachable?            no → Waiting
//!         → ConfigResolver::resolve        err → Blocked
//!         → required relations present?    no → Blocked
//!         → CertificateReconciler          Changed/Unchanged/NotReady
//!         → Falcosidekick::configure       files changed?
//!     → ReconcileReport (status, restart decision, http-endpoint data,
//!                        certificate request)
//! ```
//!
//! # Design Decisions
//! - Status reporting is data in the report; the caller owns side effects
//! - Transient storage failures are errors, configuration problems are statuses

pub mod context;
pub mod operator;
pub mod status;

pub use context::EventContext;
pub use operator::{
    EndpointAdvert, FalcosidekickOperator, OperatorError, ReconcileReport, StatefulOperator,
    Trigger,
};
pub use status::UnitStatus;
