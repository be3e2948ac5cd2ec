//! Falcosidekick operator library.

pub mod certificates;
pub mod charm;
pub mod config;
pub mod health;
pub mod observability;
pub mod state;
pub mod workload;

pub use certificates::{CertificateReconciler, Reconciliation};
pub use charm::{FalcosidekickOperator, StatefulOperator};
pub use state::{ConfigResolver, ResolvedConfig};
