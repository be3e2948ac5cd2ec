//! Workload health checking.
//!
//! # Data Flow
//! ```text
//! ResolvedConfig.tls_healthcheck_port
//!     → probe.rs: GET http://<host>:<port>/ping
//!     → healthy / unhealthy
//! ```
//!
//! # Design Decisions
//! - Probes always use the plaintext healthcheck port, even when TLS is deployed
//! - A probe never errors; failures are logged and reported as unhealthy

pub mod probe;

pub use probe::{HealthProbe, ProbeError};
