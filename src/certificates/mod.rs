//! TLS certificate handling.
//!
//! # Data Flow
//! ```text
//! certificates relation
//!     → CertificateAssignment (absent / pending / assigned material)
//!     → reconciler.rs compares with stored files
//!     → rewrites the differing file(s) in the workload
//!     → Changed / Unchanged / NotReady feeds the restart decision
//!
//! unit name + binding addresses
//!     → request.rs builds the CertificateRequest published to the provider
//! ```
//!
//! # Design Decisions
//! - Stored material is owned by the reconciler; nothing else writes these paths
//! - Comparison is by value, never by identity

pub mod material;
pub mod reconciler;
pub mod request;

pub use material::{CertificateAssignment, CertificateMaterial, TlsError};
pub use reconciler::{CertificateReconciler, Reconciliation};
pub use request::CertificateRequest;

/// Server private key inside the workload.
pub const PRIVATE_KEY_PATH: &str = "/etc/falcosidekick/certs/server/server.key";

/// Server certificate inside the workload.
pub const CERTIFICATE_PATH: &str = "/etc/falcosidekick/certs/server/server.crt";
