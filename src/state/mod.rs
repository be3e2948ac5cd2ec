//! Operator state derivation.
//!
//! # Data Flow
//! ```text
//! charm options (RawConfig)
//!     → config::validation (port range)
//! send-loki-logs unit data
//!     → loki.rs (discover push URLs, split first into hostport/endpoint)
//! certificate assignment
//!     → tls_ready flag
//!
//! all three → resolver.rs → ResolvedConfig (immutable, one per trigger)
//! ```
//!
//! # Design Decisions
//! - State is recomputed on every trigger; nothing is memoized across passes
//! - Resolution is a pure function of its inputs

pub mod loki;
pub mod resolver;

pub use resolver::{ConfigResolver, ResolvedConfig, TlsPaths, TLS_HEALTHCHECK_PORT};
