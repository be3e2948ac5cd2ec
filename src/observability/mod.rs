//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (path, container, relation, ...)
//!
//! logging.rs installs the subscriber once, in the binary.
//! ```
//!
//! # Design Decisions
//! - Library code only emits events; it never installs a subscriber
//! - `RUST_LOG` wins over the snapshot's `observability.log_level`

pub mod logging;
