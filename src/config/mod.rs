//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! event snapshot (TOML)
//!     → loader.rs (parse & deserialize)
//!     → EventSnapshot (options + relation data + workload settings)
//!     → validation.rs (option semantics, inside ConfigResolver)
//!
//! In watch mode:
//!     watcher.rs detects change
//!     → loader.rs loads new snapshot
//!     → a fresh reconciliation pass runs
//! ```
//!
//! # Design Decisions
//! - Snapshots are plain data; nothing here talks to the workload
//! - All fields have defaults to allow minimal snapshots
//! - Serde handles syntax, validation.rs handles option semantics

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_snapshot, ConfigError};
pub use schema::{EventSnapshot, RawConfig};
pub use validation::{CharmOptions, ValidationFailure, DEFAULT_PORT};
