//! Workload subsystem.
//!
//! # Data Flow
//! ```text
//! ResolvedConfig
//!     → falcosidekick.rs renders falcosidekick.yaml + service layer
//!     → storage.rs (WorkloadStorage trait)
//!         → filesystem.rs: rooted local directory
//!         → memory.rs: in-memory backend
//! ```
//!
//! # Design Decisions
//! - Storage is a narrow capability trait (exists/read/write/make_dir)
//! - Files are only rewritten when their rendered content differs

pub mod falcosidekick;
pub mod filesystem;
pub mod memory;
pub mod storage;

pub use falcosidekick::{Falcosidekick, RenderError};
pub use filesystem::RootedFilesystem;
pub use memory::MemoryStorage;
pub use storage::{StorageError, WorkloadStorage};
