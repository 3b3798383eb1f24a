//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (JSON/TOML)
//!     → loader.rs (read & pick format)
//!     → merge.rs (parse to Overlay, merge onto defaults.rs baseline)
//!     → validation.rs (domain checks, all issues aggregated)
//!     → Snapshot (validated, immutable)
//!     → shared via ConfigHandle to all subsystems
//!
//! On reload:
//!     watcher.rs detects change
//!     → loader.rs loads new config against a fresh baseline
//!     → atomic swap inside ConfigHandle
//!     → subsystems observe new config on their next load()
//! ```
//!
//! # Design Decisions
//! - Config is immutable once frozen; changes require full reload
//! - Every field has a baseline value so minimal documents work
//! - Absent fields and explicit zero values are distinct
//! - Resolution is all-or-nothing: one bad field rejects the document

pub mod defaults;
pub mod duration;
pub mod handle;
pub mod loader;
pub mod merge;
pub mod schema;
pub mod snapshot;
pub mod validation;
pub mod value;
pub mod watcher;

pub use defaults::baseline;
pub use handle::ConfigHandle;
pub use loader::{load_path, load_str, ConfigError, Format};
pub use merge::{resolve, Overlay};
pub use schema::Document;
pub use snapshot::Snapshot;
pub use validation::{Issue, IssueKind, Issues};
pub use value::{Scalar, Value};
