//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! resolved `logging` group
//!     → logging.rs (tracing subscriber: level, format, sink)
//!
//! config subsystem emits:
//!     → load / publish / reject events
//!     → watcher start and change detection
//! ```
//!
//! # Design Decisions
//! - Structured logging via `tracing`; library code only emits events
//! - The binary owns subscriber installation

pub mod logging;
