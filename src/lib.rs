//! Configuration document model and default-resolution engine for the mesh
//! overlay client.

pub mod config;
pub mod observability;

pub use config::{ConfigHandle, Document, Snapshot};
