//! Service-discovery catalog subsystem.
//!
//! # Data Flow
//! ```text
//! catalog snapshot (JSON array, Consul catalog shape)
//!     → catalog.rs (deserialize into CatalogRecord)
//!     → synthesis (one record → zero or more route directives)
//!
//! On catalog change:
//!     watcher.rs detects change
//!     → catalog.rs loads new snapshot
//!     → snapshot sent to the reload loop
//! ```
//!
//! # Design Decisions
//! - Records are plain data; no validation happens here
//! - A snapshot that fails to parse is dropped, the previous one stays live

pub mod catalog;
pub mod watcher;

pub use catalog::{load_catalog, CatalogError, CatalogRecord};
pub use watcher::CatalogWatcher;
