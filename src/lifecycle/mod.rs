//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Watch mode:
//!     Load config → Build initial table → Publish → Start catalog watcher
//!
//! Reload (reload.rs):
//!     Catalog snapshot → Synthesize → Build table → Atomic publish
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     Ctrl-C received → Broadcast shutdown → Reload loop exits
//! ```
//!
//! # Design Decisions
//! - A rejected rebuild keeps the previous table live
//! - Reloads are applied in arrival order, one at a time

pub mod reload;
pub mod shutdown;
pub mod signals;

pub use reload::Reloader;
pub use shutdown::Shutdown;
