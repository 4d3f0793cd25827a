//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (route, matcher, counts)
//!
//! Consumers:
//!     → logging.rs subscriber writing to stderr
//! ```
//!
//! # Design Decisions
//! - Structured fields rather than formatted messages
//! - Filtered-out catalog records log at debug/trace only
//! - stdout stays free for command output

pub mod logging;
