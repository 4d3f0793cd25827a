//! Route synthesis subsystem.
//!
//! # Data Flow
//! ```text
//! CatalogRecord + SynthesizerConfig
//!     → discovery tag gate (filter, split passthrough tags)
//!     → metadata.rs (structured metadata, then JSON-in-tag fallback)
//!     → scope resolution (global vs fixed environment segment)
//!     → host.rs (address normalization)
//!     → directive.rs (RouteDirective, textual `route add` form)
//! ```
//!
//! # Design Decisions
//! - Pure function of its inputs: no I/O, no shared state
//! - Non-routable records yield no directive; they are never errors
//! - Identical input always yields an identical directive

pub mod directive;
pub mod host;
pub mod metadata;
pub mod synthesizer;

pub use directive::{DirectiveParseError, RouteDirective};
pub use host::HostSuffixPolicy;
pub use metadata::RouteMetadata;
pub use synthesizer::{RouteDescriptor, RouteScope, Synthesizer, SynthesizerConfig};
