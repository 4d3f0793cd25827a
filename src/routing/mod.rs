//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (on every catalog change):
//!     RouteDirective[]
//!     → matcher.rs (resolve strategy by name, precompile patterns)
//!     → table.rs (group targets, order longest pattern first)
//!     → shared.rs (atomic swap of the live table)
//!
//! Incoming Request (path)
//!     → shared.rs (snapshot of the live table)
//!     → table.rs (first matching route)
//!     → matcher.rs (strip transform for the chosen target)
//! ```
//!
//! # Design Decisions
//! - Routes compiled ahead of time, immutable at runtime
//! - Configuration errors surface at build time, never per request
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod shared;
pub mod table;

pub use matcher::{builtin_registry, MatcherRegistry, MatchingStrategy, PatternError, UnknownMatcher};
pub use shared::SharedTable;
pub use table::{ForwardError, Route, RoutingTable, TableError, Target};
