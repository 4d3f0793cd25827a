//! Routing core of a discovery-driven reverse proxy.
//!
//! Catalog records from service discovery are turned into route directives,
//! compiled into a routing table and matched against request paths.

pub mod config;
pub mod discovery;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod synthesis;

pub use config::RouterConfig;
pub use discovery::CatalogRecord;
pub use routing::{MatcherRegistry, RoutingTable, SharedTable};
pub use synthesis::{RouteDirective, Synthesizer, SynthesizerConfig};

/// Top-level error for operations spanning several subsystems.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Catalog(#[from] discovery::CatalogError),

    #[error("invalid directive: {0}")]
    Directive(#[from] synthesis::DirectiveParseError),

    #[error(transparent)]
    Table(#[from] routing::TableError),
}
