//! Compiled routing table.
//!
//! # Responsibilities
//! - Compile route directives into routes with prepared matchers
//! - Look up the route for a request path
//! - Rewrite the request path for a chosen target
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Longest pattern is checked first; insertion order breaks ties
//! - Any bad directive refuses the whole build; a partial table is never produced

use std::borrow::Cow;
use std::sync::Arc;

use thiserror::Error;
use url::Url;

use crate::discovery::CatalogRecord;
use crate::routing::matcher::{MatcherRegistry, MatchingStrategy, PatternError, RoutePath, StripRule};
use crate::synthesis::{RouteDirective, Synthesizer};

/// Error building a routing table. Names the offending route.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("route {route:?}: unknown matcher {matcher:?}")]
    UnknownMatcher { route: String, matcher: String },

    #[error("route {route:?}: invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        route: String,
        pattern: String,
        #[source]
        source: PatternError,
    },

    #[error("route {route:?}: invalid strip rule {strip:?}: {source}")]
    InvalidStrip {
        route: String,
        strip: String,
        #[source]
        source: PatternError,
    },

    #[error("route {route:?}: invalid destination {destination:?}: {source}")]
    InvalidDestination {
        route: String,
        destination: String,
        #[source]
        source: url::ParseError,
    },
}

impl TableError {
    /// Name of the route that failed to compile.
    pub fn route(&self) -> &str {
        match self {
            TableError::UnknownMatcher { route, .. }
            | TableError::InvalidPattern { route, .. }
            | TableError::InvalidStrip { route, .. }
            | TableError::InvalidDestination { route, .. } => route,
        }
    }
}

/// One forwarding target of a route.
#[derive(Debug, Clone)]
pub struct Target {
    pub service: String,
    pub url: Url,
    pub proto: Option<String>,
    pub weight: Option<f64>,
    pub tags: Vec<String>,
    strip: StripRule,
    strategy: Arc<dyn MatchingStrategy>,
}

impl Target {
    /// The path forwarded to this target.
    pub fn strip_path<'a>(&self, path: &'a str) -> Cow<'a, str> {
        self.strategy.strip(path, &self.strip)
    }

    /// The full upstream URL for a request path.
    ///
    /// Scheme, host and port always come from the destination; the forwarded
    /// path stays under the destination path.
    pub fn forward_url(&self, path: &str) -> Result<Url, ForwardError> {
        let stripped = self.strip_path(path);
        let (rest, query) = match stripped.split_once('?') {
            Some((rest, query)) => (rest, Some(query)),
            None => (&stripped[..], None),
        };

        if rest.split(['/', '\\']).any(is_dot_segment) {
            return Err(ForwardError::DotSegment(path.to_string()));
        }

        let base = self.url.path();
        let rest = rest.trim_start_matches('/');
        let joined = if base.ends_with('/') || rest.is_empty() {
            format!("{base}{rest}")
        } else {
            format!("{base}/{rest}")
        };

        let mut url = self.url.clone();
        url.set_path(&joined);
        url.set_query(query);
        if !url.path().starts_with(base) {
            return Err(ForwardError::OutsideBase(path.to_string()));
        }
        Ok(url)
    }
}

/// `.` and `..`, including their percent-encoded spellings.
fn is_dot_segment(segment: &str) -> bool {
    matches!(
        segment.to_ascii_lowercase().as_str(),
        "." | ".." | "%2e" | "%2e%2e" | ".%2e" | "%2e."
    )
}

/// Error building the upstream URL for a request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ForwardError {
    #[error("request path {0:?} contains a dot segment")]
    DotSegment(String),

    #[error("request path {0:?} leaves the destination path")]
    OutsideBase(String),
}

/// Routes sharing a pattern and matcher, with all their targets.
#[derive(Debug, Clone)]
pub struct Route {
    pub pattern: String,
    pub matcher: String,
    pub targets: Vec<Target>,
    path: RoutePath,
    strategy: Arc<dyn MatchingStrategy>,
}

impl Route {
    pub fn matches(&self, path: &str) -> bool {
        self.strategy.matches(path, &self.path)
    }
}

/// An immutable set of compiled routes.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: Vec<Route>,
}

impl RoutingTable {
    /// Compile directives. Fails on the first directive that does not compile.
    pub fn build(directives: &[RouteDirective], registry: &MatcherRegistry) -> Result<Self, TableError> {
        let mut routes: Vec<Route> = Vec::new();

        for directive in directives {
            let route_name = &directive.service;
            let matcher = directive.matcher();
            let strategy = registry.resolve(matcher).map_err(|_| TableError::UnknownMatcher {
                route: route_name.clone(),
                matcher: matcher.to_string(),
            })?;

            let strip = match directive.strip() {
                Some(strip) => strategy.compile_strip(strip).map_err(|source| TableError::InvalidStrip {
                    route: route_name.clone(),
                    strip: strip.to_string(),
                    source,
                })?,
                None => StripRule::default(),
            };

            let url = Url::parse(&directive.destination).map_err(|source| TableError::InvalidDestination {
                route: route_name.clone(),
                destination: directive.destination.clone(),
                source,
            })?;

            let target = Target {
                service: route_name.clone(),
                url,
                proto: directive.proto().map(str::to_string),
                weight: directive.weight,
                tags: directive.tags.clone(),
                strip,
                strategy: strategy.clone(),
            };

            if let Some(route) = routes
                .iter_mut()
                .find(|r| r.pattern == directive.pattern && r.matcher == matcher)
            {
                route.targets.push(target);
                continue;
            }

            let path = strategy.compile_path(&directive.pattern).map_err(|source| TableError::InvalidPattern {
                route: route_name.clone(),
                pattern: directive.pattern.clone(),
                source,
            })?;

            routes.push(Route {
                pattern: directive.pattern.clone(),
                matcher: matcher.to_string(),
                targets: vec![target],
                path,
                strategy,
            });
        }

        // stable: equal lengths keep insertion order
        routes.sort_by(|a, b| b.pattern.len().cmp(&a.pattern.len()));

        tracing::debug!(routes = routes.len(), "Routing table compiled");
        Ok(Self { routes })
    }

    /// Parse textual directives, one per line, and compile them.
    ///
    /// Blank lines and lines starting with `#` are skipped.
    pub fn from_lines(text: &str, registry: &MatcherRegistry) -> Result<Self, crate::Error> {
        let directives = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::parse::<RouteDirective>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::build(&directives, registry)?)
    }

    /// Synthesize every catalog record and compile the result.
    pub fn from_catalog(
        records: &[CatalogRecord],
        synthesizer: &Synthesizer,
        registry: &MatcherRegistry,
    ) -> Result<Self, TableError> {
        let directives: Vec<RouteDirective> = records
            .iter()
            .flat_map(|record| synthesizer.synthesize(record))
            .collect();

        tracing::debug!(
            records = records.len(),
            directives = directives.len(),
            "Synthesized directives from catalog"
        );
        Self::build(&directives, registry)
    }

    /// The first route matching the request path.
    pub fn lookup(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.matches(path))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
