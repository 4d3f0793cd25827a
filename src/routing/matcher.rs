//! Path matching strategies.
//!
//! # Responsibilities
//! - Decide whether a request path matches a route path
//! - Rewrite the request path by stripping the routed prefix
//! - Resolve strategies by name through a registry
//!
//! # Design Decisions
//! - Matching and stripping are separate: glob and regex routes match with the
//!   expressive pattern but strip with a cheap, predictable rule
//! - Patterns compile once at table-build time, never on the request path
//! - Unknown names are an error; there is no fallback strategy

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use thiserror::Error;

/// Error compiling a match or strip pattern.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid glob: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("invalid regex: {0}")]
    Regex(#[from] regex::Error),
}

/// A route path prepared for matching.
#[derive(Debug, Clone, Default)]
pub struct RoutePath {
    pub path: String,
    pub glob: Option<glob::Pattern>,
    pub regex: Option<Regex>,
}

impl RoutePath {
    pub fn literal(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

/// A target's strip rule prepared for rewriting.
#[derive(Debug, Clone, Default)]
pub struct StripRule {
    pub path: String,
    pub regex: Option<Regex>,
}

impl StripRule {
    pub fn literal(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            regex: None,
        }
    }
}

/// A named pair of match predicate and strip transform.
pub trait MatchingStrategy: Send + Sync + fmt::Debug {
    /// Prepare a route path for [`matches`](Self::matches).
    fn compile_path(&self, path: &str) -> Result<RoutePath, PatternError> {
        Ok(RoutePath::literal(path))
    }

    /// Prepare a strip option for [`strip`](Self::strip).
    fn compile_strip(&self, strip: &str) -> Result<StripRule, PatternError> {
        Ok(StripRule::literal(strip))
    }

    /// Returns true if the request path matches the route.
    fn matches(&self, path: &str, route: &RoutePath) -> bool;

    /// Compute the forwarded path.
    fn strip<'a>(&self, path: &'a str, rule: &StripRule) -> Cow<'a, str>;
}

/// Literal, case-sensitive prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixMatcher;

impl MatchingStrategy for PrefixMatcher {
    fn matches(&self, path: &str, route: &RoutePath) -> bool {
        path.starts_with(&route.path)
    }

    fn strip<'a>(&self, path: &'a str, rule: &StripRule) -> Cow<'a, str> {
        Cow::Borrowed(path.strip_prefix(rule.path.as_str()).unwrap_or(path))
    }
}

/// Case-insensitive prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct IPrefixMatcher;

impl MatchingStrategy for IPrefixMatcher {
    fn matches(&self, path: &str, route: &RoutePath) -> bool {
        strip_prefix_ignore_case(path, &route.path).is_some()
    }

    fn strip<'a>(&self, path: &'a str, rule: &StripRule) -> Cow<'a, str> {
        Cow::Borrowed(strip_prefix_ignore_case(path, &rule.path).unwrap_or(path))
    }
}

/// Glob match; strips like [`IPrefixMatcher`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobMatcher;

impl MatchingStrategy for GlobMatcher {
    fn compile_path(&self, path: &str) -> Result<RoutePath, PatternError> {
        Ok(RoutePath {
            path: path.to_string(),
            glob: Some(glob::Pattern::new(path)?),
            regex: None,
        })
    }

    fn matches(&self, path: &str, route: &RoutePath) -> bool {
        route.glob.as_ref().is_some_and(|g| g.matches(path))
    }

    fn strip<'a>(&self, path: &'a str, rule: &StripRule) -> Cow<'a, str> {
        // Not glob-aware: only a literal prefix of the strip path is removed.
        IPrefixMatcher.strip(path, rule)
    }
}

/// Regular expression match; strips every match of the strip pattern.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexMatcher;

impl MatchingStrategy for RegexMatcher {
    fn compile_path(&self, path: &str) -> Result<RoutePath, PatternError> {
        Ok(RoutePath {
            path: path.to_string(),
            glob: None,
            regex: Some(Regex::new(path)?),
        })
    }

    fn compile_strip(&self, strip: &str) -> Result<StripRule, PatternError> {
        let regex = if strip.is_empty() {
            None
        } else {
            Some(Regex::new(strip)?)
        };
        Ok(StripRule {
            path: strip.to_string(),
            regex,
        })
    }

    fn matches(&self, path: &str, route: &RoutePath) -> bool {
        route.regex.as_ref().is_some_and(|r| r.is_match(path))
    }

    fn strip<'a>(&self, path: &'a str, rule: &StripRule) -> Cow<'a, str> {
        match &rule.regex {
            Some(regex) => regex.replace_all(path, ""),
            None => Cow::Borrowed(path),
        }
    }
}

/// Remove `prefix` from `path` comparing characters case-insensitively.
///
/// The removed part spans as many characters as `prefix` has.
fn strip_prefix_ignore_case<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let mut rest = path.char_indices();
    for expected in prefix.chars() {
        let (_, actual) = rest.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }
    Some(rest.as_str())
}

/// Lookup failure for an unregistered strategy name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown matcher {0:?}")]
pub struct UnknownMatcher(pub String);

/// Strategies by name. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct MatcherRegistry {
    strategies: HashMap<String, Arc<dyn MatchingStrategy>>,
}

impl MatcherRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `prefix`, `iprefix`, `glob` and `regex`.
    pub fn builtin() -> Self {
        Self::new()
            .with("prefix", PrefixMatcher)
            .with("iprefix", IPrefixMatcher)
            .with("glob", GlobMatcher)
            .with("regex", RegexMatcher)
    }

    /// Register a strategy under a name, replacing any earlier one.
    pub fn with(mut self, name: impl Into<String>, strategy: impl MatchingStrategy + 'static) -> Self {
        self.strategies.insert(name.into(), Arc::new(strategy));
        self
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn MatchingStrategy>, UnknownMatcher> {
        self.strategies
            .get(name)
            .cloned()
            .ok_or_else(|| UnknownMatcher(name.to_string()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// The process-wide registry of built-in strategies.
pub fn builtin_registry() -> &'static MatcherRegistry {
    static REGISTRY: OnceLock<MatcherRegistry> = OnceLock::new();
    REGISTRY.get_or_init(MatcherRegistry::builtin)
}
