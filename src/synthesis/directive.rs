//! Route directives and their textual `route add` form.
//!
//! ```text
//! route add <name> <pattern> <destination> [weight <w>] [tags "<csv>"] [opts "<k=v ...>"]
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Option key holding the strip rule.
pub const OPT_STRIP: &str = "strip";
/// Option key holding the forwarding protocol.
pub const OPT_PROTO: &str = "proto";
/// Option key selecting the matching strategy.
pub const OPT_MATCHER: &str = "matcher";

/// Matcher used when a directive does not name one.
pub const DEFAULT_MATCHER: &str = "prefix";

/// A declarative routing rule. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDirective {
    /// Route name (the catalog service name).
    pub service: String,
    /// Request path pattern, e.g. `/prod/users`.
    pub pattern: String,
    /// Destination URL, e.g. `http://10.0.0.1:8080/`.
    pub destination: String,
    pub weight: Option<f64>,
    pub tags: Vec<String>,
    /// Ordered `key=value` options.
    pub opts: Vec<(String, String)>,
}

impl RouteDirective {
    pub fn new(
        service: impl Into<String>,
        pattern: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            pattern: pattern.into(),
            destination: destination.into(),
            weight: None,
            tags: Vec::new(),
            opts: Vec::new(),
        }
    }

    /// Set an option, replacing an earlier value for the same key.
    pub fn with_opt(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.opts.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.opts.push((key, value)),
        }
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn opt(&self, key: &str) -> Option<&str> {
        self.opts
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Name of the matching strategy this route uses.
    pub fn matcher(&self) -> &str {
        self.opt(OPT_MATCHER).unwrap_or(DEFAULT_MATCHER)
    }

    pub fn strip(&self) -> Option<&str> {
        self.opt(OPT_STRIP)
    }

    pub fn proto(&self) -> Option<&str> {
        self.opt(OPT_PROTO)
    }
}

impl fmt::Display for RouteDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "route add {} {} {}", self.service, self.pattern, self.destination)?;
        if let Some(weight) = self.weight {
            write!(f, " weight {}", weight)?;
        }
        if !self.tags.is_empty() {
            let tags: Vec<String> = self.tags.iter().map(|t| escape_tag(t)).collect();
            write!(f, " tags {}", quote(&tags.join(",")))?;
        }
        if !self.opts.is_empty() {
            let opts: Vec<String> = self.opts.iter().map(|(k, v)| format!("{k}={v}")).collect();
            write!(f, " opts {}", quote(&opts.join(" ")))?;
        }
        Ok(())
    }
}

/// Escape commas and backslashes so tags survive the comma-separated list.
fn escape_tag(tag: &str) -> String {
    let mut out = String::with_capacity(tag.len());
    for c in tag.chars() {
        if c == ',' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Split a comma-separated tag list, honouring `\,` and `\\` escapes.
fn split_tags(list: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut current = String::new();
    let mut chars = list.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            ',' => tags.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    tags.push(current);
    tags
}

/// Double-quote a value, escaping quotes and backslashes.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Error parsing a textual directive.
#[derive(Debug, Error, PartialEq)]
pub enum DirectiveParseError {
    #[error("unsupported command: {0:?}")]
    UnsupportedCommand(String),

    #[error("missing {0}")]
    Missing(&'static str),

    #[error("unterminated quoted value")]
    UnterminatedQuote,

    #[error("invalid weight: {0:?}")]
    InvalidWeight(String),

    #[error("malformed option {0:?}, expected key=value")]
    MalformedOption(String),

    #[error("unexpected token: {0:?}")]
    UnexpectedToken(String),
}

/// Split a line into whitespace-separated words; double quotes group words.
fn tokenize(line: &str) -> Result<Vec<String>, DirectiveParseError> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let mut token = String::new();
        if c == '"' {
            chars.next();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some('\\') => match chars.next() {
                        Some(escaped) => token.push(escaped),
                        None => return Err(DirectiveParseError::UnterminatedQuote),
                    },
                    Some(other) => token.push(other),
                    None => return Err(DirectiveParseError::UnterminatedQuote),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }
    Ok(tokens)
}

impl FromStr for RouteDirective {
    type Err = DirectiveParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let tokens = tokenize(line)?;
        let mut tokens = tokens.into_iter();

        match (tokens.next(), tokens.next()) {
            (Some(route), Some(add)) if route == "route" && add == "add" => {}
            (Some(route), Some(other)) if route == "route" => {
                return Err(DirectiveParseError::UnsupportedCommand(other));
            }
            (Some(other), _) => return Err(DirectiveParseError::UnsupportedCommand(other)),
            (None, _) => return Err(DirectiveParseError::Missing("command")),
        }

        let service = tokens.next().ok_or(DirectiveParseError::Missing("route name"))?;
        let pattern = tokens.next().ok_or(DirectiveParseError::Missing("pattern"))?;
        let destination = tokens.next().ok_or(DirectiveParseError::Missing("destination"))?;
        let mut directive = RouteDirective::new(service, pattern, destination);

        while let Some(keyword) = tokens.next() {
            match keyword.as_str() {
                "weight" => {
                    let value = tokens.next().ok_or(DirectiveParseError::Missing("weight value"))?;
                    let weight = value
                        .parse::<f64>()
                        .map_err(|_| DirectiveParseError::InvalidWeight(value.clone()))?;
                    directive.weight = Some(weight);
                }
                "tags" => {
                    let value = tokens.next().ok_or(DirectiveParseError::Missing("tags value"))?;
                    directive.tags = split_tags(&value);
                }
                "opts" => {
                    let value = tokens.next().ok_or(DirectiveParseError::Missing("opts value"))?;
                    for pair in value.split_whitespace() {
                        let (k, v) = pair
                            .split_once('=')
                            .ok_or_else(|| DirectiveParseError::MalformedOption(pair.to_string()))?;
                        directive = directive.with_opt(k, v);
                    }
                }
                _ => return Err(DirectiveParseError::UnexpectedToken(keyword)),
            }
        }

        Ok(directive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_minimal() {
        let d = RouteDirective::new("users", "/prod/users", "http://10.0.0.1:80/")
            .with_opt(OPT_STRIP, "/prod/users")
            .with_opt(OPT_PROTO, "http");

        assert_eq!(
            d.to_string(),
            r#"route add users /prod/users http://10.0.0.1:80/ opts "strip=/prod/users proto=http""#
        );
    }

    #[test]
    fn test_render_weight_and_tags() {
        let d = RouteDirective::new("users", "/prod/users", "http://10.0.0.1:80/")
            .with_weight(0.25)
            .with_tags(vec!["v2".into(), "blue".into()]);

        assert_eq!(
            d.to_string(),
            r#"route add users /prod/users http://10.0.0.1:80/ weight 0.25 tags "v2,blue""#
        );
    }

    #[test]
    fn test_parse_rendered() {
        let d = RouteDirective::new("users", "/[^/]+/users", "https://[::1]:8443/api/")
            .with_weight(1.0)
            .with_tags(vec!["v2".into()])
            .with_opt(OPT_STRIP, "/[^/]+/users")
            .with_opt(OPT_PROTO, "https")
            .with_opt(OPT_MATCHER, "regex");

        let parsed: RouteDirective = d.to_string().parse().unwrap();
        assert_eq!(parsed, d);
        assert_eq!(parsed.matcher(), "regex");
        assert_eq!(parsed.strip(), Some("/[^/]+/users"));
        assert_eq!(parsed.proto(), Some("https"));
    }

    #[test]
    fn test_parse_escaped_quotes() {
        let d: RouteDirective = r#"route add a /a http://h:1/ tags "x\"y,z\\\\w""#.parse().unwrap();
        assert_eq!(d.tags, vec![r#"x"y"#.to_string(), r"z\w".to_string()]);
    }

    #[test]
    fn test_tags_with_commas_round_trip() {
        let d = RouteDirective::new("users", "/[^/]+/users", "http://h:1/").with_tags(vec![
            r#"{"Environment":"prod","Scheme":"http"}"#.to_string(),
            r"a\,b".to_string(),
            "v2".to_string(),
        ]);

        let line = d.to_string();
        assert!(line.contains(r#"tags "{\"Environment\":\"prod\"\\,\"Scheme\":\"http\"}"#));
        let parsed: RouteDirective = line.parse().unwrap();
        assert_eq!(parsed.tags, d.tags);
    }

    #[test]
    fn test_default_matcher() {
        let d: RouteDirective = "route add a /a http://h:1/".parse().unwrap();
        assert_eq!(d.matcher(), DEFAULT_MATCHER);
        assert_eq!(d.strip(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "route del a".parse::<RouteDirective>(),
            Err(DirectiveParseError::UnsupportedCommand("del".into()))
        );
        assert_eq!(
            "route add a /a".parse::<RouteDirective>(),
            Err(DirectiveParseError::Missing("destination"))
        );
        assert_eq!(
            "route add a /a http://h:1/ weight heavy".parse::<RouteDirective>(),
            Err(DirectiveParseError::InvalidWeight("heavy".into()))
        );
        assert_eq!(
            r#"route add a /a http://h:1/ opts "strip""#.parse::<RouteDirective>(),
            Err(DirectiveParseError::MalformedOption("strip".into()))
        );
        assert_eq!(
            r#"route add a /a http://h:1/ opts "strip=/a"#.parse::<RouteDirective>(),
            Err(DirectiveParseError::UnterminatedQuote)
        );
        assert_eq!(
            "route add a /a http://h:1/ priority 3".parse::<RouteDirective>(),
            Err(DirectiveParseError::UnexpectedToken("priority".into()))
        );
    }
}
