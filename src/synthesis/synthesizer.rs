//! Catalog record to route directive synthesis.

use crate::discovery::CatalogRecord;
use crate::synthesis::directive::{RouteDirective, OPT_MATCHER, OPT_PROTO, OPT_STRIP};
use crate::synthesis::host::{join_host_port, HostSuffixPolicy};
use crate::synthesis::metadata;

/// Path segment token matching any single environment segment.
pub const GLOBAL_SEGMENT: &str = "[^/]+";

/// Per-instance synthesis settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizerConfig {
    /// Environment namespace this proxy serves.
    pub discovery_env: String,
    /// Marker tag a record must carry to be routed. `None` routes every record.
    pub discovery_tag: Option<String>,
    pub host_policy: HostSuffixPolicy,
    /// Matching strategy named on every directive.
    pub matcher: String,
    pub weight: Option<f64>,
}

impl SynthesizerConfig {
    pub fn new(discovery_env: impl Into<String>) -> Self {
        Self {
            discovery_env: discovery_env.into(),
            discovery_tag: None,
            host_policy: HostSuffixPolicy::None,
            matcher: "regex".to_string(),
            weight: None,
        }
    }

    pub fn with_discovery_tag(mut self, tag: impl Into<String>) -> Self {
        self.discovery_tag = Some(tag.into());
        self
    }

    pub fn with_host_policy(mut self, policy: HostSuffixPolicy) -> Self {
        self.host_policy = policy;
        self
    }
}

/// Which environment segments a route answers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteScope {
    /// Any single environment segment.
    Global,
    /// Exactly this environment segment.
    Fixed(String),
}

impl RouteScope {
    /// The pattern segment for this scope.
    pub fn segment(&self) -> &str {
        match self {
            RouteScope::Global => GLOBAL_SEGMENT,
            RouteScope::Fixed(env) => env,
        }
    }
}

/// Everything synthesis knows about a routable record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub discovery_key: String,
    pub env: String,
    pub base_env: String,
    pub scope: RouteScope,
    pub scheme: String,
    pub base_path: String,
    pub passthrough_tags: Vec<String>,
}

/// Turns catalog records into route directives.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    config: SynthesizerConfig,
}

impl Synthesizer {
    pub fn new(config: SynthesizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SynthesizerConfig {
        &self.config
    }

    /// Produce the directives for one record. Empty when the record is not
    /// routable by this instance.
    pub fn synthesize(&self, record: &CatalogRecord) -> Vec<RouteDirective> {
        let Some(descriptor) = self.describe(record) else {
            return Vec::new();
        };

        let host = record.host();
        if host.is_empty() {
            tracing::debug!(service = %record.service_name, "Skipping record without address");
            return Vec::new();
        }
        let host = self.config.host_policy.apply(host);
        let addr = join_host_port(&host, record.service_port);

        let pattern = format!("/{}/{}", descriptor.scope.segment(), descriptor.discovery_key);
        let mut destination = format!("{}://{}/", descriptor.scheme, addr);
        let base_path = descriptor.base_path.trim_matches('/');
        if !base_path.is_empty() {
            destination.push_str(base_path);
            destination.push('/');
        }

        let mut directive = RouteDirective::new(&record.service_name, &pattern, destination)
            .with_tags(descriptor.passthrough_tags)
            .with_opt(OPT_STRIP, &pattern)
            .with_opt(OPT_PROTO, &descriptor.scheme)
            .with_opt(OPT_MATCHER, &self.config.matcher);
        if let Some(weight) = self.config.weight {
            directive = directive.with_weight(weight);
        }

        tracing::trace!(service = %record.service_name, directive = %directive, "Synthesized route");
        vec![directive]
    }

    /// Resolve the route descriptor, or `None` when the record is filtered out.
    pub fn describe(&self, record: &CatalogRecord) -> Option<RouteDescriptor> {
        let passthrough_tags = match &self.config.discovery_tag {
            Some(marker) => {
                if !record.service_tags.iter().any(|t| t == marker) {
                    tracing::trace!(service = %record.service_name, "Record lacks discovery tag");
                    return None;
                }
                record
                    .service_tags
                    .iter()
                    .filter(|t| *t != marker)
                    .cloned()
                    .collect()
            }
            None => record.service_tags.clone(),
        };

        let meta = metadata::resolve(record);
        if !meta.is_scoped() {
            tracing::debug!(service = %record.service_name, "Record has no environment or scheme");
            return None;
        }

        let (base_env, scope) = match meta.base_env {
            Some(base_env) => (base_env, RouteScope::Fixed(meta.env.clone())),
            None => (meta.env.clone(), RouteScope::Global),
        };
        if base_env != self.config.discovery_env {
            tracing::trace!(
                service = %record.service_name,
                base_env = %base_env,
                discovery_env = %self.config.discovery_env,
                "Record outside discovery environment"
            );
            return None;
        }

        Some(RouteDescriptor {
            discovery_key: meta
                .discovery_key
                .unwrap_or_else(|| record.service_name.clone()),
            env: meta.env,
            base_env,
            scope,
            scheme: meta.scheme,
            base_path: meta.base_path,
            passthrough_tags,
        })
    }
}

/// Synthesize directives for one record with the given settings.
pub fn synthesize(record: &CatalogRecord, config: &SynthesizerConfig) -> Vec<RouteDirective> {
    Synthesizer::new(config.clone()).synthesize(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prod_record() -> CatalogRecord {
        CatalogRecord::new("users", "10.0.0.1", 8080)
            .with_meta("Env", "prod")
            .with_meta("Scheme", "http")
    }

    #[test]
    fn test_global_route() {
        let directives = synthesize(&prod_record(), &SynthesizerConfig::new("prod"));
        assert_eq!(directives.len(), 1);

        let d = &directives[0];
        assert_eq!(d.service, "users");
        assert_eq!(d.pattern, "/[^/]+/users");
        assert_eq!(d.destination, "http://10.0.0.1:8080/");
        assert_eq!(d.strip(), Some("/[^/]+/users"));
        assert_eq!(d.proto(), Some("http"));
        assert_eq!(d.matcher(), "regex");
        assert_eq!(
            d.to_string(),
            r#"route add users /[^/]+/users http://10.0.0.1:8080/ opts "strip=/[^/]+/users proto=http matcher=regex""#
        );
    }

    #[test]
    fn test_environment_mismatch() {
        assert!(synthesize(&prod_record(), &SynthesizerConfig::new("staging")).is_empty());
    }

    #[test]
    fn test_fixed_scope() {
        let record = prod_record().with_meta("BaseEnv", "shared");
        let synthesizer = Synthesizer::new(SynthesizerConfig::new("shared"));

        let descriptor = synthesizer.describe(&record).unwrap();
        assert_eq!(descriptor.scope, RouteScope::Fixed("prod".into()));
        assert_eq!(descriptor.base_env, "shared");

        let directives = synthesizer.synthesize(&record);
        assert_eq!(directives[0].pattern, "/prod/users");

        assert!(synthesize(&record, &SynthesizerConfig::new("prod")).is_empty());
    }

    #[test]
    fn test_discovery_key_override() {
        let record = prod_record().with_meta("DiscoveryKey", "people");
        let directives = synthesize(&record, &SynthesizerConfig::new("prod"));
        assert_eq!(directives[0].pattern, "/[^/]+/people");
        assert_eq!(directives[0].service, "users");
    }

    #[test]
    fn test_discovery_tag_gate() {
        let config = SynthesizerConfig::new("prod").with_discovery_tag("routable");

        let tagged = prod_record().with_tag("routable").with_tag("v2");
        let directives = synthesize(&tagged, &config);
        assert_eq!(directives[0].tags, vec!["v2".to_string()]);

        let untagged = prod_record().with_tag("v2");
        assert!(synthesize(&untagged, &config).is_empty());
    }

    #[test]
    fn test_tags_copied_without_gate() {
        let record = prod_record().with_tag("routable").with_tag("v2");
        let directives = synthesize(&record, &SynthesizerConfig::new("prod"));
        assert_eq!(directives[0].tags, vec!["routable".to_string(), "v2".to_string()]);
    }

    #[test]
    fn test_tag_descriptor_base_path() {
        let record = CatalogRecord::new("users", "10.0.0.1", 443)
            .with_tag(r#"{"Environment":"prod","Scheme":"https","BasePath":"api"}"#);
        let directives = synthesize(&record, &SynthesizerConfig::new("prod"));
        assert_eq!(directives[0].destination, "https://10.0.0.1:443/api/");
        assert_eq!(directives[0].proto(), Some("https"));
    }

    #[test]
    fn test_tag_app_keeps_service_name_key() {
        let record = CatalogRecord::new("users", "10.0.0.1", 8080)
            .with_tag(r#"{"Environment":"prod","Scheme":"http","App":"frontend"}"#);
        let directives = synthesize(&record, &SynthesizerConfig::new("prod"));
        assert_eq!(directives[0].pattern, "/[^/]+/users");
    }

    #[test]
    fn test_unscoped_record() {
        let record = CatalogRecord::new("users", "10.0.0.1", 80).with_meta("Env", "prod");
        assert!(synthesize(&record, &SynthesizerConfig::new("prod")).is_empty());
    }

    #[test]
    fn test_node_address_and_ipv6() {
        let record = CatalogRecord::new("users", "", 8080)
            .with_node_address("fe80::1")
            .with_meta("Env", "prod")
            .with_meta("Scheme", "http");
        let directives = synthesize(&record, &SynthesizerConfig::new("prod"));
        assert_eq!(directives[0].destination, "http://[fe80::1]:8080/");
    }

    #[test]
    fn test_missing_address() {
        let record = CatalogRecord::new("users", "", 8080)
            .with_meta("Env", "prod")
            .with_meta("Scheme", "http");
        assert!(synthesize(&record, &SynthesizerConfig::new("prod")).is_empty());
    }

    #[test]
    fn test_host_policy() {
        let record = CatalogRecord::new("users", "laptop", 8080)
            .with_meta("Env", "prod")
            .with_meta("Scheme", "http");
        let config = SynthesizerConfig::new("prod").with_host_policy(HostSuffixPolicy::AppendLocal);
        assert_eq!(synthesize(&record, &config)[0].destination, "http://laptop.local:8080/");
    }

    #[test]
    fn test_weight_annotation() {
        let mut config = SynthesizerConfig::new("prod");
        config.weight = Some(0.5);
        assert_eq!(synthesize(&prod_record(), &config)[0].weight, Some(0.5));
    }

    #[test]
    fn test_idempotent() {
        let record = prod_record().with_tag("v1").with_meta("BasePath", "/api/");
        let config = SynthesizerConfig::new("prod");
        let first: Vec<String> = synthesize(&record, &config).iter().map(ToString::to_string).collect();
        let second: Vec<String> = synthesize(&record, &config).iter().map(ToString::to_string).collect();
        assert_eq!(first, second);
        assert!(first[0].contains("http://10.0.0.1:8080/api/"));
    }
}
