//! Shared fixtures for integration tests.

use discovery_router::discovery::CatalogRecord;
use discovery_router::synthesis::SynthesizerConfig;

/// A record scoped through structured metadata.
pub fn scoped_record(name: &str, env: &str, scheme: &str) -> CatalogRecord {
    CatalogRecord::new(name, "10.0.0.1", 8080)
        .with_meta("Env", env)
        .with_meta("Scheme", scheme)
}

/// Synthesizer settings for the `prod` namespace.
pub fn prod_config() -> SynthesizerConfig {
    SynthesizerConfig::new("prod")
}

/// A catalog snapshot in the Consul catalog JSON shape.
#[allow(dead_code)]
pub const CATALOG_JSON: &str = r#"[
    {
        "ServiceName": "users",
        "ServiceAddress": "10.0.0.1",
        "Address": "192.168.1.10",
        "ServicePort": 8080,
        "ServiceTags": ["routable", "v2"],
        "ServiceMeta": {"Environment": "prod", "Scheme": "http"}
    },
    {
        "ServiceName": "billing",
        "ServiceAddress": "",
        "Address": "192.168.1.11",
        "ServicePort": 8443,
        "ServiceTags": ["routable", "{\"Environment\":\"prod\",\"Scheme\":\"https\",\"BasePath\":\"api\"}"],
        "ServiceMeta": null
    },
    {
        "ServiceName": "reports",
        "ServiceAddress": "10.0.0.3",
        "ServicePort": 9000,
        "ServiceTags": ["routable"],
        "ServiceMeta": {"Environment": "staging", "Scheme": "http"}
    },
    {
        "ServiceName": "consul",
        "ServiceAddress": "10.0.0.4",
        "ServicePort": 8300,
        "ServiceTags": [],
        "ServiceMeta": {}
    }
]"#;
