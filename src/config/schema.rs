//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the TOML config file.

use serde::{Deserialize, Serialize};

use crate::synthesis::host::HostSuffixMode;
use crate::synthesis::SynthesizerConfig;

/// Root configuration for the router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Route synthesis settings.
    pub discovery: DiscoveryConfig,

    /// Catalog snapshot source.
    pub catalog: CatalogConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Route synthesis settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Environment namespace this instance serves.
    pub env: String,

    /// Marker tag a record must carry to be routed.
    pub tag: Option<String>,

    /// Host suffix behaviour for bare hostnames.
    pub host_suffix: HostSuffixMode,

    /// Matching strategy put on every synthesized route.
    pub matcher: String,

    /// Optional weight annotation (0.0 to 1.0).
    pub weight: Option<f64>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            env: String::new(),
            tag: None,
            host_suffix: HostSuffixMode::None,
            matcher: "regex".to_string(),
            weight: None,
        }
    }
}

impl DiscoveryConfig {
    /// Synthesizer settings for the platform this process runs on.
    pub fn synthesizer_config(&self) -> SynthesizerConfig {
        SynthesizerConfig {
            discovery_env: self.env.clone(),
            discovery_tag: self.tag.clone(),
            host_policy: self.host_suffix.policy(),
            matcher: self.matcher.clone(),
            weight: self.weight,
        }
    }
}

/// Catalog snapshot source.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Path to a JSON array of catalog records.
    pub path: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: "catalog.json".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
