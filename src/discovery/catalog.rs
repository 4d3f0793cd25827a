//! Catalog records as reported by service discovery.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// One service instance as reported by the discovery catalog.
///
/// Field names follow the Consul catalog API so snapshots can be fed in
/// unmodified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogRecord {
    /// Logical service name, also the route name.
    pub service_name: String,

    /// Address registered with the service. Wins over `node_address` when set.
    #[serde(default)]
    pub service_address: String,

    /// Address of the node the service runs on.
    #[serde(default, rename = "Address")]
    pub node_address: String,

    #[serde(default)]
    pub service_port: u16,

    /// Free-form tags; may carry a discovery marker or a JSON descriptor.
    #[serde(default, deserialize_with = "null_as_default")]
    pub service_tags: Vec<String>,

    /// Structured metadata. Preferred over tags when both are present.
    #[serde(default, deserialize_with = "null_as_default")]
    pub service_meta: BTreeMap<String, String>,
}

impl CatalogRecord {
    /// Create a record with a name, service address and port.
    pub fn new(name: impl Into<String>, address: impl Into<String>, port: u16) -> Self {
        Self {
            service_name: name.into(),
            service_address: address.into(),
            service_port: port,
            ..Self::default()
        }
    }

    /// Set the node address used when no service address is registered.
    pub fn with_node_address(mut self, address: impl Into<String>) -> Self {
        self.node_address = address.into();
        self
    }

    /// Append a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.service_tags.push(tag.into());
        self
    }

    /// Insert a metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.service_meta.insert(key.into(), value.into());
        self
    }

    /// The address to forward to: service address, else node address.
    pub fn host(&self) -> &str {
        if self.service_address.is_empty() {
            &self.node_address
        } else {
            &self.service_address
        }
    }
}

/// Consul reports empty tag lists and metadata maps as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Error type for catalog snapshot loading.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Load a catalog snapshot: a JSON array of records.
pub fn load_catalog(path: &Path) -> Result<Vec<CatalogRecord>, CatalogError> {
    let content = fs::read_to_string(path)?;
    let records: Vec<CatalogRecord> = serde_json::from_str(&content)?;
    tracing::debug!(path = ?path, records = records.len(), "Catalog snapshot loaded");
    Ok(records)
}
