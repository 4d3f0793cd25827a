//! Route metadata resolution.
//!
//! A record describes its routing scope either through structured service
//! metadata or through a JSON object embedded in one of its tags. Sources are
//! tried in order; a later source only fills fields an earlier one left empty.

use crate::discovery::CatalogRecord;

/// Recognised `ServiceMeta` keys. The first key present wins.
const KEY_DISCOVERY_KEY: &[&str] = &["DiscoveryKey"];
const KEY_ENV: &[&str] = &["Environment", "Env"];
const KEY_BASE_ENV: &[&str] = &["BaseEnvironment", "BaseEnv"];
const KEY_SCHEME: &[&str] = &["Scheme"];
const KEY_BASE_PATH: &[&str] = &["BasePath"];

/// Routing metadata gathered from a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMetadata {
    pub discovery_key: Option<String>,
    pub env: String,
    pub base_env: Option<String>,
    pub scheme: String,
    pub base_path: String,
}

impl RouteMetadata {
    /// True once both environment and scheme are known.
    pub fn is_scoped(&self) -> bool {
        !self.env.is_empty() && !self.scheme.is_empty()
    }

    fn fill_from(&mut self, other: RouteMetadata) {
        if self.discovery_key.is_none() {
            self.discovery_key = other.discovery_key;
        }
        if self.env.is_empty() {
            self.env = other.env;
        }
        if self.base_env.is_none() {
            self.base_env = other.base_env;
        }
        if self.scheme.is_empty() {
            self.scheme = other.scheme;
        }
        if self.base_path.is_empty() {
            self.base_path = other.base_path;
        }
    }
}

/// A source of routing metadata.
trait MetadataSource: Sync {
    fn read(&self, record: &CatalogRecord) -> Option<RouteMetadata>;
}

/// Structured `ServiceMeta` entries.
struct ServiceMeta;

impl ServiceMeta {
    fn lookup<'a>(record: &'a CatalogRecord, keys: &[&str]) -> Option<&'a str> {
        keys.iter()
            .filter_map(|k| record.service_meta.get(*k))
            .map(String::as_str)
            .find(|v| !v.is_empty())
    }
}

impl MetadataSource for ServiceMeta {
    fn read(&self, record: &CatalogRecord) -> Option<RouteMetadata> {
        let get = |keys: &[&str]| Self::lookup(record, keys).map(str::to_string);
        Some(RouteMetadata {
            discovery_key: get(KEY_DISCOVERY_KEY),
            env: get(KEY_ENV).unwrap_or_default(),
            base_env: get(KEY_BASE_ENV),
            scheme: get(KEY_SCHEME).unwrap_or_default(),
            base_path: get(KEY_BASE_PATH).unwrap_or_default(),
        })
    }
}

/// Descriptor object some registrations put into a tag.
///
/// Keys match case-insensitively, an exact spelling wins. `App` and `Label`
/// may be present and are ignored.
#[derive(Debug, Default)]
struct TagDescriptor {
    environment: String,
    scheme: String,
    base_path: String,
}

impl TagDescriptor {
    /// `None` when the tag is not a JSON object or a field is not a string.
    fn parse(tag: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(tag).ok()?;
        let object = value.as_object()?;

        let field = |name: &str| -> Option<String> {
            let value = object.get(name).or_else(|| {
                object
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            });
            match value {
                None | Some(serde_json::Value::Null) => Some(String::new()),
                Some(serde_json::Value::String(s)) => Some(s.clone()),
                Some(_) => None,
            }
        };

        Some(Self {
            environment: field("Environment")?,
            scheme: field("Scheme")?,
            base_path: field("BasePath")?,
        })
    }
}

/// First tag holding a parseable JSON descriptor object.
struct EmbeddedTag;

impl MetadataSource for EmbeddedTag {
    fn read(&self, record: &CatalogRecord) -> Option<RouteMetadata> {
        let descriptor = record
            .service_tags
            .iter()
            .find_map(|tag| TagDescriptor::parse(tag))?;

        Some(RouteMetadata {
            discovery_key: None,
            env: descriptor.environment,
            base_env: None,
            scheme: descriptor.scheme,
            base_path: descriptor.base_path,
        })
    }
}

const SOURCES: &[&dyn MetadataSource] = &[&ServiceMeta, &EmbeddedTag];

/// Resolve routing metadata for a record.
///
/// Stops at the first source after which environment and scheme are known.
pub fn resolve(record: &CatalogRecord) -> RouteMetadata {
    let mut metadata = RouteMetadata::default();
    for source in SOURCES {
        if let Some(found) = source.read(record) {
            metadata.fill_from(found);
        }
        if metadata.is_scoped() {
            break;
        }
    }
    metadata
}
