//! Resolved configuration snapshot consumed by the sync core.
//!
//! Loading (files, environment) happens in the binary; this module only
//! describes the shape and the defaults.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::Deserialize;

use crate::entity::EntityType;
use crate::mapping::MappingTable;

/// Default connection name.
pub const DEFAULT_CONNECTION: &str = "default";

/// Default document id field.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Default number of records per bulk request.
pub const DEFAULT_CHUNK_SIZE: usize = 10;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncSettings {
    /// When true, lifecycle hooks are not attached at all.
    pub disabled: bool,
    /// Connection used when an index config does not name one.
    pub connection: String,
    pub connections: HashMap<String, ConnectionSettings>,
    /// Document field used as the search engine `_id`.
    pub index_id_field: String,
    /// Include computed attributes in raw-attribute projection.
    pub use_mutated_fields: bool,
    pub indexes: IndexesSettings,
    pub bulk_sync: BulkSyncSettings,
    /// Catalog of tracked entity types, keyed by entity type name.
    pub entities: BTreeMap<String, EntitySettings>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        let mut connections = HashMap::new();
        connections.insert(DEFAULT_CONNECTION.to_string(), ConnectionSettings::default());

        Self {
            disabled: false,
            connection: DEFAULT_CONNECTION.to_string(),
            connections,
            index_id_field: DEFAULT_ID_FIELD.to_string(),
            use_mutated_fields: false,
            indexes: IndexesSettings::default(),
            bulk_sync: BulkSyncSettings::default(),
            entities: BTreeMap::new(),
        }
    }
}

impl SyncSettings {
    /// Look up a connection by name.
    pub fn connection_settings(&self, name: &str) -> Option<&ConnectionSettings> {
        self.connections.get(name)
    }

    /// Look up a catalog entry, exact match first, then case-insensitive.
    pub fn entity(&self, entity_type: &EntityType) -> Option<(EntityType, &EntitySettings)> {
        lookup_entity(&self.entities, entity_type)
            .map(|(key, settings)| (EntityType::new(key.as_str()), settings))
    }
}

/// Host and port of one search engine endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConnectionSettings {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            host: "localhost".to_string(),
            port: 9200,
        }
    }
}

impl ConnectionSettings {
    /// Base URL, e.g. `http://localhost:9200/`.
    pub fn url(&self) -> String {
        format!("{}://{}:{}/", self.scheme, self.host, self.port)
    }
}

/// The `indexes` section: a fallback index name plus per-index mapping tables.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexesSettings {
    /// Fallback index name.
    pub default: Option<String>,
    #[serde(flatten)]
    pub indexes: HashMap<String, IndexMappings>,
}

impl IndexesSettings {
    pub fn mappings(&self, index: &str) -> Option<&IndexMappings> {
        self.indexes.get(index)
    }
}

/// Mapping tables for one index: a shared base plus per-entity-type tables.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexMappings {
    pub base_mapping: MappingTable,
    #[serde(flatten)]
    pub types: HashMap<String, MappingTable>,
}

impl IndexMappings {
    /// Table for `entity_type`, exact match first, then case-insensitive.
    pub fn for_entity(&self, entity_type: &EntityType) -> Option<&MappingTable> {
        lookup_entity(&self.types, entity_type).map(|(_, table)| table)
    }
}

/// Find the entry keyed by `entity_type`.
///
/// Keys are normalized before comparing. An exact match beats a
/// case-insensitive one; among equal matches the smallest key wins, so keys
/// differing only in case resolve the same way whatever the map's order.
fn lookup_entity<'a, V>(
    entries: impl IntoIterator<Item = (&'a String, &'a V)>,
    entity_type: &EntityType,
) -> Option<(&'a String, &'a V)> {
    let name = entity_type.as_str();
    entries
        .into_iter()
        .filter_map(|(key, value)| {
            let normalized = EntityType::new(key.as_str());
            if normalized.as_str() == name {
                Some((0u8, key, value))
            } else if normalized.as_str().eq_ignore_ascii_case(name) {
                Some((1u8, key, value))
            } else {
                None
            }
        })
        .min_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)))
        .map(|(_, key, value)| (key, value))
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BulkSyncSettings {
    pub chunk_size: usize,
}

impl Default for BulkSyncSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Catalog entry describing where the records of one entity type live.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EntitySettings {
    /// Storage name (table name); defaults to the lowercased short type name.
    pub storage: Option<String>,
    /// NDJSON file holding the records; defaults to `<storage>.ndjson` in the
    /// records directory.
    pub records: Option<PathBuf>,
}

impl EntitySettings {
    pub fn storage_name(&self, entity_type: &EntityType) -> String {
        self.storage
            .clone()
            .unwrap_or_else(|| entity_type.short_name().to_lowercase())
    }
}
