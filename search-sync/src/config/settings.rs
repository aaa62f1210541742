//! Layered settings loading.
//!
//! Precedence, lowest first:
//! 1. Built-in defaults
//! 2. `search-sync.{toml,json,yaml}` in the working directory (optional)
//! 3. The file passed with `--config` (required when given)
//! 4. Environment variables, e.g. `SEARCH_SYNC__BULK_SYNC__CHUNK_SIZE=100`

use std::path::{Path, PathBuf};

use config::{Config, ConfigBuilder, Environment, File};
use config::builder::DefaultState;
use search_sync_shared::settings::{DEFAULT_CHUNK_SIZE, DEFAULT_CONNECTION, DEFAULT_ID_FIELD};
use search_sync_shared::{ConnectionSettings, SyncSettings};
use tracing::debug;

use crate::AppError;

/// Base name of the optional settings file.
pub const DEFAULT_CONFIG_FILE: &str = "search-sync";

/// Prefix of settings environment variables.
pub const ENV_PREFIX: &str = "SEARCH_SYNC";

/// Builds a [`SyncSettings`] snapshot from files and the environment.
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    default_file: PathBuf,
    config_file: Option<PathBuf>,
    env_prefix: String,
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self {
            default_file: PathBuf::from(DEFAULT_CONFIG_FILE),
            config_file: None,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base name (without extension) of the optional settings file.
    pub fn with_default_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_file = path.into();
        self
    }

    /// Explicit settings file; loading fails if it does not exist.
    pub fn with_config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_file = path;
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load and deserialize the settings.
    ///
    /// # Returns
    ///
    /// * `Ok(SyncSettings)` - The resolved snapshot
    /// * `Err(AppError::ConfigError)` - If a source cannot be read or the
    ///   merged result does not match the settings shape
    pub fn load(&self) -> Result<SyncSettings, AppError> {
        let mut builder = Self::defaults()
            .map_err(|e| AppError::config(e.to_string()))?
            .add_source(File::with_name(&self.default_file.to_string_lossy()).required(false));

        if let Some(path) = &self.config_file {
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings: SyncSettings = builder
            .build()
            .map_err(|e| AppError::config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| AppError::config(e.to_string()))?;

        debug!(
            connection = %settings.connection,
            connections = settings.connections.len(),
            entities = settings.entities.len(),
            chunk_size = settings.bulk_sync.chunk_size,
            "Loaded settings"
        );

        Ok(settings)
    }

    /// Defaults are seeded into the builder so that a file adding another
    /// connection keeps the default one.
    fn defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
        let endpoint = ConnectionSettings::default();
        let connection_key = |field: &str| format!("connections.{}.{}", DEFAULT_CONNECTION, field);

        Config::builder()
            .set_default("disabled", false)?
            .set_default("connection", DEFAULT_CONNECTION)?
            .set_default(connection_key("scheme"), endpoint.scheme)?
            .set_default(connection_key("host"), endpoint.host)?
            .set_default(connection_key("port"), i64::from(endpoint.port))?
            .set_default("index_id_field", DEFAULT_ID_FIELD)?
            .set_default("use_mutated_fields", false)?
            .set_default("bulk_sync.chunk_size", DEFAULT_CHUNK_SIZE as i64)
    }
}

/// Resolve a records file path against `records_dir` unless it is absolute.
pub fn resolve_records_path(records_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        records_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_sync_shared::EntityType;
    use std::fs;

    fn loader(dir: &Path, prefix: &str) -> SettingsLoader {
        SettingsLoader::new()
            .with_default_file(dir.join("search-sync"))
            .with_env_prefix(prefix)
    }

    #[test]
    fn test_defaults_without_sources() {
        let dir = tempfile::tempdir().unwrap();
        let settings = loader(dir.path(), "SEARCH_SYNC_TEST_DEFAULTS").load().unwrap();
        assert_eq!(settings, SyncSettings::default());
    }

    #[test]
    fn test_file_layers_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("search-sync.toml"),
            r#"
use_mutated_fields = true

[connections.secondary]
host = "search.internal"
port = 9201

[bulk_sync]
chunk_size = 250

[indexes]
default = "everything"

[indexes.everything]
base_mapping = ["id", "name"]
"App\\User" = ["id", { name = "full_name" }]

[entities."App\\User"]
storage = "users"
"#,
        )
        .unwrap();

        let settings = loader(dir.path(), "SEARCH_SYNC_TEST_FILE").load().unwrap();

        assert!(settings.use_mutated_fields);
        assert_eq!(settings.bulk_sync.chunk_size, 250);
        assert_eq!(
            settings.connection_settings("default").unwrap().url(),
            "http://localhost:9200/"
        );
        assert_eq!(
            settings.connection_settings("secondary").unwrap().url(),
            "http://search.internal:9201/"
        );
        assert_eq!(settings.indexes.default.as_deref(), Some("everything"));

        let user = EntityType::new("App\\User");
        let tables = settings.indexes.mappings("everything").unwrap();
        let mapping = tables
            .base_mapping
            .to_field_mapping()
            .merge(tables.for_entity(&user).unwrap().to_field_mapping());
        assert_eq!(mapping.get("name"), Some("full_name"));

        let (_, entry) = settings.entity(&user).unwrap();
        assert_eq!(entry.storage_name(&user), "users");
    }

    #[test]
    fn test_table_form_mapping_keeps_source_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("search-sync.toml"),
            r#"
[indexes.people."App\\User"]
0 = "id"
name = "full_name"
email = "contact.email"
phone = "phones.number"
city = "address.city"
zip = "address.zip"
age = "age"
role = "roles.name"
"#,
        )
        .unwrap();

        let settings = loader(dir.path(), "SEARCH_SYNC_TEST_ORDER").load().unwrap();
        let table = settings
            .indexes
            .mappings("people")
            .unwrap()
            .for_entity(&EntityType::new("App\\User"))
            .unwrap();

        let fields: Vec<&str> = table.entries().iter().map(|entry| entry.field()).collect();
        assert_eq!(
            fields,
            vec!["id", "name", "email", "phone", "city", "zip", "age", "role"]
        );

        let mapping = table.to_field_mapping();
        let sources: Vec<&str> = mapping.iter().map(|(_, source)| source).collect();
        assert_eq!(sources[0], "id");
        assert_eq!(sources[7], "roles.name");
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("search-sync.toml"), "[bulk_sync]\nchunk_size = 250\n").unwrap();
        std::env::set_var("SEARCH_SYNC_TEST_ENV__BULK_SYNC__CHUNK_SIZE", "42");

        let settings = loader(dir.path(), "SEARCH_SYNC_TEST_ENV").load().unwrap();
        assert_eq!(settings.bulk_sync.chunk_size, 42);

        std::env::remove_var("SEARCH_SYNC_TEST_ENV__BULK_SYNC__CHUNK_SIZE");
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = loader(dir.path(), "SEARCH_SYNC_TEST_MISSING")
            .with_config_file(Some(dir.path().join("absent.toml")))
            .load();
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_resolve_records_path() {
        let dir = Path::new("/data/records");
        assert_eq!(
            resolve_records_path(dir, Path::new("users.ndjson")),
            PathBuf::from("/data/records/users.ndjson")
        );
        assert_eq!(
            resolve_records_path(dir, Path::new("/tmp/users.ndjson")),
            PathBuf::from("/tmp/users.ndjson")
        );
    }
}
