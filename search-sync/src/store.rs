//! NDJSON-file record store.
//!
//! Each tracked entity type keeps its records in one file with one JSON
//! object per line. Nested objects and arrays of objects are relations.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use search_sync_pipeline::{RecordSource, SyncError};
use search_sync_shared::{EntityType, JsonRecord, Record, SyncSettings};
use serde_json::Value;
use tracing::debug;

use crate::config::resolve_records_path;

/// Where the records of one entity type live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityLocation {
    pub entity_type: EntityType,
    pub storage_name: String,
    pub records: PathBuf,
}

impl EntityLocation {
    /// Locate `entity_type` through the catalog, or by its default records
    /// file `<records_dir>/<storage>.ndjson` when it is not catalogued.
    ///
    /// Returns `None` when neither exists.
    pub fn resolve(settings: &SyncSettings, entity_type: &EntityType, records_dir: &Path) -> Option<Self> {
        if let Some((entity_type, entry)) = settings.entity(entity_type) {
            let storage_name = entry.storage_name(&entity_type);
            let records = match &entry.records {
                Some(path) => resolve_records_path(records_dir, path),
                None => default_records_path(records_dir, &storage_name),
            };
            return Some(Self {
                entity_type,
                storage_name,
                records,
            });
        }

        let storage_name = entity_type.short_name().to_lowercase();
        let records = default_records_path(records_dir, &storage_name);
        records.is_file().then(|| Self {
            entity_type: entity_type.clone(),
            storage_name,
            records,
        })
    }
}

fn default_records_path(records_dir: &Path, storage_name: &str) -> PathBuf {
    records_dir.join(format!("{}.ndjson", storage_name))
}

/// Record source reading all records of one entity type from an NDJSON file.
#[derive(Debug)]
pub struct NdjsonRecordSource {
    entity_type: EntityType,
    storage_name: String,
    records: Vec<JsonRecord>,
}

impl NdjsonRecordSource {
    /// Read and parse the records file.
    ///
    /// # Returns
    ///
    /// * `Ok(NdjsonRecordSource)` - All records, in file order
    /// * `Err(SyncError::ResourceNotFound)` - If the file does not exist
    /// * `Err(SyncError::Source)` - If a line is not a JSON object
    pub async fn open(location: &EntityLocation) -> Result<Self, SyncError> {
        let text = match tokio::fs::read_to_string(&location.records).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SyncError::ResourceNotFound(location.records.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (number, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line).map_err(|e| {
                SyncError::source(format!(
                    "{}:{}: {}",
                    location.records.display(),
                    number + 1,
                    e
                ))
            })?;
            if !value.is_object() {
                return Err(SyncError::source(format!(
                    "{}:{}: expected a JSON object",
                    location.records.display(),
                    number + 1
                )));
            }
            records.push(JsonRecord::from_value(
                location.entity_type.clone(),
                location.storage_name.clone(),
                value,
            ));
        }

        debug!(
            entity_type = %location.entity_type,
            path = %location.records.display(),
            records = records.len(),
            "Loaded records"
        );

        Ok(Self {
            entity_type: location.entity_type.clone(),
            storage_name: location.storage_name.clone(),
            records,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordSource for NdjsonRecordSource {
    fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    fn storage_name(&self) -> &str {
        &self.storage_name
    }

    async fn count(&self) -> Result<usize, SyncError> {
        Ok(self.records.len())
    }

    async fn page(&self, offset: usize, limit: usize) -> Result<Vec<Box<dyn Record>>, SyncError> {
        Ok(self
            .records
            .iter()
            .skip(offset)
            .take(limit)
            .map(|record| Box::new(record.clone()) as Box<dyn Record>)
            .collect())
    }
}
