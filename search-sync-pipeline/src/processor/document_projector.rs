//! Document projector implementation.
//!
//! Transforms a record into the flat document sent to the search engine.

use std::sync::Arc;

use search_sync_shared::{Document, FieldMapping, Record};
use serde_json::Value;
use tracing::{instrument, trace};

use super::source_path::resolve_source;
use crate::errors::SyncError;
use crate::registry::{IndexConfig, IndexConfigRegistry};

/// Projects records into documents using the registry's index configs.
///
/// Projection runs in four steps:
/// 1. Base fields from the mapping, or the raw attributes when no mapping
///    is configured
/// 2. Dot-path and template sources resolved against the record
/// 3. Extra fields added where the field is absent
/// 4. Field callbacks applied in registration order
#[derive(Clone)]
pub struct DocumentProjector {
    registry: Arc<IndexConfigRegistry>,
}

impl DocumentProjector {
    pub fn new(registry: Arc<IndexConfigRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<IndexConfigRegistry> {
        &self.registry
    }

    /// Project `record` using the config registered for its entity type.
    ///
    /// # Returns
    ///
    /// * `Ok(Document)` - The projected document
    /// * `Err(SyncError::Configuration)` - If the configured mapping needs an
    ///   index name that cannot be resolved
    #[instrument(skip(self, record), fields(entity_type = %record.entity_type()))]
    pub fn project(&self, record: &dyn Record) -> Result<Document, SyncError> {
        let config = self.registry.get(record.entity_type());
        Self::project_with(&config, record)
    }

    /// Project `record` with an explicit config.
    pub fn project_with(config: &IndexConfig, record: &dyn Record) -> Result<Document, SyncError> {
        let mapping = config.mapping_for(record)?;

        let mut document = if mapping.is_empty() {
            Self::raw_document(config, record)
        } else {
            Self::mapped_document(&mapping, record)
        };

        for (field, extra) in config.extras() {
            if !document.has_value(&field) {
                let value = extra.resolve(record);
                document.insert(field, value);
            }
        }

        for field in document.field_names() {
            for callback in config.callbacks(&field) {
                let current = document.get(&field).cloned().unwrap_or(Value::Null);
                let next = callback(current, &document, record);
                document.insert(field.clone(), next);
            }
        }

        trace!(fields = document.len(), "Projected document");
        Ok(document)
    }

    fn mapped_document(mapping: &FieldMapping, record: &dyn Record) -> Document {
        mapping
            .iter()
            .map(|(field, source)| (field.to_string(), resolve_source(record, source)))
            .collect()
    }

    /// Stored attributes, plus computed ones when `use_mutated_fields` is set.
    /// Relations are never included.
    fn raw_document(config: &IndexConfig, record: &dyn Record) -> Document {
        let mut document = record.attributes();
        if config.settings().use_mutated_fields {
            for name in record.computed_attributes() {
                let value = record.attribute(&name).unwrap_or(Value::Null);
                document.insert(name, value);
            }
        }
        document
    }
}
