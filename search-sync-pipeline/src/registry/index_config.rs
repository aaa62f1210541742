//! Per-entity-type index configuration.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use search_sync_repository::{ClientRegistry, SearchClient};
use search_sync_shared::{Document, EntityType, FieldMapping, MappingTable, Record, SyncSettings};
use serde_json::Value;
use tracing::debug;

use crate::errors::SyncError;

/// Transforms one field value. Receives the current value, the document as
/// mutated so far, and the record being projected.
pub type FieldCallback = Arc<dyn Fn(Value, &Document, &dyn Record) -> Value + Send + Sync>;

/// Produces an extra field's value from the record.
pub type ExtraGenerator = Arc<dyn Fn(&dyn Record) -> Value + Send + Sync>;

/// Produces a custom mapping table for a record.
pub type MappingFn = Arc<dyn Fn(&dyn Record) -> MappingTable + Send + Sync>;

/// Derives an index name from the configured default (or fallback) name.
pub type IndexNameFn = Arc<dyn Fn(Option<&str>) -> Option<String> + Send + Sync>;

/// Wraps the client resolved for this entity type's connection.
pub type ConnectionWrapper = Arc<dyn Fn(Arc<dyn SearchClient>) -> Arc<dyn SearchClient> + Send + Sync>;

/// Decides whether a record takes part in a full resync.
pub type RecordFilter = Arc<dyn Fn(&dyn Record) -> bool + Send + Sync>;

/// Explicit index name setting.
#[derive(Clone)]
pub enum IndexName {
    Fixed(String),
    Derived(IndexNameFn),
}

impl fmt::Debug for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexName::Fixed(name) => f.debug_tuple("Fixed").field(name).finish(),
            IndexName::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

/// Value of an extra field: a literal, or a generator called per record.
#[derive(Clone)]
pub enum ExtraField {
    Value(Value),
    Generator(ExtraGenerator),
}

impl ExtraField {
    pub fn resolve(&self, record: &dyn Record) -> Value {
        match self {
            ExtraField::Value(value) => value.clone(),
            ExtraField::Generator(generator) => generator(record),
        }
    }
}

impl fmt::Debug for ExtraField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtraField::Value(value) => f.debug_tuple("Value").field(value).finish(),
            ExtraField::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

#[derive(Default)]
struct ConfigState {
    connection: Option<String>,
    index_name: Option<IndexName>,
    field_id: Option<String>,
    mapping: Option<MappingFn>,
    callbacks: Vec<(String, Vec<FieldCallback>)>,
    extras: Vec<(String, ExtraField)>,
    wrapper: Option<ConnectionWrapper>,
    filter: Option<RecordFilter>,
}

/// Index configuration for one entity type.
///
/// Setters take `&self` and apply immediately to every later projection.
/// Closures are cloned out of the lock before they run, so a callback may
/// read the configuration it belongs to.
///
/// # Example
///
/// ```ignore
/// registry
///     .get(&EntityType::new("App\\User"))
///     .set_index_name("people")
///     .add_extra("group", json!("users"))
///     .add_callback("name", |value, _doc, _record| value);
/// ```
pub struct IndexConfig {
    entity_type: EntityType,
    settings: Arc<SyncSettings>,
    state: RwLock<ConfigState>,
}

impl IndexConfig {
    pub fn new(entity_type: EntityType, settings: Arc<SyncSettings>) -> Self {
        Self {
            entity_type,
            settings,
            state: RwLock::new(ConfigState::default()),
        }
    }

    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn set_connection(&self, name: impl Into<String>) -> &Self {
        self.state.write().connection = Some(name.into());
        self
    }

    pub fn set_index_name(&self, name: impl Into<String>) -> &Self {
        self.state.write().index_name = Some(IndexName::Fixed(name.into()));
        self
    }

    /// Derive the index name from the configured default, or from the
    /// caller's fallback when no default is configured.
    pub fn set_index_with(
        &self,
        derive: impl Fn(Option<&str>) -> Option<String> + Send + Sync + 'static,
    ) -> &Self {
        self.state.write().index_name = Some(IndexName::Derived(Arc::new(derive)));
        self
    }

    pub fn set_field_id(&self, field: impl Into<String>) -> &Self {
        self.state.write().field_id = Some(field.into());
        self
    }

    /// Replace the configuration-driven mapping with a custom one.
    pub fn set_mapping(
        &self,
        mapping: impl Fn(&dyn Record) -> MappingTable + Send + Sync + 'static,
    ) -> &Self {
        self.state.write().mapping = Some(Arc::new(mapping));
        self
    }

    pub fn clear_mapping(&self) -> &Self {
        self.state.write().mapping = None;
        self
    }

    /// Append a callback to `field`'s chain.
    pub fn add_callback(
        &self,
        field: impl Into<String>,
        callback: impl Fn(Value, &Document, &dyn Record) -> Value + Send + Sync + 'static,
    ) -> &Self {
        let field = field.into();
        let callback: FieldCallback = Arc::new(callback);
        let mut state = self.state.write();
        match state.callbacks.iter_mut().find(|(name, _)| *name == field) {
            Some((_, chain)) => chain.push(callback),
            None => state.callbacks.push((field, vec![callback])),
        }
        self
    }

    /// Add a literal extra field. Re-adding a field replaces its definition.
    pub fn add_extra(&self, field: impl Into<String>, value: Value) -> &Self {
        self.put_extra(field.into(), ExtraField::Value(value));
        self
    }

    /// Add an extra field computed from the record.
    pub fn add_extra_with(
        &self,
        field: impl Into<String>,
        generator: impl Fn(&dyn Record) -> Value + Send + Sync + 'static,
    ) -> &Self {
        self.put_extra(field.into(), ExtraField::Generator(Arc::new(generator)));
        self
    }

    /// Wrap every client used for this entity type, e.g. to add retries or
    /// request logging around the connection's transport.
    pub fn wrap_connection(
        &self,
        wrap: impl Fn(Arc<dyn SearchClient>) -> Arc<dyn SearchClient> + Send + Sync + 'static,
    ) -> &Self {
        self.state.write().wrapper = Some(Arc::new(wrap));
        self
    }

    /// Limit full resyncs to records accepted by `filter`.
    pub fn set_record_filter(
        &self,
        filter: impl Fn(&dyn Record) -> bool + Send + Sync + 'static,
    ) -> &Self {
        self.state.write().filter = Some(Arc::new(filter));
        self
    }

    pub fn clear_record_filter(&self) -> &Self {
        self.state.write().filter = None;
        self
    }

    fn put_extra(&self, field: String, extra: ExtraField) {
        let mut state = self.state.write();
        match state.extras.iter_mut().find(|(name, _)| *name == field) {
            Some((_, existing)) => *existing = extra,
            None => state.extras.push((field, extra)),
        }
    }

    /// Connection name, falling back to the configured default connection.
    pub fn connection(&self) -> String {
        self.state
            .read()
            .connection
            .clone()
            .unwrap_or_else(|| self.settings.connection.clone())
    }

    /// Resolve the index name.
    ///
    /// # Arguments
    ///
    /// * `fallback` - Used when neither an explicit name nor `indexes.default`
    ///   is configured, typically the record's storage name
    ///
    /// # Returns
    ///
    /// * `Ok(name)` - A non-empty index name
    /// * `Err(SyncError::Configuration)` - If every tier is empty
    pub fn index(&self, fallback: Option<&str>) -> Result<String, SyncError> {
        let explicit = self.state.read().index_name.clone();
        let default = self.settings.indexes.default.as_deref().or(fallback);

        let resolved = match explicit {
            Some(IndexName::Fixed(name)) => Some(name),
            Some(IndexName::Derived(derive)) => derive(default),
            None => default.map(str::to_string),
        };

        match resolved {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(SyncError::configuration(format!(
                "Index name for {} must be a non-empty string",
                self.entity_type
            ))),
        }
    }

    /// Client for this entity type's connection, passed through the
    /// connection wrapper when one is set.
    pub fn client(&self, clients: &ClientRegistry) -> Result<Arc<dyn SearchClient>, SyncError> {
        let client = clients.client(&self.connection())?;
        let wrapper = self.state.read().wrapper.clone();
        Ok(match wrapper {
            Some(wrap) => wrap(client),
            None => client,
        })
    }

    /// Whether `record` takes part in a full resync. Without a filter every
    /// record does.
    pub fn includes(&self, record: &dyn Record) -> bool {
        let filter = self.state.read().filter.clone();
        filter.map_or(true, |filter| filter(record))
    }

    pub fn field_id(&self) -> String {
        self.state
            .read()
            .field_id
            .clone()
            .unwrap_or_else(|| self.settings.index_id_field.clone())
    }

    /// Callback chain for `field`, in registration order.
    pub fn callbacks(&self, field: &str) -> Vec<FieldCallback> {
        self.state
            .read()
            .callbacks
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, chain)| chain.clone())
            .unwrap_or_default()
    }

    /// Extra fields, in registration order.
    pub fn extras(&self) -> Vec<(String, ExtraField)> {
        self.state.read().extras.clone()
    }

    /// Field mapping for `record`.
    ///
    /// A custom mapping wins. Otherwise the `indexes.<index>` section is used:
    /// `base_mapping` merged with the table for this entity type, where the
    /// type-specific entries win on collision.
    pub fn mapping_for(&self, record: &dyn Record) -> Result<FieldMapping, SyncError> {
        let custom = self.state.read().mapping.clone();
        if let Some(mapping) = custom {
            return Ok(mapping(record).to_field_mapping());
        }

        let index = self.index(Some(record.storage_name()))?;
        let Some(tables) = self.settings.indexes.mappings(&index) else {
            debug!(index = %index, entity_type = %self.entity_type, "No mapping configured");
            return Ok(FieldMapping::new());
        };

        let specific = tables
            .for_entity(record.entity_type())
            .map(MappingTable::to_field_mapping)
            .unwrap_or_default();

        Ok(tables.base_mapping.to_field_mapping().merge(specific))
    }
}

impl fmt::Debug for IndexConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("IndexConfig")
            .field("entity_type", &self.entity_type)
            .field("connection", &state.connection)
            .field("index_name", &state.index_name)
            .field("field_id", &state.field_id)
            .field("custom_mapping", &state.mapping.is_some())
            .field("extras", &state.extras)
            .field("wrapped_connection", &state.wrapper.is_some())
            .field("record_filter", &state.filter.is_some())
            .finish()
    }
}
