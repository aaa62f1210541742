//! A [`Record`] backed by a JSON object.
//!
//! Nested objects and arrays of objects are exposed as relations; every other
//! value is a stored attribute.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::{Record, Relation};
use crate::document::Document;
use crate::entity::EntityType;

type Accessor = Arc<dyn Fn(&JsonRecord) -> Value + Send + Sync>;

#[derive(Clone)]
pub struct JsonRecord {
    entity_type: EntityType,
    storage_name: String,
    fields: Map<String, Value>,
    computed: Vec<(String, Accessor)>,
}

impl JsonRecord {
    pub fn new(
        entity_type: impl Into<EntityType>,
        storage_name: impl Into<String>,
        fields: Map<String, Value>,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            storage_name: storage_name.into(),
            fields,
            computed: Vec::new(),
        }
    }

    /// Build a record from any JSON value; non-objects yield an empty record.
    pub fn from_value(
        entity_type: impl Into<EntityType>,
        storage_name: impl Into<String>,
        value: Value,
    ) -> Self {
        let fields = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(entity_type, storage_name, fields)
    }

    /// Register a computed attribute. Computed attributes shadow stored ones.
    pub fn with_computed(
        mut self,
        name: impl Into<String>,
        accessor: impl Fn(&JsonRecord) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.computed.push((name.into(), Arc::new(accessor)));
        self
    }

    /// Attach a relation value (object or array of objects) under `name`.
    pub fn with_relation(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Stored value under `name`, ignoring computed attributes.
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    fn is_relation_value(value: &Value) -> bool {
        match value {
            Value::Object(_) => true,
            Value::Array(items) => !items.is_empty() && items.iter().all(Value::is_object),
            _ => false,
        }
    }

    fn nested(&self, name: &str, value: &Value) -> JsonRecord {
        JsonRecord::from_value(name, name, value.clone())
    }
}

impl Record for JsonRecord {
    fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    fn storage_name(&self) -> &str {
        &self.storage_name
    }

    fn attributes(&self) -> Document {
        self.fields
            .iter()
            .filter(|(_, value)| !Self::is_relation_value(value))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    fn computed_attributes(&self) -> Vec<String> {
        self.computed.iter().map(|(name, _)| name.clone()).collect()
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        if let Some((_, accessor)) = self.computed.iter().find(|(n, _)| n == name) {
            return Some(accessor(self));
        }
        self.fields
            .get(name)
            .filter(|value| !Self::is_relation_value(value))
            .cloned()
    }

    fn relation(&self, name: &str) -> Option<Relation<'_>> {
        let value = self.fields.get(name)?;
        if !Self::is_relation_value(value) {
            return None;
        }
        match value {
            Value::Object(_) => Some(Relation::One(Box::new(self.nested(name, value)))),
            Value::Array(items) => Some(Relation::Many(
                items
                    .iter()
                    .map(|item| Box::new(self.nested(name, item)) as Box<dyn Record>)
                    .collect(),
            )),
            _ => None,
        }
    }
}

impl fmt::Debug for JsonRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonRecord")
            .field("entity_type", &self.entity_type)
            .field("storage_name", &self.storage_name)
            .field("fields", &self.fields)
            .field("computed", &self.computed_attributes())
            .finish()
    }
}
