//! The record capability consumed from the data store.
//!
//! Projection only ever talks to records through [`Record`]: named attribute
//! reads and named relation traversal. Dot-path resolution is built on top of
//! these two calls.

mod json_record;

pub use json_record::JsonRecord;

use serde_json::Value;

use crate::document::Document;
use crate::entity::EntityType;

/// Related records reached through a named relation.
pub enum Relation<'a> {
    /// A to-one relation.
    One(Box<dyn Record + 'a>),
    /// A to-many relation.
    Many(Vec<Box<dyn Record + 'a>>),
}

impl Relation<'_> {
    /// Serialize the related record(s) by their stored attributes.
    pub fn to_value(&self) -> Value {
        match self {
            Relation::One(record) => record.to_value(),
            Relation::Many(records) => Value::Array(records.iter().map(|r| r.to_value()).collect()),
        }
    }
}

/// A single row of a tracked entity type.
pub trait Record: Send + Sync {
    /// The tracked kind this record belongs to.
    fn entity_type(&self) -> &EntityType;

    /// Natural storage name of the record kind (e.g. the table name). Used as
    /// the last-resort index name.
    fn storage_name(&self) -> &str;

    /// Raw stored attributes, without relations or computed fields.
    fn attributes(&self) -> Document;

    /// Names of derived attributes backed by accessors.
    fn computed_attributes(&self) -> Vec<String> {
        Vec::new()
    }

    /// Read a stored or computed attribute by name.
    fn attribute(&self, name: &str) -> Option<Value>;

    /// Traverse a named relation.
    fn relation(&self, _name: &str) -> Option<Relation<'_>> {
        None
    }

    /// JSON form used when a relation itself is a mapped leaf.
    fn to_value(&self) -> Value {
        Value::Object(self.attributes().into_map())
    }
}
