//! # Search Sync Shared
//!
//! Shared types for the search sync system: the projected [`Document`], the
//! [`Record`] capability the data store exposes, entity type identifiers, and
//! the resolved [`SyncSettings`] snapshot.

pub mod document;
pub mod entity;
pub mod mapping;
pub mod record;
pub mod settings;

pub use document::Document;
pub use entity::EntityType;
pub use mapping::{FieldMapping, MappingEntry, MappingTable};
pub use record::{JsonRecord, Record, Relation};
pub use settings::{
    BulkSyncSettings, ConnectionSettings, EntitySettings, IndexMappings, IndexesSettings,
    SyncSettings,
};
