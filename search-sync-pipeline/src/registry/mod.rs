//! Index configuration registry.
//!
//! Holds one [`IndexConfig`] per entity type. Configs are created lazily on
//! first access and live for the registry's lifetime unless reset.

mod index_config;
mod index_registry;

pub use index_config::{
    ConnectionWrapper, ExtraField, ExtraGenerator, FieldCallback, IndexConfig, IndexName,
    IndexNameFn, MappingFn, RecordFilter,
};
pub use index_registry::IndexConfigRegistry;
