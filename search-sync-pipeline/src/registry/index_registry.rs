use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use search_sync_shared::{EntityType, SyncSettings};
use tracing::debug;

use super::index_config::IndexConfig;

/// Registry of index configurations keyed by entity type.
///
/// Shared through `Arc` between the bulk orchestrator and the change agent so
/// both observe the same configuration.
pub struct IndexConfigRegistry {
    settings: Arc<SyncSettings>,
    configs: RwLock<HashMap<EntityType, Arc<IndexConfig>>>,
}

impl IndexConfigRegistry {
    pub fn new(settings: Arc<SyncSettings>) -> Self {
        Self {
            settings,
            configs: RwLock::new(HashMap::new()),
        }
    }

    /// Config for `entity_type`, created on first access.
    pub fn get(&self, entity_type: &EntityType) -> Arc<IndexConfig> {
        if let Some(config) = self.configs.read().get(entity_type) {
            return Arc::clone(config);
        }

        let mut configs = self.configs.write();
        let config = configs.entry(entity_type.clone()).or_insert_with(|| {
            debug!(entity_type = %entity_type, "Creating index config");
            Arc::new(IndexConfig::new(
                entity_type.clone(),
                Arc::clone(&self.settings),
            ))
        });
        Arc::clone(config)
    }

    /// Replace the config for `entity_type` with a fresh one.
    ///
    /// Holders of the previous `Arc` keep the old instance; later `get` calls
    /// see the new one.
    pub fn reset(&self, entity_type: &EntityType) -> Arc<IndexConfig> {
        let config = Arc::new(IndexConfig::new(
            entity_type.clone(),
            Arc::clone(&self.settings),
        ));
        self.configs
            .write()
            .insert(entity_type.clone(), Arc::clone(&config));
        config
    }

    pub fn settings(&self) -> &Arc<SyncSettings> {
        &self.settings
    }
}
