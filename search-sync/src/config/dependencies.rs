//! Dependency initialization and wiring for search sync.

use std::sync::Arc;

use tracing::info;

use search_sync_pipeline::{
    BulkSyncOrchestrator, ChangeSyncAgent, DocumentProjector, IndexConfigRegistry,
    SyncEventSink, TracingEventSink,
};
use search_sync_repository::{ClientRegistry, SearchClient};
use search_sync_shared::SyncSettings;

/// Container for all initialized dependencies.
///
/// The orchestrator and the change agent share one config registry, so
/// configuration applied through [`Dependencies::registry`] affects both.
pub struct Dependencies {
    pub settings: Arc<SyncSettings>,
    pub registry: Arc<IndexConfigRegistry>,
    pub clients: Arc<ClientRegistry>,
    /// The configured orchestrator ready to run resyncs.
    pub orchestrator: BulkSyncOrchestrator,
    /// `None` when syncing is disabled.
    pub agent: Option<ChangeSyncAgent>,
}

impl Dependencies {
    /// Wire everything from a settings snapshot.
    ///
    /// Search clients are created lazily on first use, so no connection is
    /// attempted here.
    pub fn new(settings: SyncSettings) -> Self {
        let settings = Arc::new(settings);
        let clients = Arc::new(ClientRegistry::new(Arc::clone(&settings)));
        Self::with_clients(settings, clients)
    }

    /// Wire everything around an existing client registry.
    pub fn with_clients(settings: Arc<SyncSettings>, clients: Arc<ClientRegistry>) -> Self {
        info!(
            connection = %settings.connection,
            chunk_size = settings.bulk_sync.chunk_size,
            disabled = settings.disabled,
            "Initializing dependencies"
        );

        let registry = Arc::new(IndexConfigRegistry::new(Arc::clone(&settings)));
        let projector = DocumentProjector::new(Arc::clone(&registry));

        let orchestrator = BulkSyncOrchestrator::new(projector.clone(), Arc::clone(&clients));

        let sink: Arc<dyn SyncEventSink> = Arc::new(TracingEventSink);
        let agent = ChangeSyncAgent::attach(projector, Arc::clone(&clients))
            .map(|agent| agent.with_sink(sink));

        Self {
            settings,
            registry,
            clients,
            orchestrator,
            agent,
        }
    }

    /// Route the default connection to `client`.
    pub fn with_default_client(self, client: Arc<dyn SearchClient>) -> Self {
        self.clients.insert(self.settings.connection.clone(), client);
        self
    }
}
