//! Named connection registry.
//!
//! Index configurations refer to connections by name. The registry resolves a
//! name to a shared client, building an `OpenSearchClient` from the configured
//! endpoint the first time a name is requested.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use search_sync_shared::SyncSettings;
use tracing::{debug, warn};

use crate::errors::SearchError;
use crate::interfaces::SearchClient;
use crate::opensearch::OpenSearchClient;

/// Resolves connection names to clients.
///
/// Clients are created lazily and cached; explicitly inserted clients take
/// precedence over configured endpoints, which is how tests inject mocks.
pub struct ClientRegistry {
    settings: Arc<SyncSettings>,
    clients: Mutex<HashMap<String, Arc<dyn SearchClient>>>,
}

impl ClientRegistry {
    pub fn new(settings: Arc<SyncSettings>) -> Self {
        Self {
            settings,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Builder form of [`ClientRegistry::insert`].
    pub fn with_client(self, name: impl Into<String>, client: Arc<dyn SearchClient>) -> Self {
        self.insert(name, client);
        self
    }

    /// Register a client under `name`, replacing any cached one.
    pub fn insert(&self, name: impl Into<String>, client: Arc<dyn SearchClient>) {
        self.clients.lock().insert(name.into(), client);
    }

    /// Resolve `name` to a client.
    ///
    /// # Returns
    ///
    /// * `Ok(client)` - A cached, injected or newly built client
    /// * `Err(SearchError::ConnectionError)` - If the name is not configured
    ///   or the endpoint URL is invalid
    pub fn client(&self, name: &str) -> Result<Arc<dyn SearchClient>, SearchError> {
        let mut clients = self.clients.lock();
        if let Some(client) = clients.get(name) {
            return Ok(Arc::clone(client));
        }

        let Some(endpoint) = self.settings.connection_settings(name) else {
            warn!(connection = %name, "Unknown search connection");
            return Err(SearchError::connection(format!(
                "Connection '{}' is not configured",
                name
            )));
        };

        debug!(connection = %name, url = %endpoint.url(), "Building search client");
        let client: Arc<dyn SearchClient> = Arc::new(OpenSearchClient::new(&endpoint.url())?);
        clients.insert(name.to_string(), Arc::clone(&client));
        Ok(client)
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SearchRequest, SearchResponse};
    use async_trait::async_trait;
    use search_sync_shared::ConnectionSettings;

    struct StaticClient;

    #[async_trait]
    impl SearchClient for StaticClient {
        async fn send(&self, _request: SearchRequest) -> Result<SearchResponse, SearchError> {
            Ok(SearchResponse::new(200, "{}"))
        }
    }

    #[test]
    fn test_injected_client_is_returned() {
        let injected: Arc<dyn SearchClient> = Arc::new(StaticClient);
        let registry = ClientRegistry::new(Arc::new(SyncSettings::default()))
            .with_client("default", Arc::clone(&injected));

        let resolved = registry.client("default").unwrap();
        assert!(Arc::ptr_eq(&resolved, &injected));
    }

    #[test]
    fn test_unknown_connection_is_an_error() {
        let registry = ClientRegistry::new(Arc::new(SyncSettings::default()));
        let result = registry.client("missing");
        assert!(matches!(result, Err(SearchError::ConnectionError(_))));
    }

    #[test]
    fn test_configured_connection_is_built_once() {
        let mut settings = SyncSettings::default();
        settings.connections.insert(
            "secondary".to_string(),
            ConnectionSettings {
                scheme: "http".to_string(),
                host: "search.internal".to_string(),
                port: 9201,
            },
        );
        let registry = ClientRegistry::new(Arc::new(settings));

        let first = registry.client("secondary").unwrap();
        let second = registry.client("secondary").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
