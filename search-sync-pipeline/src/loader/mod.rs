//! Loader module for the search sync pipeline.
//!
//! Pushes single records to the search index when they are saved or deleted.

use std::sync::Arc;

use search_sync_repository::{ClientRegistry, SearchRequest, SearchResponse};
use search_sync_shared::Record;
use tracing::{debug, info, instrument, warn};

use crate::errors::SyncError;
use crate::events::{DocumentTarget, SyncEvent, SyncEventSink, SyncOperation};
use crate::processor::DocumentProjector;

/// Incremental push for record lifecycle events.
///
/// Every push completes only after the search engine answers, so awaiting
/// pushes in sequence keeps them in order. Spawn them to overlap.
pub struct ChangeSyncAgent {
    projector: DocumentProjector,
    clients: Arc<ClientRegistry>,
    sink: Option<Arc<dyn SyncEventSink>>,
}

impl ChangeSyncAgent {
    pub fn new(projector: DocumentProjector, clients: Arc<ClientRegistry>) -> Self {
        Self {
            projector,
            clients,
            sink: None,
        }
    }

    /// Create an agent unless syncing is disabled in the settings.
    pub fn attach(projector: DocumentProjector, clients: Arc<ClientRegistry>) -> Option<Self> {
        if projector.registry().settings().disabled {
            info!("Search sync disabled, lifecycle hooks not attached");
            return None;
        }
        Some(Self::new(projector, clients))
    }

    /// Report push outcomes to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn SyncEventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Upsert the record's document with `PUT /{index}/_doc/{id}`.
    ///
    /// # Returns
    ///
    /// * `Ok(SearchResponse)` - The settled response
    /// * `Err(SyncError::Mapping)` - If the document has no id; nothing is sent
    /// * `Err(SyncError::Transport)` - If the request failed
    #[instrument(skip(self, record), fields(entity_type = %record.entity_type()))]
    pub async fn on_saved(&self, record: &dyn Record) -> Result<SearchResponse, SyncError> {
        self.push(SyncOperation::Save, record).await
    }

    /// Remove the record's document with `DELETE /{index}/_doc/{id}`.
    #[instrument(skip(self, record), fields(entity_type = %record.entity_type()))]
    pub async fn on_deleted(&self, record: &dyn Record) -> Result<SearchResponse, SyncError> {
        self.push(SyncOperation::Delete, record).await
    }

    async fn push(&self, operation: SyncOperation, record: &dyn Record) -> Result<SearchResponse, SyncError> {
        let config = self.projector.registry().get(record.entity_type());
        let document = DocumentProjector::project_with(&config, record)?;

        let field_id = config.field_id();
        let id = document
            .id_value(&field_id)
            .ok_or_else(|| SyncError::missing_id(&field_id))?;
        let index = config.index(Some(record.storage_name()))?;
        let client = config.client(&self.clients)?;

        let request = match operation {
            SyncOperation::Save => SearchRequest::put_document(&index, &id, &document)
                .map_err(|e| SyncError::serialization(e.to_string()))?,
            SyncOperation::Delete => SearchRequest::delete_document(&index, &id),
        };

        let target = DocumentTarget {
            entity_type: record.entity_type().clone(),
            index,
            id,
        };

        match client.send(request).await {
            Ok(response) => {
                debug!(
                    index = %target.index,
                    id = %target.id,
                    status = response.status,
                    "Document push settled"
                );
                self.emit(SyncEvent::succeeded(operation, target, response.clone()));
                Ok(response)
            }
            Err(e) => {
                warn!(
                    index = %target.index,
                    id = %target.id,
                    error = %e,
                    "Document push failed"
                );
                self.emit(SyncEvent::failed(operation, target, e.clone()));
                Err(e.into())
            }
        }
    }

    fn emit(&self, event: SyncEvent) {
        if let Some(sink) = &self.sink {
            sink.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChannelEventSink;
    use crate::registry::IndexConfigRegistry;
    use crate::testing::{clients_with, CountingClient, MockSearchClient};
    use search_sync_repository::{Method, SearchClient, SearchError};
    use search_sync_shared::{EntityType, JsonRecord, SyncSettings};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn agent(settings: SyncSettings) -> (Option<ChangeSyncAgent>, Arc<MockSearchClient>) {
        let settings = Arc::new(settings);
        let client = Arc::new(MockSearchClient::new());
        let registry = Arc::new(IndexConfigRegistry::new(Arc::clone(&settings)));
        let agent = ChangeSyncAgent::attach(
            DocumentProjector::new(registry),
            clients_with(settings, Arc::clone(&client)),
        );
        (agent, client)
    }

    fn user(id: Value) -> JsonRecord {
        JsonRecord::from_value("App\\User", "users", json!({"id": id, "name": "acme"}))
    }

    #[tokio::test]
    async fn test_on_saved_puts_document() {
        let (agent, client) = agent(SyncSettings::default());
        let (sink, mut events) = ChannelEventSink::new();
        let agent = agent.unwrap().with_sink(Arc::new(sink));

        agent.on_saved(&user(json!(1))).await.unwrap();

        let requests = client.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Put);
        assert_eq!(requests[0].path, "/users/_doc/1");
        assert_eq!(requests[0].body_text(), Some(r#"{"id":1,"name":"acme"}"#));

        let event = events.recv().await.unwrap();
        assert!(matches!(event, SyncEvent::Saved { .. }));
        assert_eq!(event.target().index, "users");
    }

    #[tokio::test]
    async fn test_on_deleted_sends_no_body() {
        let (agent, client) = agent(SyncSettings::default());
        let (sink, mut events) = ChannelEventSink::new();
        let agent = agent.unwrap().with_sink(Arc::new(sink));

        agent.on_deleted(&user(json!("abc"))).await.unwrap();

        let requests = client.requests().await;
        assert_eq!(requests[0].method, Method::Delete);
        assert_eq!(requests[0].path, "/users/_doc/abc");
        assert!(requests[0].body.is_none());
        assert!(matches!(events.recv().await.unwrap(), SyncEvent::Deleted { .. }));
    }

    #[tokio::test]
    async fn test_missing_id_never_reaches_transport() {
        let (agent, client) = agent(SyncSettings::default());
        let agent = agent.unwrap();

        for id in [Value::Null, json!("")] {
            let saved = agent.on_saved(&user(id.clone())).await;
            assert!(matches!(saved, Err(SyncError::Mapping(_))));
            let deleted = agent.on_deleted(&user(id)).await;
            assert!(matches!(deleted, Err(SyncError::Mapping(_))));
        }

        let record = JsonRecord::from_value("App\\User", "users", json!({"name": "no id"}));
        assert!(matches!(agent.on_saved(&record).await, Err(SyncError::Mapping(_))));

        assert!(client.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_returned_and_reported() {
        let (agent, client) = agent(SyncSettings::default());
        let (sink, mut events) = ChannelEventSink::new();
        let agent = agent.unwrap().with_sink(Arc::new(sink));
        client.respond(Err(SearchError::status(503, "unavailable"))).await;

        let result = agent.on_saved(&user(json!(1))).await;
        assert!(matches!(
            result,
            Err(SyncError::Transport(SearchError::Status { status: 503, .. }))
        ));

        let event = events.recv().await.unwrap();
        assert!(matches!(
            event,
            SyncEvent::Failed { operation: SyncOperation::Save, .. }
        ));
    }

    #[tokio::test]
    async fn test_sequential_pushes_keep_order() {
        let (agent, client) = agent(SyncSettings::default());
        let agent = agent.unwrap();

        agent.on_saved(&user(json!(1))).await.unwrap();
        agent.on_saved(&user(json!(2))).await.unwrap();
        agent.on_deleted(&user(json!(1))).await.unwrap();

        let paths: Vec<(Method, String)> = client
            .requests()
            .await
            .into_iter()
            .map(|request| (request.method, request.path))
            .collect();
        assert_eq!(
            paths,
            vec![
                (Method::Put, "/users/_doc/1".to_string()),
                (Method::Put, "/users/_doc/2".to_string()),
                (Method::Delete, "/users/_doc/1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_custom_id_field_and_extras() {
        let (agent, client) = agent(SyncSettings::default());
        let agent = agent.unwrap();
        let record = JsonRecord::from_value("App\\User", "users", json!({"name": "acme"}));
        agent
            .projector
            .registry()
            .get(record.entity_type())
            .set_field_id("slug")
            .add_extra_with("slug", |record| {
                json!(record.attribute("name").and_then(|v| v.as_str().map(str::to_uppercase)))
            });

        agent.on_saved(&record).await.unwrap();

        let requests = client.requests().await;
        assert_eq!(requests[0].path, "/users/_doc/ACME");
        assert_eq!(requests[0].body_text(), Some(r#"{"name":"acme","slug":"ACME"}"#));
    }

    #[tokio::test]
    async fn test_push_uses_wrapped_connection() {
        let (agent, client) = agent(SyncSettings::default());
        let agent = agent.unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        agent
            .projector
            .registry()
            .get(&EntityType::new("App\\User"))
            .wrap_connection(move |inner| {
                Arc::new(CountingClient::new(inner, Arc::clone(&counter))) as Arc<dyn SearchClient>
            });

        agent.on_saved(&user(json!(1))).await.unwrap();
        agent.on_deleted(&user(json!(1))).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(client.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn test_push_encodes_document_id() {
        let (agent, client) = agent(SyncSettings::default());
        let agent = agent.unwrap();

        agent.on_deleted(&user(json!("a/b?x"))).await.unwrap();

        let requests = client.requests().await;
        assert_eq!(requests[0].path, "/users/_doc/a%2Fb%3Fx");
    }

    #[test]
    fn test_attach_disabled_returns_none() {
        let settings = SyncSettings {
            disabled: true,
            ..SyncSettings::default()
        };
        let (agent, _client) = agent(settings);
        assert!(agent.is_none());
    }
}
