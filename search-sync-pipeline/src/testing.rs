//! Test doubles shared by the pipeline's unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use search_sync_repository::{ClientRegistry, SearchClient, SearchError, SearchRequest, SearchResponse};
use search_sync_shared::{EntityType, JsonRecord, Record, SyncSettings};
use tokio::sync::Mutex;

use crate::errors::SyncError;
use crate::source::RecordSource;

/// Records every request and answers from a queue of scripted results,
/// falling back to `200 {}`.
pub struct MockSearchClient {
    pub requests: Arc<Mutex<Vec<SearchRequest>>>,
    responses: Mutex<VecDeque<Result<SearchResponse, SearchError>>>,
}

impl MockSearchClient {
    pub fn new() -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            responses: Mutex::new(VecDeque::new()),
        }
    }

    pub async fn respond(&self, result: Result<SearchResponse, SearchError>) {
        self.responses.lock().await.push_back(result);
    }

    pub async fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl SearchClient for MockSearchClient {
    async fn send(&self, request: SearchRequest) -> Result<SearchResponse, SearchError> {
        self.requests.lock().await.push(request);
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(SearchResponse::new(200, "{}")))
    }
}

/// Forwards to an inner client, counting requests.
pub struct CountingClient {
    inner: Arc<dyn SearchClient>,
    calls: Arc<AtomicUsize>,
}

impl CountingClient {
    pub fn new(inner: Arc<dyn SearchClient>, calls: Arc<AtomicUsize>) -> Self {
        Self { inner, calls }
    }
}

#[async_trait]
impl SearchClient for CountingClient {
    async fn send(&self, request: SearchRequest) -> Result<SearchResponse, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.send(request).await
    }
}

/// Registry whose default connection is `client`.
pub fn clients_with(settings: Arc<SyncSettings>, client: Arc<MockSearchClient>) -> Arc<ClientRegistry> {
    let default = settings.connection.clone();
    Arc::new(ClientRegistry::new(settings).with_client(default, client))
}

/// In-memory record source.
pub struct VecSource {
    entity_type: EntityType,
    storage_name: String,
    records: Vec<JsonRecord>,
}

impl VecSource {
    pub fn new(records: Vec<JsonRecord>) -> Self {
        Self {
            entity_type: EntityType::new("App\\User"),
            storage_name: "users".to_string(),
            records,
        }
    }

    /// `count` users with ids `1..=count`.
    pub fn users(count: usize) -> Self {
        Self::new(
            (1..=count)
                .map(|id| {
                    JsonRecord::from_value(
                        "App\\User",
                        "users",
                        serde_json::json!({"id": id, "name": format!("user {}", id)}),
                    )
                })
                .collect(),
        )
    }
}

#[async_trait]
impl RecordSource for VecSource {
    fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    fn storage_name(&self) -> &str {
        &self.storage_name
    }

    async fn count(&self) -> Result<usize, SyncError> {
        Ok(self.records.len())
    }

    async fn page(&self, offset: usize, limit: usize) -> Result<Vec<Box<dyn Record>>, SyncError> {
        Ok(self
            .records
            .iter()
            .skip(offset)
            .take(limit)
            .map(|record| Box::new(record.clone()) as Box<dyn Record>)
            .collect())
    }
}
