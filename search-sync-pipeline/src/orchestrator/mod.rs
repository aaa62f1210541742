//! Orchestrator module for the search sync pipeline.
//!
//! Runs full resyncs: drop the index, then rebuild it from a record source
//! in chunked `_bulk` requests. Also ingests prepared NDJSON bulk files.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use search_sync_repository::{BulkBody, ClientRegistry, SearchClient, SearchRequest, SearchResponse};
use search_sync_shared::SyncSettings;
use tracing::{debug, info, instrument, warn};

use crate::errors::SyncError;
use crate::processor::DocumentProjector;
use crate::progress::{LogProgress, ProgressReporter};
use crate::source::RecordSource;

/// Result of one resync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkSyncSummary {
    /// Index that was rebuilt.
    pub index: String,
    /// Documents sent.
    pub documents: usize,
    /// Records left out by the entity type's record filter.
    pub skipped: usize,
    /// `_bulk` requests sent.
    pub batches: usize,
    /// Items the search engine reported as failed.
    pub failed_items: usize,
}

impl BulkSyncSummary {
    fn new(index: String) -> Self {
        Self {
            index,
            documents: 0,
            skipped: 0,
            batches: 0,
            failed_items: 0,
        }
    }
}

/// Full resync for one entity type at a time.
///
/// Chunks are sent in iteration order with one request in flight; a chunk's
/// records are projected before its request is built.
pub struct BulkSyncOrchestrator {
    projector: DocumentProjector,
    clients: Arc<ClientRegistry>,
    chunk_size: usize,
}

impl BulkSyncOrchestrator {
    /// Create an orchestrator using `bulk_sync.chunk_size` from the settings.
    pub fn new(projector: DocumentProjector, clients: Arc<ClientRegistry>) -> Self {
        let chunk_size = projector.registry().settings().bulk_sync.chunk_size;
        Self::with_chunk_size(projector, clients, chunk_size)
    }

    /// Create an orchestrator with an explicit chunk size (at least 1).
    pub fn with_chunk_size(
        projector: DocumentProjector,
        clients: Arc<ClientRegistry>,
        chunk_size: usize,
    ) -> Self {
        Self {
            projector,
            clients,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn settings(&self) -> &SyncSettings {
        self.projector.registry().settings()
    }

    /// Rebuild the index for `source`'s entity type, logging progress.
    #[instrument(skip(self, source), fields(entity_type = %source.entity_type()))]
    pub async fn resync(&self, source: &dyn RecordSource) -> Result<BulkSyncSummary, SyncError> {
        let mut progress = LogProgress::new();
        self.resync_with_progress(source, &mut progress).await
    }

    /// Rebuild the index for `source`'s entity type.
    ///
    /// # Arguments
    ///
    /// * `source` - Records of one entity type
    /// * `progress` - Advanced once per fetched record
    ///
    /// # Returns
    ///
    /// * `Ok(BulkSyncSummary)` - Counts for the run
    /// * `Err(SyncError)` - Configuration, source, id or transport failure;
    ///   the run stops at the failing chunk
    pub async fn resync_with_progress(
        &self,
        source: &dyn RecordSource,
        progress: &mut dyn ProgressReporter,
    ) -> Result<BulkSyncSummary, SyncError> {
        let config = self.projector.registry().get(source.entity_type());
        let index = config.index(Some(source.storage_name()))?;
        let field_id = config.field_id();
        let client = config.client(&self.clients)?;

        self.drop_index(client.as_ref(), &index).await;

        let total = source.count().await?;
        progress.start(&index, total);

        let mut summary = BulkSyncSummary::new(index.clone());
        let mut offset = 0;

        loop {
            let records = source.page(offset, self.chunk_size).await?;
            if records.is_empty() {
                break;
            }
            let fetched = records.len();

            let mut body = BulkBody::new();
            for record in &records {
                progress.advance(1);
                if !config.includes(record.as_ref()) {
                    summary.skipped += 1;
                    continue;
                }
                let document = DocumentProjector::project_with(&config, record.as_ref())?;
                let id = document
                    .id_value(&field_id)
                    .ok_or_else(|| SyncError::missing_id(&field_id))?;
                body.push_index(&index, &id, &document)
                    .map_err(|e| SyncError::serialization(e.to_string()))?;
            }

            if !body.is_empty() {
                let documents = body.len();
                debug!(index = %index, offset = offset, documents = documents, "Sending bulk chunk");
                let response = client.send(body.into_request()).await?;

                summary.batches += 1;
                summary.documents += documents;

                let failed = response.bulk_failures();
                if failed > 0 {
                    warn!(index = %index, offset = offset, failed = failed, "Bulk chunk had failed items");
                    summary.failed_items += failed;
                }
            }

            offset += fetched;
            if fetched < self.chunk_size {
                break;
            }
        }

        progress.finish();
        info!(
            index = %summary.index,
            documents = summary.documents,
            skipped = summary.skipped,
            batches = summary.batches,
            failed_items = summary.failed_items,
            "Resync complete"
        );

        Ok(summary)
    }

    async fn drop_index(&self, client: &dyn SearchClient, index: &str) {
        match client.send(SearchRequest::delete_index(index)).await {
            Ok(_) => info!(index = %index, "Dropped index"),
            Err(e) if e.is_not_found() => debug!(index = %index, "Index did not exist"),
            Err(e) => info!(index = %index, error = %e, "Could not drop index"),
        }
    }

    /// Send a prepared NDJSON file as one `_bulk` request on the default
    /// connection.
    ///
    /// # Returns
    ///
    /// * `Ok(SearchResponse)` - The bulk response
    /// * `Err(SyncError::ResourceNotFound)` - If the file does not exist
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn ingest_resource(&self, path: &Path) -> Result<SearchResponse, SyncError> {
        let body = match tokio::fs::read(path).await {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SyncError::ResourceNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        let client = self.clients.client(&self.settings().connection)?;
        let response = client.send(SearchRequest::bulk(body)).await?;

        let failed = response.bulk_failures();
        if failed > 0 {
            warn!(failed = failed, "Bulk resource had failed items");
        }
        info!(status = response.status, "Bulk resource ingested");

        Ok(response)
    }
}
