//! Record source capability used by the bulk resync.
//!
//! A source knows one entity type, can count its records and hands them out
//! page by page. Pages are requested in order and never overlap.

use async_trait::async_trait;
use search_sync_shared::{EntityType, Record};

use crate::errors::SyncError;

/// Paginated access to all records of one entity type.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// The entity type every record in this source belongs to.
    fn entity_type(&self) -> &EntityType;

    /// Natural storage name of the records, used as the fallback index name.
    fn storage_name(&self) -> &str;

    /// Total number of records.
    async fn count(&self) -> Result<usize, SyncError>;

    /// Records `offset..offset + limit`. A short or empty page ends iteration.
    async fn page(&self, offset: usize, limit: usize) -> Result<Vec<Box<dyn Record>>, SyncError>;
}
