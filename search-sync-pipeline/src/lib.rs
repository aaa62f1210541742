//! # Search Sync Pipeline
//!
//! This crate keeps a search index in step with relational records.
//!
//! ## Architecture
//!
//! 1. **Registry**: Per-entity-type index configuration
//! 2. **Processor**: Projects records into documents
//! 3. **Orchestrator**: Full resync in chunked `_bulk` requests
//! 4. **Loader**: Incremental push on save and delete

pub mod errors;
pub mod events;
pub mod loader;
pub mod orchestrator;
pub mod processor;
pub mod progress;
pub mod registry;
pub mod source;

#[cfg(test)]
mod testing;

pub use errors::SyncError;
pub use events::{ChannelEventSink, DocumentTarget, SyncEvent, SyncEventSink, SyncOperation, TracingEventSink};
pub use loader::ChangeSyncAgent;
pub use orchestrator::{BulkSyncOrchestrator, BulkSyncSummary};
pub use processor::DocumentProjector;
pub use progress::{LogProgress, ProgressReporter};
pub use registry::{IndexConfig, IndexConfigRegistry};
pub use source::RecordSource;
