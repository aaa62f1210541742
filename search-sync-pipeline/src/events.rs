//! Outcome events for incremental pushes.
//!
//! The change agent reports every push to an optional [`SyncEventSink`].
//! Failures are reported here and also returned to the caller.

use chrono::{DateTime, Utc};
use search_sync_repository::{SearchError, SearchResponse};
use search_sync_shared::EntityType;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Which push an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOperation {
    Save,
    Delete,
}

/// Where a pushed document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTarget {
    pub entity_type: EntityType,
    pub index: String,
    pub id: String,
}

/// Outcome of one incremental push.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    Saved {
        target: DocumentTarget,
        response: SearchResponse,
        at: DateTime<Utc>,
    },
    Deleted {
        target: DocumentTarget,
        response: SearchResponse,
        at: DateTime<Utc>,
    },
    Failed {
        operation: SyncOperation,
        target: DocumentTarget,
        error: SearchError,
        at: DateTime<Utc>,
    },
}

impl SyncEvent {
    pub fn succeeded(operation: SyncOperation, target: DocumentTarget, response: SearchResponse) -> Self {
        let at = Utc::now();
        match operation {
            SyncOperation::Save => SyncEvent::Saved { target, response, at },
            SyncOperation::Delete => SyncEvent::Deleted { target, response, at },
        }
    }

    pub fn failed(operation: SyncOperation, target: DocumentTarget, error: SearchError) -> Self {
        SyncEvent::Failed {
            operation,
            target,
            error,
            at: Utc::now(),
        }
    }

    pub fn target(&self) -> &DocumentTarget {
        match self {
            SyncEvent::Saved { target, .. }
            | SyncEvent::Deleted { target, .. }
            | SyncEvent::Failed { target, .. } => target,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SyncEvent::Failed { .. })
    }
}

/// Receives push outcomes. Called after the response settles.
pub trait SyncEventSink: Send + Sync {
    fn emit(&self, event: SyncEvent);
}

/// Logs every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl SyncEventSink for TracingEventSink {
    fn emit(&self, event: SyncEvent) {
        match &event {
            SyncEvent::Saved { target, response, .. } => info!(
                entity_type = %target.entity_type,
                index = %target.index,
                id = %target.id,
                status = response.status,
                "Document saved"
            ),
            SyncEvent::Deleted { target, response, .. } => info!(
                entity_type = %target.entity_type,
                index = %target.index,
                id = %target.id,
                status = response.status,
                "Document deleted"
            ),
            SyncEvent::Failed { operation, target, error, .. } => warn!(
                entity_type = %target.entity_type,
                index = %target.index,
                id = %target.id,
                operation = ?operation,
                error = %error,
                "Document push failed"
            ),
        }
    }
}

/// Forwards events to a tokio channel. Events are dropped once the receiver
/// is gone.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    sender: mpsc::UnboundedSender<SyncEvent>,
}

impl ChannelEventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl SyncEventSink for ChannelEventSink {
    fn emit(&self, event: SyncEvent) {
        if self.sender.send(event).is_err() {
            warn!("Sync event receiver dropped");
        }
    }
}
