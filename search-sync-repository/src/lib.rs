//! # Search Sync Repository
//!
//! This crate provides the transport seam between the sync pipeline and the
//! search engine. It includes the [`SearchClient`] trait, the wire request
//! and response types, the error type, an OpenSearch-backed client, and a
//! registry resolving connection names to clients.

pub mod connections;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod types;

pub use connections::ClientRegistry;
pub use errors::SearchError;
pub use interfaces::SearchClient;
pub use opensearch::OpenSearchClient;
pub use types::{BulkBody, Method, SearchRequest, SearchResponse};
