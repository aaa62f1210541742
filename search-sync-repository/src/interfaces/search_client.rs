//! Search client trait definition.
//!
//! This module defines the abstract transport used by the sync pipeline,
//! allowing for different backend implementations (OpenSearch, mocks, etc.).

use async_trait::async_trait;

use crate::errors::SearchError;
use crate::types::{SearchRequest, SearchResponse};

/// Abstract interface for the search engine's HTTP surface.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// A non-2xx answer is an error: implementations return
/// `Err(SearchError::Status { .. })` carrying the status and body, so callers
/// decide per call site which statuses are acceptable.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Send a request and wait for the response to settle.
    ///
    /// # Arguments
    ///
    /// * `request` - Method, path and optional body
    ///
    /// # Returns
    ///
    /// * `Ok(SearchResponse)` - A 2xx response
    /// * `Err(SearchError)` - Network failure or non-2xx status
    ///
    /// # Example
    ///
    /// ```ignore
    /// let response = client.send(SearchRequest::delete_index("users")).await?;
    /// ```
    async fn send(&self, request: SearchRequest) -> Result<SearchResponse, SearchError>;
}
