//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchClient` using
//! the OpenSearch Rust client's raw `send` API, so the sync protocol controls
//! method, path and body exactly.

use async_trait::async_trait;
use opensearch::{
    http::{
        headers::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
        transport::{SingleNodeConnectionPool, TransportBuilder},
        Method as HttpMethod,
    },
    OpenSearch,
};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::errors::SearchError;
use crate::interfaces::SearchClient;
use crate::types::{Method, SearchRequest, SearchResponse};

/// OpenSearch-backed search client for a single node.
///
/// # Example
///
/// ```ignore
/// let client = OpenSearchClient::new("http://localhost:9200/")?;
/// client.send(SearchRequest::delete_index("users")).await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
    url: Url,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200/")
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchError)` - If the URL is invalid or transport setup fails
    pub fn new(url: &str) -> Result<Self, SearchError> {
        let parsed_url = Url::parse(url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url.clone());
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %parsed_url, "Created OpenSearch client");

        Ok(Self {
            client,
            url: parsed_url,
        })
    }

    /// Base URL this client talks to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    fn http_method(method: Method) -> HttpMethod {
        match method {
            Method::Put => HttpMethod::Put,
            Method::Post => HttpMethod::Post,
            Method::Delete => HttpMethod::Delete,
        }
    }

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }
}

#[async_trait]
impl SearchClient for OpenSearchClient {
    /// Send a request and wait for the response.
    ///
    /// Non-2xx statuses are returned as `SearchError::Status` with the
    /// response body; callers decide whether a status such as 404 is fatal.
    #[instrument(skip(self, request), fields(method = request.method.as_str(), path = %request.path))]
    async fn send(&self, request: SearchRequest) -> Result<SearchResponse, SearchError> {
        let response = self
            .client
            .send(
                Self::http_method(request.method),
                &request.path,
                Self::json_headers(),
                Option::<&()>::None,
                request.body,
                None,
            )
            .await
            .map_err(|e| SearchError::request(e.to_string()))?;

        let status = response.status_code().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::request(e.to_string()))?;

        if !(200..300).contains(&status) {
            warn!(status = status, body = %body, "Request failed");
            return Err(SearchError::status(status, body));
        }

        debug!(status = status, "Request settled");
        Ok(SearchResponse::new(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_url() {
        let result = OpenSearchClient::new("not a url");
        assert!(matches!(result, Err(SearchError::ConnectionError(_))));
    }

    #[test]
    fn test_new_keeps_url() {
        let client = OpenSearchClient::new("http://localhost:9200/").unwrap();
        assert_eq!(client.url().as_str(), "http://localhost:9200/");
    }

    #[test]
    fn test_http_method_mapping() {
        assert_eq!(OpenSearchClient::http_method(Method::Put), HttpMethod::Put);
        assert_eq!(OpenSearchClient::http_method(Method::Post), HttpMethod::Post);
        assert_eq!(OpenSearchClient::http_method(Method::Delete), HttpMethod::Delete);
    }

    #[test]
    fn test_json_headers() {
        let headers = OpenSearchClient::json_headers();
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(headers.get(ACCEPT).unwrap(), "application/json");
    }
}
