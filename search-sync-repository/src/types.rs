//! Request and response types for the search engine wire protocol.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{json, Value};

use crate::errors::SearchError;
use search_sync_shared::Document;

/// Bytes kept verbatim in a path segment; everything else is
/// percent-encoded, including `/`, `?` and `#`.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// HTTP methods used by the sync protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Put,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

/// A single request against the search engine's HTTP surface.
///
/// Paths always start with `/` and are joined onto the connection's base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Vec<u8>>,
}

impl SearchRequest {
    /// `DELETE /{index}`
    pub fn delete_index(index: &str) -> Self {
        Self {
            method: Method::Delete,
            path: format!("/{}", encode_segment(index)),
            body: None,
        }
    }

    /// `POST /_bulk` with a raw NDJSON body. A trailing newline is appended
    /// when missing.
    pub fn bulk(body: impl Into<Vec<u8>>) -> Self {
        let mut body = body.into();
        if body.last() != Some(&b'\n') {
            body.push(b'\n');
        }
        Self {
            method: Method::Post,
            path: "/_bulk".to_string(),
            body: Some(body),
        }
    }

    /// `PUT /{index}/_doc/{id}` with the document as body.
    pub fn put_document(index: &str, id: &str, document: &Document) -> Result<Self, SearchError> {
        let body = document
            .to_json()
            .map_err(|e| SearchError::serialization(e.to_string()))?;
        Ok(Self {
            method: Method::Put,
            path: document_path(index, id),
            body: Some(body.into_bytes()),
        })
    }

    /// `DELETE /{index}/_doc/{id}`
    pub fn delete_document(index: &str, id: &str) -> Self {
        Self {
            method: Method::Delete,
            path: document_path(index, id),
            body: None,
        }
    }

    /// The body as UTF-8 text, if any.
    pub fn body_text(&self) -> Option<&str> {
        self.body
            .as_deref()
            .and_then(|body| std::str::from_utf8(body).ok())
    }
}

fn document_path(index: &str, id: &str) -> String {
    format!("/{}/_doc/{}", encode_segment(index), encode_segment(id))
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// A settled response from the search engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResponse {
    pub status: u16,
    pub body: String,
}

impl SearchResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> Result<Value, SearchError> {
        serde_json::from_str(&self.body).map_err(|e| SearchError::parse(e.to_string()))
    }

    /// Number of items a `_bulk` response reports as failed.
    ///
    /// Returns 0 when the response does not flag errors or is not JSON.
    pub fn bulk_failures(&self) -> usize {
        let Ok(body) = self.json() else {
            return 0;
        };
        if !body.get("errors").and_then(Value::as_bool).unwrap_or(false) {
            return 0;
        }
        body.get("items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter(|item| {
                        item.as_object()
                            .and_then(|op| op.values().next())
                            .and_then(|result| result.get("error"))
                            .is_some()
                    })
                    .count()
            })
            .unwrap_or(0)
    }
}

/// NDJSON buffer for one `_bulk` request.
///
/// Each indexed document contributes two lines: the action/metadata line and
/// the document itself.
#[derive(Debug, Clone, Default)]
pub struct BulkBody {
    buffer: String,
    documents: usize,
}

impl BulkBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an `index` action for `document` under `id`.
    pub fn push_index(&mut self, index: &str, id: &str, document: &Document) -> Result<(), SearchError> {
        let action = json!({"index": {"_index": index, "_id": id}});
        let source = document
            .to_json()
            .map_err(|e| SearchError::serialization(e.to_string()))?;

        self.buffer.push_str(&action.to_string());
        self.buffer.push('\n');
        self.buffer.push_str(&source);
        self.buffer.push('\n');
        self.documents += 1;
        Ok(())
    }

    /// Number of documents in the buffer.
    pub fn len(&self) -> usize {
        self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.documents == 0
    }

    /// Number of NDJSON lines in the buffer.
    pub fn line_count(&self) -> usize {
        self.documents * 2
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Turn the buffer into a `POST /_bulk` request.
    pub fn into_request(self) -> SearchRequest {
        SearchRequest::bulk(self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(id: i64, name: &str) -> Document {
        let mut doc = Document::new();
        doc.insert("id", json!(id));
        doc.insert("name", json!(name));
        doc
    }

    #[test]
    fn test_document_requests() {
        let put = SearchRequest::put_document("users", "7", &document(7, "acme")).unwrap();
        assert_eq!(put.method, Method::Put);
        assert_eq!(put.path, "/users/_doc/7");
        assert_eq!(put.body_text(), Some(r#"{"id":7,"name":"acme"}"#));

        let delete = SearchRequest::delete_document("users", "7");
        assert_eq!(delete.method, Method::Delete);
        assert_eq!(delete.path, "/users/_doc/7");
        assert!(delete.body.is_none());

        let drop = SearchRequest::delete_index("users");
        assert_eq!(drop.path, "/users");
        assert!(drop.body.is_none());
    }

    #[test]
    fn test_paths_encode_segments() {
        let delete = SearchRequest::delete_document("users", "a/b?x");
        assert_eq!(delete.path, "/users/_doc/a%2Fb%3Fx");

        let put = SearchRequest::put_document("users", "John Smith#1", &document(1, "a")).unwrap();
        assert_eq!(put.path, "/users/_doc/John%20Smith%231");

        let put = SearchRequest::put_document("users", "a-1_b.c~d", &document(1, "a")).unwrap();
        assert_eq!(put.path, "/users/_doc/a-1_b.c~d");

        assert_eq!(SearchRequest::delete_index("my index").path, "/my%20index");
    }

    #[test]
    fn test_bulk_appends_trailing_newline() {
        let request = SearchRequest::bulk("{\"index\":{}}\n{}");
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.path, "/_bulk");
        assert_eq!(request.body_text(), Some("{\"index\":{}}\n{}\n"));

        let request = SearchRequest::bulk("{}\n");
        assert_eq!(request.body_text(), Some("{}\n"));
    }

    #[test]
    fn test_bulk_body_lines() {
        let mut body = BulkBody::new();
        body.push_index("users", "1", &document(1, "a")).unwrap();
        body.push_index("users", "2", &document(2, "b")).unwrap();

        assert_eq!(body.len(), 2);
        assert_eq!(body.line_count(), 4);

        let request = body.into_request();
        let text = request.body_text().unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], r#"{"index":{"_index":"users","_id":"1"}}"#);
        assert_eq!(lines[1], r#"{"id":1,"name":"a"}"#);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_bulk_failures() {
        let ok = SearchResponse::new(200, r#"{"errors":false,"items":[]}"#);
        assert_eq!(ok.bulk_failures(), 0);

        let partial = SearchResponse::new(
            200,
            r#"{"errors":true,"items":[
                {"index":{"_id":"1","status":201}},
                {"index":{"_id":"2","status":400,"error":{"type":"mapper_parsing_exception"}}}
            ]}"#,
        );
        assert_eq!(partial.bulk_failures(), 1);

        assert_eq!(SearchResponse::new(200, "not json").bulk_failures(), 0);
    }
}
