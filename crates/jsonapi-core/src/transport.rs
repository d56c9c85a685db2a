//! Transport contract between the request composer and the HTTP stack.
//!
//! A [`TransportRequest`] is plain data describing one outbound call. The
//! transport owns connection handling, TLS and timeouts and hands back a
//! [`RawResponse`].

use crate::error::Result;
use crate::query::{QueryMap, QueryParams};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;

/// Contents of one multipart part.
#[derive(Debug)]
pub enum PartContents {
    /// Text field value.
    Text(String),
    /// Open handle to the file content, closed when dropped.
    File(tokio::fs::File),
}

/// One part of a multipart body.
#[derive(Debug)]
pub struct MultipartPart {
    /// Field name.
    pub name: String,
    /// Part payload.
    pub contents: PartContents,
    /// Client-supplied file name for file parts.
    pub filename: Option<String>,
}

/// Form-style body of a request.
#[derive(Debug, Default)]
pub enum RequestBody {
    /// No form data was attached.
    #[default]
    None,
    /// URL-encoded fields, possibly empty.
    Form(Vec<(String, String)>),
    /// Multipart parts.
    Multipart(Vec<MultipartPart>),
}

/// Description of a single outbound HTTP request.
#[derive(Debug)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL or a path relative to the transport's base URL.
    pub url: String,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// Nested query, flattened with bracket encoding on the wire.
    pub query: QueryMap,
    /// JSON payload. Independent of `body`.
    pub json: Option<Value>,
    /// Form or multipart payload.
    pub body: RequestBody,
}

impl TransportRequest {
    /// Create a request without headers, query or body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: QueryMap::new(),
            json: None,
            body: RequestBody::None,
        }
    }

    /// Look up a header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Flattened query pairs.
    #[must_use]
    pub fn query_params(&self) -> QueryParams {
        QueryParams::from_map(&self.query)
    }

    /// Multipart parts, if the body is multipart.
    #[must_use]
    pub fn multipart_parts(&self) -> Option<&[MultipartPart]> {
        match &self.body {
            RequestBody::Multipart(parts) => Some(parts),
            _ => None,
        }
    }
}

/// Unparsed HTTP response as returned by a transport.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body text.
    pub body: String,
}

impl RawResponse {
    /// Create a response with no headers.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

/// HTTP transport used to dispatch composed requests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return the raw response.
    async fn send(&self, request: TransportRequest) -> Result<RawResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse> {
        (**self).send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTransport;

    #[async_trait]
    impl Transport for EchoTransport {
        async fn send(&self, request: TransportRequest) -> Result<RawResponse> {
            Ok(RawResponse::new(
                StatusCode::OK,
                format!("{} {}", request.method, request.url),
            ))
        }
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut request = TransportRequest::new(Method::GET, "/posts");
        request
            .headers
            .push(("Authorization".to_string(), "Bearer abc".to_string()));
        assert_eq!(request.header("authorization"), Some("Bearer abc"));
        assert_eq!(request.header("accept"), None);
    }

    #[test]
    fn query_params_flatten_nested_query() {
        let mut request = TransportRequest::new(Method::GET, "/posts");
        request
            .query
            .insert("page".to_string(), json!({"limit": 10}));
        assert_eq!(request.query_params().get("page[limit]"), Some("10"));
        assert!(request.multipart_parts().is_none());
    }

    #[test]
    fn arc_transport_delegates() {
        let transport: Arc<dyn Transport> = Arc::new(EchoTransport);
        let response = tokio_test::block_on(
            transport.send(TransportRequest::new(Method::DELETE, "/posts/1")),
        )
        .unwrap();
        assert_eq!(response.body, "DELETE /posts/1");
    }
}
