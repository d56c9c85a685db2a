//! Response adapters.
//!
//! A [`ResponseAdapter`] turns the transport's [`RawResponse`] into whatever
//! the caller works with. The default [`JsonApiAdapter`] parses the body as a
//! JSON:API document and, unless told otherwise, raises on error statuses.

use crate::Result;
use jsonapi_core::document::{Document, ErrorObject, PrimaryData, Resource};
use jsonapi_core::{Error, RawResponse};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Wraps a raw transport response for the caller.
pub trait ResponseAdapter: Send + Sync {
    /// Response type handed back from the terminal verbs.
    type Response;

    /// Construct and prepare the response.
    ///
    /// With `throw_on_error` set, a failed status becomes an `Err`; otherwise
    /// the error state is carried by the returned response.
    fn adapt(&self, raw: RawResponse, throw_on_error: bool) -> Result<Self::Response>;
}

/// Adapter producing [`JsonApiResponse`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonApiAdapter;

impl ResponseAdapter for JsonApiAdapter {
    type Response = JsonApiResponse;

    fn adapt(&self, raw: RawResponse, throw_on_error: bool) -> Result<JsonApiResponse> {
        let mut response = JsonApiResponse::new(raw, throw_on_error);
        response.prepare()?;
        Ok(response)
    }
}

/// A response from a JSON:API endpoint.
#[derive(Debug, Clone)]
pub struct JsonApiResponse {
    raw: RawResponse,
    throw_on_error: bool,
    document: Document,
    parse_error: Option<Error>,
}

impl JsonApiResponse {
    /// Wrap a raw response. Call [`prepare`](Self::prepare) before use.
    #[must_use]
    pub fn new(raw: RawResponse, throw_on_error: bool) -> Self {
        Self {
            raw,
            throw_on_error,
            document: Document::default(),
            parse_error: None,
        }
    }

    /// Parse the body and apply the error policy.
    ///
    /// # Errors
    ///
    /// When raising is enabled, returns the error mapped from a failed status,
    /// or [`Error::ParseError`] if a successful response is not a JSON:API
    /// document.
    pub fn prepare(&mut self) -> Result<()> {
        match Document::parse(&self.raw.body) {
            Ok(document) => {
                self.document = document;
                self.parse_error = None;
            }
            Err(err) => {
                self.document = Document::default();
                self.parse_error = Some(err);
            }
        }

        if !self.throw_on_error {
            return Ok(());
        }
        if let Some(err) = self.error() {
            return Err(err);
        }
        match &self.parse_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// HTTP status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.raw.status
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.raw.status.is_success()
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.raw.headers
    }

    /// Raw body text.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.raw.body
    }

    /// Parsed document; empty if the body could not be parsed.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Primary data.
    #[must_use]
    pub fn data(&self) -> Option<&PrimaryData> {
        self.document.data.as_ref()
    }

    /// Primary resources as a flat list.
    #[must_use]
    pub fn resources(&self) -> Vec<&Resource> {
        self.document.resources()
    }

    /// Side-loaded resources.
    #[must_use]
    pub fn included(&self) -> &[Resource] {
        &self.document.included
    }

    /// Error objects returned by the server.
    #[must_use]
    pub fn errors(&self) -> &[ErrorObject] {
        &self.document.errors
    }

    /// Top-level meta.
    #[must_use]
    pub fn meta(&self) -> Option<&Map<String, Value>> {
        self.document.meta.as_ref()
    }

    /// Error the body failed to parse with, if any.
    #[must_use]
    pub fn parse_error(&self) -> Option<&Error> {
        self.parse_error.as_ref()
    }

    /// The error a failed status maps to; `None` for 2xx responses.
    #[must_use]
    pub fn error(&self) -> Option<Error> {
        if self.is_success() {
            return None;
        }
        let message = self
            .document
            .error_summary()
            .or_else(|| {
                let text = self.raw.body.trim();
                (!text.is_empty()).then(|| text.to_string())
            })
            .unwrap_or_else(|| {
                self.raw
                    .status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string()
            });
        Some(map_status_to_error(self.raw.status, message))
    }

    /// Deserialize the primary `data` member into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the data does not match `T`.
    pub fn deserialize_data<T: DeserializeOwned>(&self) -> Result<T> {
        let data = serde_json::to_value(&self.document.data)?;
        serde_json::from_value(data).map_err(Error::from)
    }

    /// Give back the raw response.
    #[must_use]
    pub fn into_raw(self) -> RawResponse {
        self.raw
    }
}

fn map_status_to_error(status: StatusCode, text: String) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound(text),
        StatusCode::BAD_REQUEST => Error::BadRequest(text),
        StatusCode::UNPROCESSABLE_ENTITY => Error::ValidationError(text),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Unauthorized(text),
        StatusCode::CONFLICT => Error::Conflict(text),
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => {
            Error::ServiceUnavailable(format!("temporarily unavailable: {text}"))
        }
        status if status.is_server_error() => {
            Error::ServiceUnavailable(format!("server error {status}: {text}"))
        }
        _ => Error::HttpError(format!("error {status}: {text}")),
    }
}
