//! JSON:API client and per-request composer.

use crate::response::{JsonApiAdapter, ResponseAdapter};
use crate::transport::ReqwestTransport;
use crate::Result;
use jsonapi_core::form::{open_multipart, url_encoded_fields};
use jsonapi_core::options::file_fields;
use jsonapi_core::{
    ClientConfig, Error, Filter, FormValue, QueryMap, RequestBody, RequestOptions, Transport,
    TransportRequest,
};
use reqwest::Method;
use secrecy::SecretString;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Builder for [`JsonApiClient`].
#[derive(Debug, Clone, Default)]
pub struct JsonApiClientBuilder {
    config: ClientConfig,
}

impl JsonApiClientBuilder {
    /// Create a builder from configuration.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Set the default bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.config = self.config.with_token(token);
        self
    }

    /// Enable or disable the per-request trace line.
    #[must_use]
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.config = self.config.with_logging(enabled);
        self
    }

    /// Set the request timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.config = self.config.with_timeout(seconds);
        self
    }

    /// Build a client backed by [`ReqwestTransport`].
    pub fn build(self) -> Result<JsonApiClient> {
        let transport = ReqwestTransport::from_config(&self.config)?;
        Ok(self.build_with_transport(transport))
    }

    /// Build a client backed by a custom transport.
    pub fn build_with_transport<T: Transport>(self, transport: T) -> JsonApiClient<T> {
        JsonApiClient {
            transport: Arc::new(transport),
            adapter: Arc::new(JsonApiAdapter),
            config: self.config,
        }
    }
}

/// Reusable JSON:API client.
///
/// Cloning is cheap; the transport and adapter are shared. Every call to
/// [`request`](Self::request) starts an independent [`RequestBuilder`].
pub struct JsonApiClient<T = ReqwestTransport, A = JsonApiAdapter> {
    transport: Arc<T>,
    adapter: Arc<A>,
    config: ClientConfig,
}

impl<T, A> Clone for JsonApiClient<T, A> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            adapter: Arc::clone(&self.adapter),
            config: self.config.clone(),
        }
    }
}

impl JsonApiClient {
    /// Construct a client for the API at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        JsonApiClientBuilder::new(ClientConfig::new(base_url)?).build()
    }

    /// Construct a client directly from configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        JsonApiClientBuilder::new(config.clone()).build()
    }

    /// Start a builder pre-populated with the provided configuration.
    #[must_use]
    pub fn builder(config: ClientConfig) -> JsonApiClientBuilder {
        JsonApiClientBuilder::new(config)
    }
}

impl<T: Transport, A: ResponseAdapter> JsonApiClient<T, A> {
    /// Swap the response adapter.
    #[must_use]
    pub fn with_adapter<B: ResponseAdapter>(self, adapter: B) -> JsonApiClient<T, B> {
        JsonApiClient {
            transport: self.transport,
            adapter: Arc::new(adapter),
            config: self.config,
        }
    }

    /// Client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The transport requests are dispatched through.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The adapter responses are wrapped with.
    #[must_use]
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Start composing a request. The default token, if any, is pre-set.
    #[must_use]
    pub fn request(&self) -> RequestBuilder<'_, T, A> {
        let options = RequestOptions {
            token: self.config.token.clone(),
            ..RequestOptions::default()
        };
        RequestBuilder {
            client: self,
            options,
            json_error: None,
        }
    }
}

/// Composes a single request and dispatches it with a terminal verb.
///
/// Every `with_*` setter replaces what was set before.
#[must_use = "a request does nothing until a verb such as `get` is awaited"]
pub struct RequestBuilder<'a, T, A> {
    client: &'a JsonApiClient<T, A>,
    options: RequestOptions,
    json_error: Option<Error>,
}

impl<'a, T: Transport, A: ResponseAdapter> RequestBuilder<'a, T, A> {
    /// Relationship paths to side-load.
    pub fn with_includes<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.includes = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Sparse fieldsets keyed by resource type.
    pub fn with_fields<I, K, F, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, F)>,
        K: Into<String>,
        F: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.fields = fields
            .into_iter()
            .map(|(resource, list)| {
                (resource.into(), list.into_iter().map(Into::into).collect())
            })
            .collect();
        self
    }

    /// Filters keyed by resource type.
    pub fn with_filters<I, K, V>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Filter>,
    {
        self.options.filters = filters
            .into_iter()
            .map(|(resource, filter)| (resource.into(), filter.into()))
            .collect();
        self
    }

    /// Free-form query parameters, overridden by everything else.
    pub fn with_query<I, K, V>(mut self, query: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.options.query = query
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect::<QueryMap>();
        self
    }

    /// Pagination window. Zero values are left out of the query.
    pub fn limit(mut self, limit: u64, offset: u64) -> Self {
        self.options.limit = limit;
        self.options.offset = offset;
        self
    }

    /// Page size starting at offset zero.
    pub fn page(self, limit: u64) -> Self {
        self.limit(limit, 0)
    }

    /// Bearer token, replacing the client default.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.options.token = Some(SecretString::from(token.into()));
        self
    }

    /// Whether error statuses are raised by the response adapter.
    pub fn throw_exception(mut self, enabled: bool) -> Self {
        self.options.throw_on_error = enabled;
        self
    }

    /// Form fields. Any file value makes the body multipart.
    pub fn form_data<I, K, V>(mut self, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FormValue>,
    {
        self.options.form = Some(
            data.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        );
        self
    }

    /// JSON payload. A value serializing to `null` clears the payload.
    /// Serialization errors surface when the request is sent.
    pub fn json_data<S: Serialize + ?Sized>(mut self, data: &S) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => {
                self.options.json = (!value.is_null()).then_some(value);
                self.json_error = None;
            }
            Err(err) => self.json_error = Some(Error::Serialization(err.to_string())),
        }
        self
    }

    /// Options collected so far.
    #[must_use]
    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// Nested query the request would be sent with.
    #[must_use]
    pub fn build_query(&self) -> QueryMap {
        self.options.build_query()
    }

    /// Send a `GET` request.
    pub async fn get(self, url: &str) -> Result<A::Response> {
        self.request(Method::GET, url).await
    }

    /// Send a `POST` request.
    pub async fn post(self, url: &str) -> Result<A::Response> {
        self.request(Method::POST, url).await
    }

    /// Send a `PATCH` request.
    pub async fn patch(self, url: &str) -> Result<A::Response> {
        self.request(Method::PATCH, url).await
    }

    /// Send a `DELETE` request.
    pub async fn delete(self, url: &str) -> Result<A::Response> {
        self.request(Method::DELETE, url).await
    }

    /// Send the request with an arbitrary method.
    ///
    /// Transport and adapter errors are returned unchanged.
    pub async fn request(self, method: Method, url: &str) -> Result<A::Response> {
        if let Some(err) = self.json_error {
            return Err(err);
        }
        let options = self.options;

        let mut request = TransportRequest::new(method.clone(), url);
        request.headers = options.headers();
        request.query = options.build_query();
        request.json = options.json.clone();
        request.body = match &options.form {
            Some(form) if options.is_multipart() => {
                debug!(files = ?file_fields(form), "opening multipart uploads");
                RequestBody::Multipart(open_multipart(form).await?)
            }
            Some(form) => RequestBody::Form(url_encoded_fields(form)),
            None => RequestBody::None,
        };

        let raw = self.client.transport.send(request).await?;

        if self.client.config.log_requests {
            debug!("JSONAPI: {method} {url}");
        }

        self.client.adapter.adapt(raw, options.throw_on_error)
    }
}
