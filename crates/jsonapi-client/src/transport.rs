//! reqwest-backed [`Transport`].

use crate::Result;
use async_trait::async_trait;
use jsonapi_core::{
    ClientConfig, Error, MultipartPart, PartContents, RawResponse, RequestBody, Transport,
    TransportRequest,
};
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Media type of JSON:API documents.
pub const JSONAPI_MEDIA_TYPE: &str = "application/vnd.api+json";

/// Transport sending requests through a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
    base_url: Option<Url>,
}

impl ReqwestTransport {
    /// Build a transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let base_url = config.parse_base_url()?;

        let mut builder = ClientBuilder::new()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(10));

        if !config.tls_verify {
            warn!("TLS verification disabled for JSON:API client");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().map_err(|err| {
            Error::ConfigError(format!("Failed to build JSON:API HTTP client: {err}"))
        })?;

        Ok(Self { http, base_url })
    }

    /// Wrap an existing reqwest client.
    #[must_use]
    pub fn with_client(http: Client, base_url: Option<Url>) -> Self {
        Self { http, base_url }
    }

    /// Return the base URL.
    #[must_use]
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Resolve `url` against the base URL. Absolute URLs pass through and a
    /// leading `/` on relative paths is ignored so they stay below the base.
    fn resolve(&self, url: &str) -> Result<Url> {
        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => base.join(url.trim_start_matches('/')).map_err(Error::from),
                None => Err(Error::InvalidEndpoint(format!(
                    "relative URL `{url}` without a base URL"
                ))),
            },
            Err(err) => Err(err.into()),
        }
    }
}

fn multipart_form(parts: Vec<MultipartPart>) -> Form {
    parts.into_iter().fold(Form::new(), |form, part| {
        let mut body = match part.contents {
            PartContents::Text(text) => Part::text(text),
            PartContents::File(file) => Part::stream(file),
        };
        if let Some(filename) = part.filename {
            body = body.file_name(filename);
        }
        form.part(part.name, body)
    })
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse> {
        let url = self.resolve(&request.url)?;
        let params = request.query_params().into_pairs();

        let mut builder = self
            .http
            .request(request.method, url)
            .header(ACCEPT, JSONAPI_MEDIA_TYPE);
        if !params.is_empty() {
            builder = builder.query(&params);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        // A JSON payload takes the body; form fields and parts are dropped.
        builder = match (request.json, request.body) {
            (Some(json), body) => {
                if !matches!(body, RequestBody::None) {
                    debug!("JSON payload replaces form body");
                }
                builder.json(&json)
            }
            (None, RequestBody::Multipart(parts)) => builder.multipart(multipart_form(parts)),
            (None, RequestBody::Form(fields)) if !fields.is_empty() => builder.form(&fields),
            (None, _) => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
