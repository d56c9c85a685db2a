//! Fluent client for JSON:API endpoints.
//!
//! Compose includes, sparse fieldsets, filters and pagination on a
//! [`RequestBuilder`], attach a bearer token and a form, multipart or JSON
//! payload, then dispatch with `get`, `post`, `patch` or `delete`.
//!
//! ```no_run
//! use jsonapi_client::{Filter, JsonApiClient};
//!
//! # async fn run() -> jsonapi_client::Result<()> {
//! let client = JsonApiClient::new("https://api.example.com")?;
//! let posts = client
//!     .request()
//!     .token("secret")
//!     .with_includes(["author"])
//!     .with_filters([("posts", Filter::column("status", "in", ["draft", "live"]))])
//!     .limit(10, 20)
//!     .get("posts")
//!     .await?;
//! println!("{} posts", posts.resources().len());
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod client;
pub mod response;
pub mod transport;

pub use client::{JsonApiClient, JsonApiClientBuilder, RequestBuilder};
pub use jsonapi_core::{
    ClientConfig, Error, FileHandle, Filter, FormValue, Operand, RawResponse, Transport,
    TransportRequest,
};
pub use response::{JsonApiAdapter, JsonApiResponse, ResponseAdapter};
pub use transport::ReqwestTransport;

/// Convenient result alias that reuses the shared error type.
pub type Result<T> = jsonapi_core::Result<T>;
