//! # jsonapi-core
//!
//! Core types and utilities for talking to JSON:API endpoints.
//!
//! This crate provides the error type, configuration, query model and the
//! transport contract that the request composer in `jsonapi-client` builds on.
//!
//! ## Modules
//!
//! - [`error`] - Error type and conversions
//! - [`config`] - Client configuration
//! - [`query`] - Filters and bracket-encoded query serialization
//! - [`options`] - Per-request options and query building
//! - [`form`] - Form values, file handles and multipart preparation
//! - [`transport`] - Transport trait and request/response data
//! - [`document`] - JSON:API document model

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod document;
pub mod error;
pub mod form;
pub mod options;
pub mod query;
pub mod transport;

// Re-export commonly used types
pub use config::ClientConfig;
pub use document::{Document, ErrorObject, PrimaryData, Resource, ResourceIdentifier};
pub use error::{Error, Result};
pub use form::{FileHandle, FormData, FormValue};
pub use options::{build_query, BodyMode, RequestOptions};
pub use query::{ColumnFilter, Filter, Operand, QueryMap, QueryParams};
pub use transport::{
    MultipartPart, PartContents, RawResponse, RequestBody, Transport, TransportRequest,
};
