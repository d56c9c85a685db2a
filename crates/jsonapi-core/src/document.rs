//! JSON:API document model.
//!
//! These types cover the top-level members a server may return: primary
//! `data`, `included` resources, `errors`, `meta`, `links` and the `jsonapi`
//! object. Unknown members are ignored.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level JSON:API document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Primary data; `None` when absent or `null`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PrimaryData>,
    /// Related resources side-loaded through `include`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<Resource>,
    /// Error objects.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorObject>,
    /// Non-standard meta information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
    /// Links related to the primary data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Map<String, Value>>,
    /// Server implementation details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonapi: Option<Value>,
}

/// Primary data: a single resource or a collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PrimaryData {
    /// Resource collection.
    Many(Vec<Resource>),
    /// Single resource.
    One(Box<Resource>),
}

/// A resource object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    /// Resource type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Resource id; absent on client-generated payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Attributes.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    /// Relationships keyed by name.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub relationships: Map<String, Value>,
    /// Resource links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Map<String, Value>>,
    /// Resource meta.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

impl Resource {
    /// Look up a single attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Deserialize the attributes object into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the attributes do not match `T`.
    pub fn attributes_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.attributes.clone())).map_err(Error::from)
    }

    /// Identifiers linked through the named relationship.
    #[must_use]
    pub fn related(&self, name: &str) -> Vec<ResourceIdentifier> {
        let data = self
            .relationships
            .get(name)
            .and_then(|relationship| relationship.get("data"));
        match data {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
            Some(item @ Value::Object(_)) => serde_json::from_value(item.clone())
                .map(|identifier| vec![identifier])
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}

/// Resource linkage inside a relationship.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceIdentifier {
    /// Resource type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Resource id.
    pub id: String,
}

/// A JSON:API error object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ErrorObject {
    /// Unique identifier for this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// HTTP status as a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Application-specific error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Occurrence-specific explanation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Pointer to the offending part of the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
    /// Non-standard meta information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

impl ErrorObject {
    /// Human-readable message: `detail`, else `title`, else `code`.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.detail
            .as_deref()
            .or(self.title.as_deref())
            .or(self.code.as_deref())
    }
}

/// Reference to the source of an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorSource {
    /// JSON pointer into the request document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
    /// Query parameter that caused the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

impl Document {
    /// Parse a response body. Blank bodies yield an empty document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the body is not a JSON:API document.
    pub fn parse(body: &str) -> Result<Self> {
        if body.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(body).map_err(Error::from)
    }

    /// Primary resources as a flat list.
    #[must_use]
    pub fn resources(&self) -> Vec<&Resource> {
        match &self.data {
            Some(PrimaryData::Many(resources)) => resources.iter().collect(),
            Some(PrimaryData::One(resource)) => vec![resource.as_ref()],
            None => Vec::new(),
        }
    }

    /// Find a side-loaded resource by type and id.
    #[must_use]
    pub fn find_included(&self, kind: &str, id: &str) -> Option<&Resource> {
        self.included
            .iter()
            .find(|resource| resource.kind == kind && resource.id.as_deref() == Some(id))
    }

    /// Returns true if the document carries error objects.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// All error messages joined with `"; "`.
    #[must_use]
    pub fn error_summary(&self) -> Option<String> {
        let messages: Vec<&str> = self.errors.iter().filter_map(ErrorObject::message).collect();
        if messages.is_empty() {
            None
        } else {
            Some(messages.join("; "))
        }
    }
}
