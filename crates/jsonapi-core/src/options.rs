//! Per-request options and the query they serialize to.

use crate::form::{FormData, FormValue};
use crate::query::{set_nested, Filter, QueryMap};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

/// How the body of a request is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    /// No body.
    None,
    /// URL-encoded form fields.
    Form,
    /// Multipart parts; chosen whenever a form value is a file.
    Multipart,
    /// JSON payload.
    Json,
}

/// Accumulated state for one JSON:API request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Relationship paths for `include`.
    pub includes: Vec<String>,
    /// Sparse fieldsets keyed by resource type.
    pub fields: Vec<(String, Vec<String>)>,
    /// Filters keyed by resource type.
    pub filters: Vec<(String, Filter)>,
    /// Free-form query, lowest precedence.
    pub query: QueryMap,
    /// Page size; zero means unset.
    pub limit: u64,
    /// Page offset; zero means unset.
    pub offset: u64,
    /// Bearer token.
    pub token: Option<SecretString>,
    /// Form fields.
    pub form: Option<FormData>,
    /// JSON payload.
    pub json: Option<Value>,
    /// Whether the response adapter raises on non-success statuses.
    pub throw_on_error: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            includes: Vec::new(),
            fields: Vec::new(),
            filters: Vec::new(),
            query: QueryMap::new(),
            limit: 0,
            offset: 0,
            token: None,
            form: None,
            json: None,
            throw_on_error: true,
        }
    }
}

impl RequestOptions {
    /// Create empty options that raise on error responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoding the body will use.
    #[must_use]
    pub fn body_mode(&self) -> BodyMode {
        let form = self.form.as_deref().unwrap_or_default();
        if form.iter().any(|(_, value)| value.is_file()) {
            BodyMode::Multipart
        } else if self.json.is_some() {
            BodyMode::Json
        } else if self.form.is_some() {
            BodyMode::Form
        } else {
            BodyMode::None
        }
    }

    /// Returns true if any form value is a file.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.body_mode() == BodyMode::Multipart
    }

    /// Request headers: `Authorization: Bearer <token>` when a non-empty
    /// token is set, nothing otherwise.
    #[must_use]
    pub fn headers(&self) -> Vec<(String, String)> {
        match &self.token {
            Some(token) if !token.expose_secret().is_empty() => vec![(
                "Authorization".to_string(),
                format!("Bearer {}", token.expose_secret()),
            )],
            _ => Vec::new(),
        }
    }

    /// Build the nested query.
    ///
    /// Precedence from low to high: free-form query, `page`, `filter`,
    /// `fields`, `include`. Zero `limit`/`offset` values are treated as unset.
    #[must_use]
    pub fn build_query(&self) -> QueryMap {
        let mut query = self.query.clone();

        if self.limit != 0 || self.offset != 0 {
            let mut page = QueryMap::new();
            if self.limit != 0 {
                page.insert("limit".to_string(), Value::from(self.limit));
            }
            if self.offset != 0 {
                page.insert("offset".to_string(), Value::from(self.offset));
            }
            query.insert("page".to_string(), Value::Object(page));
        }

        for (resource, filter) in &self.filters {
            match filter {
                Filter::Columns(columns) => {
                    for column in columns {
                        for (operand, value) in &column.operands {
                            set_nested(
                                &mut query,
                                &[
                                    "filter",
                                    resource.as_str(),
                                    column.column.as_str(),
                                    operand.as_str(),
                                ],
                                value.to_query_value(),
                            );
                        }
                    }
                }
                Filter::Shorthand(value) => {
                    set_nested(&mut query, &["filter", resource.as_str()], value.clone());
                }
            }
        }

        for (resource, field_list) in &self.fields {
            set_nested(
                &mut query,
                &["fields", resource.as_str()],
                Value::String(field_list.join(",")),
            );
        }

        if !self.includes.is_empty() {
            query.insert(
                "include".to_string(),
                Value::String(self.includes.join(",")),
            );
        }

        query
    }
}

/// Free-function form of [`RequestOptions::build_query`].
#[must_use]
pub fn build_query(options: &RequestOptions) -> QueryMap {
    options.build_query()
}

/// Form values that make the request multipart.
#[must_use]
pub fn file_fields(form: &[(String, FormValue)]) -> Vec<&str> {
    form.iter()
        .filter(|(_, value)| value.is_file())
        .map(|(name, _)| name.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FileHandle;
    use crate::query::QueryParams;
    use serde_json::json;

    fn params(options: &RequestOptions) -> QueryParams {
        QueryParams::from_map(&options.build_query())
    }

    #[test]
    fn includes_are_comma_joined() {
        let options = RequestOptions {
            includes: vec!["author".into(), "comments.author".into()],
            ..RequestOptions::default()
        };
        assert_eq!(params(&options).get("include"), Some("author,comments.author"));
    }

    #[test]
    fn empty_includes_omit_the_key() {
        let query = RequestOptions::new().build_query();
        assert!(!query.contains_key("include"));
        assert!(query.is_empty());
    }

    #[test]
    fn zero_offset_is_omitted() {
        let options = RequestOptions {
            limit: 5,
            offset: 0,
            ..RequestOptions::default()
        };
        let query = options.build_query();
        assert_eq!(query.get("page"), Some(&json!({"limit": 5})));
    }

    #[test]
    fn offset_without_limit_is_emitted_alone() {
        let options = RequestOptions {
            offset: 20,
            ..RequestOptions::default()
        };
        assert_eq!(options.build_query().get("page"), Some(&json!({"offset": 20})));
    }

    #[test]
    fn page_replaces_free_query_page() {
        let options = RequestOptions {
            query: json!({"page": {"number": 3}, "sort": "-created"})
                .as_object()
                .cloned()
                .unwrap(),
            limit: 10,
            offset: 30,
            ..RequestOptions::default()
        };
        let query = options.build_query();
        assert_eq!(query.get("page"), Some(&json!({"limit": 10, "offset": 30})));
        assert_eq!(query.get("sort"), Some(&json!("-created")));
    }

    #[test]
    fn scalar_operand_is_kept_verbatim() {
        let options = RequestOptions {
            filters: vec![("posts".into(), Filter::column("title", "eq", "a,b"))],
            ..RequestOptions::default()
        };
        assert_eq!(params(&options).get("filter[posts][title][eq]"), Some("a,b"));
    }

    #[test]
    fn list_operand_is_comma_joined() {
        let options = RequestOptions {
            filters: vec![("posts".into(), Filter::column("title", "in", ["a", "b"]))],
            ..RequestOptions::default()
        };
        assert_eq!(params(&options).get("filter[posts][title][in]"), Some("a,b"));
    }

    #[test]
    fn shorthand_filter_bypasses_nesting() {
        let options = RequestOptions {
            filters: vec![("posts".into(), Filter::from("published"))],
            ..RequestOptions::default()
        };
        let query = options.build_query();
        assert_eq!(query.get("filter"), Some(&json!({"posts": "published"})));
    }

    #[test]
    fn filters_merge_into_free_query_filter_group() {
        let options = RequestOptions {
            query: json!({"filter": {"tags": "rust"}}).as_object().cloned().unwrap(),
            filters: vec![("posts".into(), Filter::column("id", "gt", 10_i64))],
            ..RequestOptions::default()
        };
        let query = options.build_query();
        assert_eq!(
            query.get("filter"),
            Some(&json!({"tags": "rust", "posts": {"id": {"gt": 10}}}))
        );
    }

    #[test]
    fn fields_are_comma_joined_per_resource() {
        let options = RequestOptions {
            fields: vec![
                ("posts".into(), vec!["title".into(), "body".into()]),
                ("people".into(), vec!["name".into()]),
            ],
            ..RequestOptions::default()
        };
        let params = params(&options);
        assert_eq!(params.get("fields[posts]"), Some("title,body"));
        assert_eq!(params.get("fields[people]"), Some("name"));
    }

    #[test]
    fn include_overrides_free_query_include() {
        let options = RequestOptions {
            query: json!({"include": "tags"}).as_object().cloned().unwrap(),
            includes: vec!["author".into()],
            ..RequestOptions::default()
        };
        assert_eq!(options.build_query().get("include"), Some(&json!("author")));
    }

    #[test]
    fn headers_carry_bearer_token() {
        let options = RequestOptions {
            token: Some(SecretString::from("abc".to_string())),
            ..RequestOptions::default()
        };
        assert_eq!(
            options.headers(),
            vec![("Authorization".to_string(), "Bearer abc".to_string())]
        );
        assert!(RequestOptions::new().headers().is_empty());
    }

    #[test]
    fn empty_token_counts_as_unset() {
        let options = RequestOptions {
            token: Some(SecretString::from(String::new())),
            ..RequestOptions::default()
        };
        assert!(options.headers().is_empty());
    }

    #[test]
    fn body_mode_selection() {
        let mut options = RequestOptions::new();
        assert_eq!(options.body_mode(), BodyMode::None);

        options.form = Some(vec![("title".into(), FormValue::from("Hi"))]);
        assert_eq!(options.body_mode(), BodyMode::Form);

        options.json = Some(json!({"data": {}}));
        assert_eq!(options.body_mode(), BodyMode::Json);

        options.form = Some(vec![(
            "avatar".into(),
            FormValue::from(FileHandle::new("/tmp/a.png", "a.png")),
        )]);
        assert_eq!(options.body_mode(), BodyMode::Multipart);
        assert!(options.is_multipart());
        assert_eq!(file_fields(options.form.as_deref().unwrap()), vec!["avatar"]);
    }

    #[test]
    fn throws_by_default() {
        assert!(RequestOptions::default().throw_on_error);
    }
}
