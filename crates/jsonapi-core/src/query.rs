//! JSON:API query model and bracket-encoded serialization.
//!
//! Queries are assembled as a nested [`QueryMap`] (see
//! [`RequestOptions::build_query`](crate::options::RequestOptions::build_query))
//! and flattened into `key[sub][leaf]=value` pairs right before they hit the wire.

use serde_json::Value;

/// Nested query structure, kept in insertion order.
pub type QueryMap = serde_json::Map<String, Value>;

/// Value of a single filter operand such as `eq` or `in`.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Sent as-is.
    Single(Value),
    /// Comma-joined into one value. Strings, numbers and booleans are joined
    /// in their query form; nulls, arrays and objects become empty entries.
    List(Vec<Value>),
}

impl Operand {
    /// Render the operand as it appears in the nested query.
    #[must_use]
    pub fn to_query_value(&self) -> Value {
        match self {
            Self::Single(value) => value.clone(),
            Self::List(values) => Value::String(
                values
                    .iter()
                    .map(|value| scalar_to_string(value).unwrap_or_default())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
        }
    }
}

impl From<&str> for Operand {
    fn from(value: &str) -> Self {
        Self::Single(Value::String(value.to_string()))
    }
}

impl From<String> for Operand {
    fn from(value: String) -> Self {
        Self::Single(Value::String(value))
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Self::Single(Value::from(value))
    }
}

impl From<bool> for Operand {
    fn from(value: bool) -> Self {
        Self::Single(Value::Bool(value))
    }
}

impl<V: Into<Value>> From<Vec<V>> for Operand {
    fn from(values: Vec<V>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<Value>, const N: usize> From<[V; N]> for Operand {
    fn from(values: [V; N]) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(values) => Self::List(values),
            other => Self::Single(other),
        }
    }
}

/// Operands applied to one column of a filtered resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFilter {
    /// Column (attribute) name.
    pub column: String,
    /// Operand name paired with its value, in insertion order.
    pub operands: Vec<(String, Operand)>,
}

/// Filter applied to one resource type.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `filter[resource]=value`, bypassing column/operand nesting.
    Shorthand(Value),
    /// `filter[resource][column][operand]=value`.
    Columns(Vec<ColumnFilter>),
}

impl Filter {
    /// Shorthand filter that sets `filter[resource]` directly.
    pub fn shorthand(value: impl Into<Value>) -> Self {
        Self::Shorthand(value.into())
    }

    /// Start a column filter with a single operand.
    pub fn column(
        column: impl Into<String>,
        operand: impl Into<String>,
        value: impl Into<Operand>,
    ) -> Self {
        Self::Columns(Vec::new()).and(column, operand, value)
    }

    /// Add another operand. Operands on an existing column are appended to it;
    /// a shorthand filter is replaced by the column form.
    #[must_use]
    pub fn and(
        self,
        column: impl Into<String>,
        operand: impl Into<String>,
        value: impl Into<Operand>,
    ) -> Self {
        let mut columns = match self {
            Self::Columns(columns) => columns,
            Self::Shorthand(_) => Vec::new(),
        };
        let column = column.into();
        let entry = (operand.into(), value.into());

        match columns.iter_mut().find(|existing| existing.column == column) {
            Some(existing) => existing.operands.push(entry),
            None => columns.push(ColumnFilter {
                column,
                operands: vec![entry],
            }),
        }

        Self::Columns(columns)
    }
}

impl From<&str> for Filter {
    fn from(value: &str) -> Self {
        Self::shorthand(value)
    }
}

impl From<String> for Filter {
    fn from(value: String) -> Self {
        Self::shorthand(value)
    }
}

/// Permissive conversion from loosely shaped JSON.
///
/// Objects become column filters; column entries that are not objects are
/// skipped. Anything else becomes a shorthand filter.
impl From<Value> for Filter {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(columns) => Self::Columns(
                columns
                    .into_iter()
                    .filter_map(|(column, operands)| match operands {
                        Value::Object(operands) => Some(ColumnFilter {
                            column,
                            operands: operands
                                .into_iter()
                                .map(|(operand, value)| (operand, Operand::from(value)))
                                .collect(),
                        }),
                        _ => None,
                    })
                    .collect(),
            ),
            other => Self::Shorthand(other),
        }
    }
}

/// Set `path` inside `map`, creating groups on the way. Non-group values in
/// the way are replaced by groups.
pub(crate) fn set_nested(map: &mut QueryMap, path: &[&str], value: Value) {
    match path {
        [] => {}
        [last] => {
            map.insert((*last).to_string(), value);
        }
        [head, rest @ ..] => {
            let slot = map.entry((*head).to_string()).or_insert(Value::Null);
            if let Value::Object(group) = slot {
                set_nested(group, rest, value);
            } else {
                let mut group = QueryMap::new();
                set_nested(&mut group, rest, value);
                *slot = Value::Object(group);
            }
        }
    }
}

/// String form of a scalar; `None` for null, arrays and objects.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) => Some("0".to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Flat, ordered list of bracket-encoded query pairs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Create a new, empty list.
    #[must_use]
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Flatten a nested query. Nulls are dropped, arrays use numeric indices.
    #[must_use]
    pub fn from_map(query: &QueryMap) -> Self {
        let mut params = Self::new();
        for (key, value) in query {
            params.push_value(key.clone(), value);
        }
        params
    }

    fn push_value(&mut self, key: String, value: &Value) {
        match value {
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    self.push_value(format!("{key}[{index}]"), item);
                }
            }
            Value::Object(group) => {
                for (sub, item) in group {
                    self.push_value(format!("{key}[{sub}]"), item);
                }
            }
            scalar => {
                if let Some(text) = scalar_to_string(scalar) {
                    self.pairs.push((key, text));
                }
            }
        }
    }

    /// Look up the first value for an already flattened key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Return the collected key/value pairs.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }

    /// Returns true if no parameters have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Percent-encode as an `application/x-www-form-urlencoded` query string.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> QueryMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn list_operand_is_comma_joined() {
        let operand = Operand::from(["a", "b"]);
        assert_eq!(operand.to_query_value(), json!("a,b"));
    }

    #[test]
    fn numeric_list_operand_is_comma_joined() {
        let operand = Operand::from([1_i64, 2, 3]);
        assert_eq!(operand.to_query_value(), json!("1,2,3"));

        let operand = Operand::from(vec![10_u64, 20]);
        assert_eq!(operand, Operand::List(vec![json!(10), json!(20)]));
        assert_eq!(operand.to_query_value(), json!("10,20"));
    }

    #[test]
    fn list_operand_leaves_non_scalars_empty() {
        let operand = Operand::from(json!([[1, 2], {"a": 1}, null, 3, true]));
        assert_eq!(operand.to_query_value(), json!(",,,3,1"));
    }

    #[test]
    fn filter_and_appends_to_existing_column() {
        let filter = Filter::column("title", "eq", "a").and("title", "neq", "b");
        let Filter::Columns(columns) = filter else {
            panic!("expected column filter");
        };
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].operands.len(), 2);
    }

    #[test]
    fn filter_from_json_skips_malformed_columns() {
        let filter = Filter::from(json!({"title": {"in": ["a", "b"]}, "broken": "x"}));
        let Filter::Columns(columns) = filter else {
            panic!("expected column filter");
        };
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].column, "title");
        assert_eq!(
            columns[0].operands[0].1,
            Operand::List(vec![json!("a"), json!("b")])
        );
    }

    #[test]
    fn filter_from_scalar_json_is_shorthand() {
        assert_eq!(
            Filter::from(json!("published")),
            Filter::Shorthand(json!("published"))
        );
    }

    #[test]
    fn set_nested_replaces_scalar_in_the_way() {
        let mut query = map(json!({"filter": "raw"}));
        set_nested(&mut query, &["filter", "posts"], json!("x"));
        assert_eq!(Value::Object(query), json!({"filter": {"posts": "x"}}));
    }

    #[test]
    fn flattens_nested_groups_with_brackets() {
        let query = map(json!({
            "filter": {"posts": {"title": {"eq": "a,b"}}},
            "page": {"limit": 5}
        }));
        let params = QueryParams::from_map(&query);
        assert_eq!(
            params.into_pairs(),
            vec![
                ("filter[posts][title][eq]".to_string(), "a,b".to_string()),
                ("page[limit]".to_string(), "5".to_string()),
            ]
        );
    }

    #[test]
    fn flattens_arrays_bools_and_drops_nulls() {
        let query = map(json!({"ids": [1, 2], "draft": true, "archived": false, "gone": null}));
        let params = QueryParams::from_map(&query);
        assert_eq!(params.get("ids[0]"), Some("1"));
        assert_eq!(params.get("ids[1]"), Some("2"));
        assert_eq!(params.get("draft"), Some("1"));
        assert_eq!(params.get("archived"), Some("0"));
        assert_eq!(params.get("gone"), None);
    }

    #[test]
    fn query_string_percent_encodes_brackets_and_commas() {
        let params = QueryParams::from_map(&map(json!({"fields": {"posts": "title,body"}})));
        assert_eq!(
            params.to_query_string(),
            "fields%5Bposts%5D=title%2Cbody"
        );
    }

    #[test]
    fn empty_groups_emit_nothing() {
        let query = map(json!({"filter": {}}));
        assert!(QueryParams::from_map(&query).is_empty());
    }
}
