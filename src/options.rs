//! Structured query options and their canonical wire encoding.
//!
//! `QueryOptions` is the closed set of option fields a controller understands
//! (filtering, sorting, pagination, field selection, population, sampling)
//! plus an open extension bucket for passenger parameters. Encoding flattens
//! the structure into bracket-notation `path=value` parameters and sorts the
//! final list, so two structurally equal option values always produce
//! byte-identical output regardless of map iteration order.

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::HttpApiError;

/// Escape set matching JavaScript's `encodeURIComponent`.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Query options accepted by CRUD-style controllers.
///
/// All fields are optional; an empty value encodes to an empty parameter
/// list. Unknown parameters travel in `extra` and are flattened through the
/// same encode path as the known fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    /// Sort fields, `-` prefix marks descending order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<String>,
    /// Field conditions: scalar equality or an operator map like `{"$gt": 5}`.
    /// Operator names are opaque to the codec.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub filter: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Fields to include in the response models.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pick: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Fields the free-text search is restricted to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_scope: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub populate: Vec<Populate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random: Option<bool>,
    /// Passenger parameters outside the known schema. Encoded like any other
    /// field, never reconstructed by [`crate::decode`].
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of a populate list: either a bare reference path or a nested
/// descriptor that scopes the populated documents with its own options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Populate {
    Path(String),
    Nested(PopulateOptions),
}

/// Options applied to a populated relation. Mirrors [`QueryOptions`] minus
/// the collection-level fields (`search`, `distinct`, `random`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulateOptions {
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub filter: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pick: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub populate: Vec<Populate>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sort<I, S>(mut self, sort: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort = sort.into_iter().map(Into::into).collect();
        self
    }

    /// Add a single filter condition. `value` may be a scalar or an
    /// operator map such as `json!({"$gte": 18})`.
    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter.insert(field.into(), value.into());
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_pick<I, S>(mut self, pick: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pick = pick.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_search_scope<I, S>(mut self, scope: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_scope = scope.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_populate(mut self, entry: impl Into<Populate>) -> Self {
        self.populate.push(entry.into());
        self
    }

    pub fn with_distinct(mut self, field: impl Into<String>) -> Self {
        self.distinct = Some(field.into());
        self
    }

    pub fn with_random(mut self, random: bool) -> Self {
        self.random = Some(random);
        self
    }

    /// Attach a passenger parameter outside the known option schema.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Flatten into the canonical sorted parameter list.
    pub fn to_params(&self) -> Result<Vec<String>, HttpApiError> {
        match serde_json::to_value(self)? {
            Value::Object(record) => Ok(params_from_record(&record)),
            _ => Ok(Vec::new()),
        }
    }

    /// Canonical `&`-joined query string, without a leading `?`.
    pub fn to_query_string(&self) -> Result<String, HttpApiError> {
        Ok(self.to_params()?.join("&"))
    }
}

impl From<String> for Populate {
    fn from(path: String) -> Self {
        Populate::Path(path)
    }
}

impl From<&str> for Populate {
    fn from(path: &str) -> Self {
        Populate::Path(path.to_owned())
    }
}

impl From<PopulateOptions> for Populate {
    fn from(options: PopulateOptions) -> Self {
        Populate::Nested(options)
    }
}

impl PopulateOptions {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

impl fmt::Display for QueryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_query_string() {
            Ok(query) => f.write_str(&query),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Flatten an arbitrary record into sorted bracket-notation parameters.
///
/// Traversal rules:
/// - root keys are emitted bare, nested keys as `[key]` segments
/// - nested records recurse with the extended path
/// - structured array elements recurse as `path[index]`
/// - scalar array elements are sorted, then emitted as `path[]=value`, so
///   element order is not part of the representation
/// - scalars are percent-encoded and emitted as `path=value`
///
/// The final list is sorted lexicographically as whole strings; this is the
/// canonicalization step that makes the output independent of map iteration
/// order.
pub fn params_from_record(record: &Map<String, Value>) -> Vec<String> {
    let mut params = Vec::new();
    flatten_record(record, &mut params, "", true);
    params.sort();
    params
}

fn flatten_record(record: &Map<String, Value>, params: &mut Vec<String>, path: &str, is_root: bool) {
    for (key, value) in record {
        // Key text is percent-encoded; the bracket punctuation itself is not.
        let key = encode_component(key);
        let path = if is_root {
            format!("{path}{key}")
        } else {
            format!("{path}[{key}]")
        };
        flatten_value(value, params, &path);
    }
}

fn flatten_value(value: &Value, params: &mut Vec<String>, path: &str) {
    match value {
        Value::Array(items) => {
            let mut scalars = Vec::new();
            for (index, item) in items.iter().enumerate() {
                match item {
                    Value::Object(nested) => {
                        flatten_record(nested, params, &format!("{path}[{index}]"), false);
                    }
                    Value::Array(_) => flatten_value(item, params, &format!("{path}[{index}]")),
                    scalar => scalars.push(scalar_to_string(scalar)),
                }
            }
            scalars.sort();
            for scalar in scalars {
                params.push(format!("{path}[]={}", encode_component(&scalar)));
            }
        }
        Value::Object(nested) => flatten_record(nested, params, path, false),
        scalar => params.push(format!("{path}={}", encode_component(&scalar_to_string(scalar)))),
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Percent-encode one scalar with the `encodeURIComponent` escape set.
pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, QUERY_COMPONENT).to_string()
}

/// Backslash-escape regex metacharacters (`.*+?^${}()|[]\`) in user input
/// destined for `$regex` filter conditions.
pub fn escape_regex_symbols(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(
            ch,
            '.' | '*' | '+' | '?' | '^' | '$' | '{' | '}' | '(' | ')' | '|' | '[' | ']' | '\\'
        ) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
