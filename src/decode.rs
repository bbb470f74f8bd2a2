//! Schema-directed decoding of a URL query back into option values.
//!
//! Decoding is intentionally partial, the inverse of the lossless encoder in
//! [`crate::options`] only for the known option fields: each top-level field
//! has a registered parser that knows its shape (list, number, boolean or
//! free text), bracketed keys nest under their field's bucket as dot-joined
//! sub-keys, and anything outside the known schema is dropped. This is used
//! to restore an options value from a shareable URL, not to deserialize
//! arbitrary payloads.

use percent_encoding::percent_decode_str;
use serde_json::{Map, Number, Value};

use crate::error::HttpApiError;
use crate::options::QueryOptions;

type FieldParser = fn(&str) -> Option<Value>;

/// Fixed table of known option fields and their value parsers. Field names
/// use their wire spelling.
fn parser_for(field: &str) -> Option<FieldParser> {
    match field {
        field if is_list_field(field) => Some(parse_list),
        "offset" | "limit" => Some(parse_number),
        "random" => Some(parse_boolean),
        "filter" | "search" | "distinct" => Some(parse_text),
        _ => None,
    }
}

/// Decode a raw URL query string (with or without the leading `?`) into a
/// record of known option fields.
pub fn record_from_query(query: &str) -> Map<String, Value> {
    let pairs = query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (decode_component(key), decode_component(value)),
            None => (decode_component(pair), String::new()),
        })
        .collect::<Vec<_>>();

    record_from_params(pairs.iter().map(|(key, value)| (key.as_str(), value.as_str())))
}

/// Decode already-split `(key, value)` parameters into a record of known
/// option fields. Keys and values are expected to be percent-decoded.
pub fn record_from_params<'a, I>(params: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut record = Map::new();
    for (key, value) in params {
        apply_param(key, value, &mut record);
    }
    record
}

/// Decode a raw URL query string into typed [`QueryOptions`].
///
/// Restoration is lossy like the rest of decode: bracket chains under a
/// list-shaped field (for example an encoded nested populate,
/// `populate[0][path]=comments`) bucket as dot-joined sub-keys with no typed
/// representation and are dropped rather than failing the restore.
pub fn options_from_query(query: &str) -> Result<QueryOptions, HttpApiError> {
    let mut record = record_from_query(query);
    record.retain(|field, value| !(is_list_field(field) && value.is_object()));
    Ok(serde_json::from_value(Value::Object(record))?)
}

fn is_list_field(field: &str) -> bool {
    matches!(field, "sort" | "pick" | "searchScope" | "populate")
}

fn apply_param(key: &str, value: &str, record: &mut Map<String, Value>) {
    let (field, segments) = split_bracket_path(key);
    // Unknown top-level fields and unparseable values are dropped.
    let Some(parser) = parser_for(field) else {
        return;
    };
    let Some(parsed) = parser(value) else {
        return;
    };

    if segments.is_empty() {
        record.insert(field.to_owned(), parsed);
        return;
    }

    let sub_key = segments
        .iter()
        .filter(|segment| !segment.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(".");

    if sub_key.is_empty() {
        // `field[]=value` appends into the field's array bucket.
        let bucket = record
            .entry(field.to_owned())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = bucket {
            match parsed {
                Value::Array(mut list) => items.append(&mut list),
                other => items.push(other),
            }
        }
    } else {
        // Bracket chains nest as one flat dot-joined sub-key.
        let bucket = record
            .entry(field.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(fields) = bucket {
            fields.insert(sub_key, parsed);
        }
    }
}

/// Split `outer[a][b]` into `("outer", ["a", "b"])`. Malformed trailing text
/// after the last `]` is ignored.
fn split_bracket_path(key: &str) -> (&str, Vec<&str>) {
    let Some(open) = key.find('[') else {
        return (key, Vec::new());
    };
    let field = &key[..open];
    let mut segments = Vec::new();
    let mut rest = &key[open..];
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            break;
        };
        segments.push(&stripped[..close]);
        rest = &stripped[close + 1..];
    }
    (field, segments)
}

fn decode_component(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

fn parse_list(raw: &str) -> Option<Value> {
    let items = raw
        .split(',')
        .filter(|item| !item.is_empty())
        .map(|item| Value::String(item.to_owned()))
        .collect();
    Some(Value::Array(items))
}

fn parse_number(raw: &str) -> Option<Value> {
    if let Ok(value) = raw.parse::<i64>() {
        return Some(Value::Number(Number::from(value)));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

// Literal truthy-string comparison only; query values are never evaluated.
fn parse_boolean(raw: &str) -> Option<Value> {
    Some(Value::Bool(raw.eq_ignore_ascii_case("true") || raw == "1"))
}

fn parse_text(raw: &str) -> Option<Value> {
    Some(Value::String(raw.to_owned()))
}
