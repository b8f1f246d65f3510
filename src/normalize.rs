use crate::types::CellValue;
use serde_json::Value;

/// Line substituted when an opaque object cannot be serialized.
pub const UNPARSEABLE_PLACEHOLDER: &str = "[unparseable object]";

/// Explicit classification of the shapes a raw cell value arrives in.
///
/// The host SDK hands back whatever the field type produces: a bare string,
/// a string array, a rich-text segment array, or a loose object. Deciding
/// the shape once up front keeps the mapping to lines exhaustive instead of
/// probing properties ad hoc at every branch.
#[derive(Debug, Clone, PartialEq)]
pub enum CellShape {
    /// Null cell, nothing to split.
    Absent,
    /// Plain text field.
    Text(String),
    /// Rich-text field: segment texts in array order.
    RichText(Vec<String>),
    /// Array that is not uniformly rich-text segments.
    Items(Vec<CellValue>),
    /// Single object tagged `type: "text"` with a `text` payload.
    TaggedText(String),
    /// Object identified by a `title`, `name`, or `value` property.
    Keyed(String),
    /// Object with no recognized keys.
    Opaque(serde_json::Map<String, CellValue>),
    /// Bool or number.
    Scalar(CellValue),
}

/// Splits a raw cell value into the non-blank lines it contains.
///
/// Total over every JSON shape: unsupported combinations fall through to a
/// best-effort stringification, so callers always get a sequence to iterate
/// (possibly empty) and never an error.
pub fn normalize(value: &CellValue) -> Vec<String> {
    match classify(value) {
        CellShape::Absent => Vec::new(),
        CellShape::Text(text) => split_lines(&text),
        CellShape::RichText(parts) => split_lines(&parts.concat()),
        CellShape::Items(items) => items
            .iter()
            .map(value_text)
            .filter(|text| !text.trim().is_empty())
            .collect(),
        CellShape::TaggedText(text) => split_lines(&text),
        CellShape::Keyed(text) => single_line(text),
        CellShape::Opaque(map) => match serde_json::to_string(&map) {
            Ok(serialized) => single_line(serialized),
            Err(_) => vec![UNPARSEABLE_PLACEHOLDER.to_string()],
        },
        CellShape::Scalar(scalar) => single_line(value_text(&scalar)),
    }
}

/// Decides which [`CellShape`] a raw value is, by its discriminating fields.
pub fn classify(value: &CellValue) -> CellShape {
    match value {
        Value::Null => CellShape::Absent,
        Value::String(text) => CellShape::Text(text.clone()),
        Value::Array(items) => {
            if !items.is_empty() && items.iter().all(is_text_segment) {
                let parts = items
                    .iter()
                    .filter_map(|segment| segment.get("text").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect();
                CellShape::RichText(parts)
            } else {
                CellShape::Items(items.clone())
            }
        }
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) == Some("text") {
                if let Some(text) = map.get("text") {
                    return CellShape::TaggedText(value_text(text));
                }
            }
            for key in ["title", "name", "value"] {
                if let Some(keyed) = map.get(key) {
                    return CellShape::Keyed(value_text(keyed));
                }
            }
            CellShape::Opaque(map.clone())
        }
        scalar => CellShape::Scalar(scalar.clone()),
    }
}

fn is_text_segment(value: &Value) -> bool {
    value
        .as_object()
        .and_then(|segment| segment.get("type"))
        .and_then(Value::as_str)
        == Some("text")
}

/// Newline split that drops lines blank after trimming. Surviving lines
/// keep their original whitespace.
fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

fn single_line(text: String) -> Vec<String> {
    if text.trim().is_empty() {
        Vec::new()
    } else {
        vec![text]
    }
}

/// Textual form of one value: strings verbatim, null as blank, everything
/// else through its JSON rendering. Infallible.
fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
