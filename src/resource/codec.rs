//! Field Codec
//!
//! Converts the string values a form edits into the typed values the remote
//! client expects, and renders stored values back into editable text.

use super::item::ResourceItem;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Editor text for an object with no entries: the cursor lands inside braces
pub const EMPTY_OBJECT_PLACEHOLDER: &str = "{\n\t\n}";

/// Pixel height of one line in the JSON editor
const EDITOR_LINE_HEIGHT: u16 = 17;
/// Editors taller than this many lines stop growing
const EDITOR_MAX_LINES: usize = 20;

/// Raw form input, keyed by field name
pub type RawForm = BTreeMap<String, String>;

/// How a field's raw text is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    String,
    Integer,
    Json,
}

/// A declared form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub label: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            label: None,
        }
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// A single field failed to encode
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("{field}: invalid JSON ({message})")]
    InvalidJson { field: String, message: String },
    #[error("{field}: {value:?} is not a base-10 integer")]
    InvalidInteger { field: String, value: String },
}

impl CodecError {
    /// Name of the offending field
    pub fn field(&self) -> &str {
        match self {
            Self::InvalidJson { field, .. } | Self::InvalidInteger { field, .. } => field,
        }
    }
}

/// Per-field errors collected over a whole form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, CodecError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, error: CodecError) {
        self.0.insert(error.field().to_string(), error);
    }

    pub fn remove(&mut self, field: &str) {
        self.0.remove(field);
    }

    pub fn get(&self, field: &str) -> Option<&CodecError> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CodecError> {
        self.0.values()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl std::error::Error for FieldErrors {}

/// Encode one raw field value
pub fn encode(field: &str, raw: &str, kind: FieldKind) -> Result<Value, CodecError> {
    match kind {
        FieldKind::Json => serde_json::from_str(raw).map_err(|e| CodecError::InvalidJson {
            field: field.to_string(),
            message: e.to_string(),
        }),
        FieldKind::Integer => parse_integer(field, raw).map(Value::from),
        FieldKind::String => Ok(Value::String(raw.trim().to_string())),
    }
}

/// Check a raw value; agrees with [`encode`] on every input
pub fn validate(field: &str, raw: &str, kind: FieldKind) -> Option<CodecError> {
    encode(field, raw, kind).err()
}

fn parse_integer(field: &str, raw: &str) -> Result<i64, CodecError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let invalid = || CodecError::InvalidInteger {
        field: field.to_string(),
        value: raw.to_string(),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    trimmed.parse::<i64>().map_err(|_| invalid())
}

/// Validate every declared field present in the form
pub fn validate_fields(fields: &[FieldDescriptor], raw: &RawForm) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for field in fields {
        if let Some(value) = raw.get(&field.name) {
            if let Some(error) = validate(&field.name, value, field.kind) {
                errors.insert(error);
            }
        }
    }
    errors
}

/// Encode every declared field present in the form.
///
/// Fields missing from `raw` and blank text fields are left out of the
/// result. Undeclared entries in `raw` are ignored.
pub fn encode_fields(
    fields: &[FieldDescriptor],
    raw: &RawForm,
) -> Result<Map<String, Value>, FieldErrors> {
    let mut encoded = Map::new();
    let mut errors = FieldErrors::new();

    for field in fields {
        let Some(value) = raw.get(&field.name) else {
            continue;
        };
        if field.kind == FieldKind::String && value.trim().is_empty() {
            continue;
        }
        match encode(&field.name, value, field.kind) {
            Ok(v) => {
                encoded.insert(field.name.clone(), v);
            }
            Err(e) => errors.insert(e),
        }
    }

    if errors.is_empty() {
        Ok(encoded)
    } else {
        Err(errors)
    }
}

/// Editable text for one field of an item
pub fn decode(item: &ResourceItem, field: &str) -> String {
    item.field(field)
        .map(|value| decode_value(&value))
        .unwrap_or_default()
}

/// Editable text for a structured value
pub fn decode_value(value: &Value) -> String {
    match value {
        Value::Object(map) if map.is_empty() => EMPTY_OBJECT_PLACEHOLDER.to_string(),
        Value::Object(_) | Value::Array(_) => to_pretty_json(value),
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(_) | Value::Bool(_) => value.to_string(),
    }
}

/// Pretty-print with a one-space indent
fn to_pretty_json(value: &Value) -> String {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    if value.serialize(&mut serializer).is_err() {
        return value.to_string();
    }
    String::from_utf8(buf).unwrap_or_else(|_| value.to_string())
}

/// Height in pixels of a JSON editor showing `text`
pub fn editor_height(text: &str) -> u16 {
    // \r\n, \r and \n each end a line
    let lines = text
        .replace("\r\n", "\n")
        .split(|c: char| c == '\n' || c == '\r')
        .count();
    let lines = lines.min(EDITOR_MAX_LINES) as u16;
    lines * EDITOR_LINE_HEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_json_object() {
        let value = encode("tags", r#"{"k":"v"}"#, FieldKind::Json).unwrap();
        assert_eq!(value, json!({"k": "v"}));
    }

    #[test]
    fn test_encode_placeholder_is_empty_object() {
        let value = encode("tags", EMPTY_OBJECT_PLACEHOLDER, FieldKind::Json).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_encode_invalid_json_reports_field() {
        let err = encode("tags", "{not json", FieldKind::Json).unwrap_err();
        assert_eq!(err.field(), "tags");
        assert!(matches!(err, CodecError::InvalidJson { .. }));
    }

    #[test]
    fn test_encode_integer() {
        assert_eq!(encode("quorum", "2", FieldKind::Integer).unwrap(), json!(2));
        assert_eq!(encode("quorum", " -7 ", FieldKind::Integer).unwrap(), json!(-7));
    }

    #[test]
    fn test_encode_integer_rejects_non_numeric() {
        for raw in ["", "two", "2.5", "+3", "1e3", "0x10", "3 4"] {
            let err = encode("quorum", raw, FieldKind::Integer).unwrap_err();
            assert!(
                matches!(err, CodecError::InvalidInteger { .. }),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_encode_string_is_trimmed() {
        let value = encode("alias", "  treasury \n", FieldKind::String).unwrap();
        assert_eq!(value, json!("treasury"));
    }

    #[test]
    fn test_validate_matches_encode() {
        assert!(validate("tags", "{}", FieldKind::Json).is_none());
        assert!(validate("tags", "{", FieldKind::Json).is_some());
        assert!(validate("quorum", "abc", FieldKind::Integer).is_some());
        assert!(validate("alias", "anything", FieldKind::String).is_none());
    }

    #[test]
    fn test_decode_empty_object_uses_placeholder() {
        assert_eq!(decode_value(&json!({})), "{\n\t\n}");
    }

    #[test]
    fn test_decode_pretty_prints_with_one_space() {
        let text = decode_value(&json!({"k": "v", "n": [1]}));
        assert_eq!(text, "{\n \"k\": \"v\",\n \"n\": [\n  1\n ]\n}");
    }

    #[test]
    fn test_decode_item_fields() {
        let item: ResourceItem = serde_json::from_value(json!({
            "id": "acc1",
            "alias": "alice",
            "tags": {},
            "quorum": 2
        }))
        .unwrap();

        assert_eq!(decode(&item, "tags"), EMPTY_OBJECT_PLACEHOLDER);
        assert_eq!(decode(&item, "alias"), "alice");
        assert_eq!(decode(&item, "quorum"), "2");
        assert_eq!(decode(&item, "definition"), "");
    }

    #[test]
    fn test_encode_fields_collects_all_errors() {
        let fields = vec![
            FieldDescriptor::new("tags", FieldKind::Json),
            FieldDescriptor::new("quorum", FieldKind::Integer),
            FieldDescriptor::new("alias", FieldKind::String),
        ];
        let raw: RawForm = [
            ("tags".to_string(), "{".to_string()),
            ("quorum".to_string(), "x".to_string()),
            ("alias".to_string(), "ok".to_string()),
        ]
        .into_iter()
        .collect();

        let errors = encode_fields(&fields, &raw).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.get("tags").is_some());
        assert!(errors.get("quorum").is_some());
        assert_eq!(errors.to_string(), "invalid fields: quorum, tags");
        assert_eq!(validate_fields(&fields, &raw), errors);
    }

    #[test]
    fn test_encode_fields_skips_missing_and_undeclared() {
        let fields = vec![
            FieldDescriptor::new("tags", FieldKind::Json),
            FieldDescriptor::new("quorum", FieldKind::Integer),
        ];
        let raw: RawForm = [
            ("tags".to_string(), "{}".to_string()),
            ("extra".to_string(), "ignored".to_string()),
        ]
        .into_iter()
        .collect();

        let encoded = encode_fields(&fields, &raw).unwrap();
        assert_eq!(Value::Object(encoded), json!({"tags": {}}));
    }

    #[test]
    fn test_encode_fields_skips_blank_text() {
        let fields = vec![FieldDescriptor::new("alias", FieldKind::String)];
        let raw: RawForm = [("alias".to_string(), "   ".to_string())].into_iter().collect();

        assert!(encode_fields(&fields, &raw).unwrap().is_empty());
    }

    #[test]
    fn test_editor_height() {
        assert_eq!(editor_height(EMPTY_OBJECT_PLACEHOLDER), 3 * 17);
        assert_eq!(editor_height(""), 17);
        let long = vec!["x"; 40].join("\n");
        assert_eq!(editor_height(&long), 340);
        assert_eq!(editor_height("{\r \"k\": 1\r}"), 3 * 17);
        assert_eq!(editor_height("{\r\n}\n"), 3 * 17);
    }
}
