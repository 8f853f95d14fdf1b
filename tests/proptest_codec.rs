//! Property-based tests using proptest
//!
//! These tests verify the field codec's validation and its decode/encode
//! agreement using randomized inputs.

use ledger_console::resource::codec::{
    decode_value, encode, validate, FieldKind, EMPTY_OBJECT_PLACEHOLDER,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

/// Generate arbitrary tag maps
fn arb_tags() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-z_]{1,12}", "[ -~]{0,24}", 0..8).prop_map(|tags| {
        Value::Object(
            tags.into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect::<Map<String, Value>>(),
        )
    })
}

/// Generate nested JSON values
fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[ -~]{0,16}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    /// Every i64 round-trips through the integer codec
    #[test]
    fn test_integer_round_trip(n in any::<i64>()) {
        let encoded = encode("quorum", &n.to_string(), FieldKind::Integer).unwrap();
        prop_assert_eq!(encoded, json!(n));
    }

    /// Text with a non-digit character never validates as an integer
    #[test]
    fn test_non_numeric_integer_is_rejected(
        prefix in "[0-9]{0,4}",
        bad in "[a-zA-Z.+eEx_]",
        suffix in "[0-9]{0,4}",
    ) {
        let raw = format!("{}{}{}", prefix, bad, suffix);
        prop_assert!(validate("quorum", &raw, FieldKind::Integer).is_some());
    }

    /// Decoded structured values encode back to the same value
    #[test]
    fn test_json_decode_encode_agree(value in arb_json()) {
        prop_assume!(value.is_object() || value.is_array());
        let text = decode_value(&value);
        prop_assert_eq!(encode("definition", &text, FieldKind::Json).unwrap(), value);
    }

    /// Tags decode to editable text that validates
    #[test]
    fn test_decoded_tags_validate(tags in arb_tags()) {
        let text = decode_value(&tags);
        prop_assert!(validate("tags", &text, FieldKind::Json).is_none());
        if tags.as_object().is_some_and(Map::is_empty) {
            prop_assert_eq!(text, EMPTY_OBJECT_PLACEHOLDER);
        }
    }

    /// Validation agrees with encoding for any input
    #[test]
    fn test_validate_matches_encode(raw in "\\PC{0,32}") {
        for kind in [FieldKind::String, FieldKind::Integer, FieldKind::Json] {
            prop_assert_eq!(
                validate("f", &raw, kind).is_none(),
                encode("f", &raw, kind).is_ok()
            );
        }
    }

    /// Strings are only trimmed
    #[test]
    fn test_string_is_trimmed(raw in "[ -~]{0,32}") {
        prop_assert_eq!(
            encode("alias", &raw, FieldKind::String).unwrap(),
            Value::String(raw.trim().to_string())
        );
    }
}
