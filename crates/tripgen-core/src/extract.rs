//! Turning free-form model output into an [`Itinerary`].
//!
//! Model output is untrusted. The only normalization performed is removal
//! of an outer markdown code fence (with optional language tag); whatever
//! remains must be strict JSON. No repair is attempted.

use crate::error::ExtractionError;
use crate::types::Itinerary;
use serde_json::Value;

const FENCE: &str = "```";

/// Remove a surrounding markdown code fence, if any.
///
/// Handles the shapes models actually emit:
/// - "```json\n{...}\n```"
/// - "```\n{...}\n```"
/// - "```json{...}```" (single line)
///
/// Fences inside the payload are left alone.
pub fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    let text = strip_opening_fence(text);
    let text = text.trim_end();
    text.strip_suffix(FENCE).unwrap_or(text).trim()
}

fn strip_opening_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix(FENCE) else {
        return text;
    };
    match rest.find('\n') {
        Some(idx) if is_language_tag(rest[..idx].trim()) => &rest[idx + 1..],
        _ => strip_json_tag(rest),
    }
}

fn is_language_tag(s: &str) -> bool {
    if matches!(s, "true" | "false" | "null") {
        return false;
    }
    s.is_empty()
        || (s.starts_with(|c: char| c.is_ascii_alphabetic())
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.')))
}

fn strip_json_tag(s: &str) -> &str {
    match s.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &s[4..],
        _ => s,
    }
}

/// Parse model output into an itinerary. A bare `null` is rejected.
pub fn extract_itinerary(raw: &str) -> Result<Itinerary, ExtractionError> {
    let cleaned = strip_code_fence(raw);
    if cleaned.is_empty() {
        return Err(ExtractionError::Empty);
    }
    let value: Value = serde_json::from_str(cleaned)?;
    if value.is_null() {
        return Err(ExtractionError::NullItinerary);
    }
    Ok(Itinerary::from_parsed(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    #[test]
    fn test_fenced_with_language_tag() {
        let it = extract_itinerary("```json\n{\"days\":[]}\n```").unwrap();
        assert_eq!(it.as_value(), &json!({"days": []}));
    }

    #[test]
    fn test_fenced_without_tag() {
        let it = extract_itinerary("```\n[1, 2, 3]\n```").unwrap();
        assert_eq!(it.as_value(), &json!([1, 2, 3]));
    }

    #[test]
    fn test_single_line_fence() {
        let it = extract_itinerary("```json{\"a\":1}```").unwrap();
        assert_eq!(it.as_value(), &json!({"a": 1}));
    }

    #[test]
    fn test_uppercase_tag_and_surrounding_whitespace() {
        let it = extract_itinerary("  \n```JSON\n{\"a\":true}\n```  \n").unwrap();
        assert_eq!(it.as_value(), &json!({"a": true}));
    }

    #[test]
    fn test_unfenced_json() {
        let it = extract_itinerary("{\"days\": [{\"day\": 1}]}").unwrap();
        assert_eq!(it.as_value()["days"][0]["day"], 1);
    }

    #[test]
    fn test_fence_inside_string_is_kept() {
        let it = extract_itinerary("```json\n{\"note\":\"use ``` carefully\"}\n```").unwrap();
        assert_eq!(it.as_value()["note"], "use ``` carefully");
    }

    #[test]
    fn test_rejects_prose() {
        let err = extract_itinerary("not json").unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidJson(_)));

        let err = extract_itinerary("I cannot help with that.").unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidJson(_)));
    }

    #[test]
    fn test_rejects_fenced_prose() {
        let err = extract_itinerary("```Hello```").unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidJson(_)));
    }

    #[test]
    fn test_rejects_prose_around_fence() {
        let raw = "Here is your plan:\n```json\n{\"days\":[]}\n```";
        assert!(extract_itinerary(raw).is_err());
    }

    #[test]
    fn test_rejects_truncated_json() {
        let err = extract_itinerary("```json\n{\"days\": [\n```").unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidJson(_)));
    }

    #[test]
    fn test_empty_output() {
        assert!(matches!(extract_itinerary("").unwrap_err(), ExtractionError::Empty));
        assert!(matches!(
            extract_itinerary("```json\n```").unwrap_err(),
            ExtractionError::Empty
        ));
    }

    #[test]
    fn test_rejects_null() {
        assert!(matches!(
            extract_itinerary("null").unwrap_err(),
            ExtractionError::NullItinerary
        ));
        assert!(matches!(
            extract_itinerary("```json\nnull\n```").unwrap_err(),
            ExtractionError::NullItinerary
        ));
        assert!(matches!(
            extract_itinerary("```\nnull\n```").unwrap_err(),
            ExtractionError::NullItinerary
        ));
    }

    #[test]
    fn test_json_literal_first_line_is_payload_not_tag() {
        assert_eq!(extract_itinerary("```true\n```").unwrap().as_value(), &json!(true));
        assert_eq!(extract_itinerary("```42\n```").unwrap().as_value(), &json!(42));
        assert_eq!(
            extract_itinerary("```\n{\"a\":1}\n```").unwrap().as_value(),
            &json!({"a": 1})
        );
        assert_eq!(
            extract_itinerary("```json5\n[1]\n```").unwrap().as_value(),
            &json!([1])
        );
    }

    #[test]
    fn test_floats_round_trip_exactly() {
        for f in [1.0715660391465826e-75, 0.1, 12.5, 1e300, -3.4028235e38, 5e-324] {
            let raw = format!("```json\n{}\n```", json!({ "cost": f }));
            let it = extract_itinerary(&raw).unwrap();
            assert_eq!(it.as_value()["cost"].as_f64(), Some(f));
        }
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            any::<f64>()
                .prop_filter("JSON numbers are finite", |f| f.is_finite())
                .prop_map(|f| json!(f)),
            ".*".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map("[a-zA-Z_]{1,8}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_fenced_json_round_trips(
            value in arb_json().prop_filter("null is not an itinerary", |v| !v.is_null()),
            pretty in any::<bool>(),
        ) {
            let body = if pretty {
                serde_json::to_string_pretty(&value).unwrap()
            } else {
                serde_json::to_string(&value).unwrap()
            };
            let raw = format!("```json\n{}\n```", body);
            let it = extract_itinerary(&raw).unwrap();
            prop_assert_eq!(it.as_value(), &value);
        }

        #[test]
        fn prop_never_panics(raw in ".*") {
            let _ = extract_itinerary(&raw);
        }
    }
}
