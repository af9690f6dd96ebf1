//! JSON extraction: recover the deck object from sanitized model text.
//!
//! Models sometimes wrap the object in commentary ("Sure! Here is your
//! deck: { … } Let me know…"). Slicing from the first `{` to the last `}`
//! recovers the object in that case. Unrelated braces *before* the real
//! object defeat the heuristic; that is accepted and surfaces as
//! [`ExtractError::ParseFailed`] with the slice attached.

use crate::error::ExtractError;
use serde_json::Value;

/// Parse the JSON object spanning the first `{` and the last `}` of `text`.
pub fn extract(text: &str) -> Result<Value, ExtractError> {
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return Err(ExtractError::NoJsonBoundary);
    };
    if end <= start {
        return Err(ExtractError::NoJsonBoundary);
    }

    let candidate = &text[start..=end];
    serde_json::from_str(candidate).map_err(|e| ExtractError::ParseFailed {
        raw: candidate.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::sanitize::sanitize;
    use serde_json::json;

    #[test]
    fn no_braces_is_boundary_error() {
        assert_eq!(extract("no json here"), Err(ExtractError::NoJsonBoundary));
        assert_eq!(extract(""), Err(ExtractError::NoJsonBoundary));
        assert_eq!(extract("only { opening"), Err(ExtractError::NoJsonBoundary));
    }

    #[test]
    fn reversed_braces_is_boundary_error() {
        assert_eq!(extract("} backwards {"), Err(ExtractError::NoJsonBoundary));
    }

    #[test]
    fn prose_around_object_is_ignored() {
        let text = "Sure! Here is the deck:\n{\"slides\": [{\"title\": \"A\"}]}\nEnjoy.";
        assert_eq!(extract(text).unwrap(), json!({"slides": [{"title": "A"}]}));
    }

    #[test]
    fn nested_objects_survive() {
        let text = r#"{"slides":[{"title":"A","meta":{"k":{"v":1}}}],"summary":"s"}"#;
        assert_eq!(
            extract(text).unwrap(),
            json!({"slides":[{"title":"A","meta":{"k":{"v":1}}}],"summary":"s"})
        );
    }

    #[test]
    fn parse_failure_keeps_raw_slice() {
        let err = extract("prefix {\"slides\": [,]} suffix").unwrap_err();
        match err {
            ExtractError::ParseFailed { raw, .. } => assert_eq!(raw, "{\"slides\": [,]}"),
            other => panic!("expected ParseFailed, got {other:?}"),
        }
    }

    #[test]
    fn unrelated_leading_braces_fail_loudly() {
        let err = extract("use {x} then {\"slides\": []}").unwrap_err();
        assert!(matches!(err, ExtractError::ParseFailed { .. }));
    }

    #[test]
    fn fenced_response_round_trip() {
        let upstream = "```json\n{\"slides\":[{\"title\":\"A\",\"bullets\":[\"x\"]}]}\n```";
        let value = extract(&sanitize(upstream)).unwrap();
        assert_eq!(value, json!({"slides":[{"title":"A","bullets":["x"]}]}));
    }
}
