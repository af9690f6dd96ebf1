//! Schema validation: turn parsed JSON into a typed, length-bounded deck.
//!
//! Only `slides` is required. Everything inside a slide is normalised rather
//! than rejected: the model is asked for a shape, not forced into it, and a
//! slightly malformed slide is still worth showing.

use crate::error::ValidationError;
use crate::output::{DeckResult, Slide};
use serde_json::Value;

/// Validate `parsed` and keep at most `page_limit` slides.
///
/// * `slides` missing or not an array → [`ValidationError::MissingSlides`]
/// * more slides than `page_limit` → truncated, order preserved
/// * fewer slides → accepted as-is (never padded)
/// * `bullets` not an array → empty
///
/// `raw` is the model text the value was parsed from and is stored on the result.
pub fn validate(parsed: &Value, page_limit: usize, raw: &str) -> Result<DeckResult, ValidationError> {
    let entries = parsed
        .get("slides")
        .and_then(Value::as_array)
        .ok_or(ValidationError::MissingSlides)?;

    let slides = entries
        .iter()
        .take(page_limit)
        .enumerate()
        .map(|(idx, entry)| normalise_slide(idx, entry))
        .collect();

    Ok(DeckResult {
        slides,
        summary: non_blank(parsed.get("summary")),
        raw: raw.to_string(),
        model: None,
    })
}

fn normalise_slide(idx: usize, entry: &Value) -> Slide {
    let Some(obj) = entry.as_object() else {
        return Slide {
            title: scalar_text(entry).unwrap_or_else(|| default_title(idx)),
            bullets: Vec::new(),
            notes: None,
        };
    };

    let title = obj
        .get("title")
        .and_then(scalar_text)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| default_title(idx));

    let bullets = obj
        .get("bullets")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(scalar_text).collect())
        .unwrap_or_default();

    Slide {
        title,
        bullets,
        notes: non_blank(obj.get("notes")),
    }
}

/// Text form of a scalar; `None` for null, arrays, and objects.
fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn non_blank(v: Option<&Value>) -> Option<String> {
    v.and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn default_title(idx: usize) -> String {
    format!("Slide {}", idx + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truncates_to_page_limit_in_order() {
        let deck = validate(&json!({"slides": [1, 2, 3, 4, 5]}), 3, "").unwrap();
        let titles: Vec<&str> = deck.slides.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["1", "2", "3"]);
    }

    #[test]
    fn never_pads() {
        let deck = validate(&json!({"slides": [{"title": "Only"}]}), 10, "").unwrap();
        assert_eq!(deck.slides.len(), 1);
    }

    #[test]
    fn missing_slides() {
        assert_eq!(validate(&json!({}), 5, ""), Err(ValidationError::MissingSlides));
    }

    #[test]
    fn slides_not_an_array() {
        assert_eq!(
            validate(&json!({"slides": "three of them"}), 5, ""),
            Err(ValidationError::MissingSlides)
        );
    }

    #[test]
    fn non_array_bullets_become_empty() {
        let deck = validate(
            &json!({"slides": [{"title": "A", "bullets": "x, y"}, {"title": "B"}]}),
            5,
            "",
        )
        .unwrap();
        assert!(deck.slides[0].bullets.is_empty());
        assert!(deck.slides[1].bullets.is_empty());
    }

    #[test]
    fn bullet_scalars_are_stringified_and_nested_values_dropped() {
        let deck = validate(
            &json!({"slides": [{"title": "A", "bullets": ["x", 2, true, null, {"k": 1}]}]}),
            5,
            "",
        )
        .unwrap();
        assert_eq!(deck.slides[0].bullets, ["x", "2", "true"]);
    }

    #[test]
    fn missing_title_gets_position() {
        let deck = validate(&json!({"slides": [{"title": "A"}, {"title": "  "}]}), 5, "").unwrap();
        assert_eq!(deck.slides[1].title, "Slide 2");
    }

    #[test]
    fn notes_and_summary_are_optional() {
        let raw = r#"{"slides":[{"title":"A","notes":"n"},{"title":"B","notes":""}],"summary":" s "}"#;
        let parsed: Value = serde_json::from_str(raw).unwrap();
        let deck = validate(&parsed, 5, raw).unwrap();
        assert_eq!(deck.slides[0].notes.as_deref(), Some("n"));
        assert_eq!(deck.slides[1].notes, None);
        assert_eq!(deck.summary.as_deref(), Some("s"));
        assert_eq!(deck.raw, raw);
    }
}
