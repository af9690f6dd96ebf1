//! Generation requests: validation and normalisation of caller input.
//!
//! A [`GenerationRequest`] is always valid once constructed: the topic is
//! non-blank, the page count is clamped to `1..=MAX_PAGE_COUNT`, and the
//! context is bounded. [`RawGenerationRequest`] is the lenient wire form
//! (`{topic, contextText?, pageCount?, richness?}`) that HTTP callers send.

use crate::config::Richness;
use crate::error::DeckError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Hard upper bound on slides per deck.
pub const MAX_PAGE_COUNT: usize = 20;

/// Page count used when the caller sends none (or garbage).
pub const DEFAULT_PAGE_COUNT: usize = 5;

/// Inserted where the middle of an over-long context was cut.
pub const TRUNCATION_MARKER: &str = "\n\n...(middle of the material truncated)...\n\n";

/// A validated request for one deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    pub topic: String,
    /// Bounded context; empty when none was supplied.
    pub context_text: String,
    /// Clamped to `1..=MAX_PAGE_COUNT`.
    pub page_count: usize,
    pub richness: Richness,
}

impl GenerationRequest {
    /// Validate and normalise caller input.
    ///
    /// # Errors
    /// [`DeckError::InvalidInput`] when `topic` is blank after trimming.
    pub fn new(
        topic: &str,
        context_text: Option<&str>,
        page_count: Option<i64>,
        richness: Richness,
        max_context_chars: usize,
    ) -> Result<Self, DeckError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(DeckError::InvalidInput("a topic is required".into()));
        }

        Ok(Self {
            topic: topic.to_string(),
            context_text: truncate_for_prompt(context_text.unwrap_or("").trim(), max_context_chars),
            page_count: clamp_page_count(page_count),
            richness,
        })
    }
}

/// Clamp a requested page count into `1..=MAX_PAGE_COUNT`; `None` → [`DEFAULT_PAGE_COUNT`].
pub fn clamp_page_count(requested: Option<i64>) -> usize {
    match requested {
        None => DEFAULT_PAGE_COUNT,
        Some(n) => n.clamp(1, MAX_PAGE_COUNT as i64) as usize,
    }
}

/// Bound `text` to `max_chars` characters, keeping its start and end.
///
/// The first 70 % and last 30 % of the budget survive around
/// [`TRUNCATION_MARKER`]: introductions and conclusions usually carry the
/// most signal for a deck.
pub fn truncate_for_prompt(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }

    let head_len = max_chars * 7 / 10;
    let tail_len = max_chars * 3 / 10;
    let head: String = text.chars().take(head_len).collect();
    let tail: String = text.chars().skip(total - tail_len).collect();
    format!("{head}{TRUNCATION_MARKER}{tail}")
}

/// The JSON body an HTTP caller posts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGenerationRequest {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub context_text: Option<String>,
    /// Number or numeric string; anything else falls back to the default.
    #[serde(default)]
    pub page_count: Option<Value>,
    #[serde(default)]
    pub richness: Option<String>,
}

impl RawGenerationRequest {
    /// Validate into a [`GenerationRequest`].
    ///
    /// Unknown richness values fall back to `balanced`; only a missing or
    /// blank topic is an error.
    pub fn into_request(self, max_context_chars: usize) -> Result<GenerationRequest, DeckError> {
        let richness = self
            .richness
            .as_deref()
            .and_then(|r| r.parse().ok())
            .unwrap_or_default();
        let page_count = self.page_count.as_ref().and_then(parse_page_count);

        GenerationRequest::new(
            self.topic.as_deref().unwrap_or(""),
            self.context_text.as_deref(),
            page_count,
            richness,
            max_context_chars,
        )
    }
}

/// Read a page count from a JSON number or a numeric string.
///
/// Fractions are truncated; `0`, non-numeric strings and other JSON types
/// count as "not given".
fn parse_page_count(v: &Value) -> Option<i64> {
    let n = match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        _ => None,
    };
    n.filter(|&n| n != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: Value) -> RawGenerationRequest {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn blank_topic_is_rejected() {
        let err = GenerationRequest::new("   ", None, None, Richness::Balanced, 100).unwrap_err();
        assert!(matches!(err, DeckError::InvalidInput(_)));
        assert!(raw(json!({})).into_request(100).is_err());
    }

    #[test]
    fn topic_is_trimmed() {
        let req = GenerationRequest::new("  AI \n", None, None, Richness::Balanced, 100).unwrap();
        assert_eq!(req.topic, "AI");
    }

    #[test]
    fn page_count_is_clamped() {
        assert_eq!(clamp_page_count(Some(50)), 20);
        assert_eq!(clamp_page_count(Some(-3)), 1);
        assert_eq!(clamp_page_count(Some(7)), 7);
        assert_eq!(clamp_page_count(None), DEFAULT_PAGE_COUNT);
    }

    #[test]
    fn raw_page_count_variants() {
        let pc = |v: Value| raw(json!({"topic": "t", "pageCount": v})).into_request(100).unwrap().page_count;
        assert_eq!(pc(json!(50)), 20);
        assert_eq!(pc(json!("8")), 8);
        assert_eq!(pc(json!(" 3.9 ")), 3);
        assert_eq!(pc(json!("lots")), DEFAULT_PAGE_COUNT);
        assert_eq!(pc(json!(0)), DEFAULT_PAGE_COUNT);
        assert_eq!(pc(json!(null)), DEFAULT_PAGE_COUNT);
        assert_eq!(pc(json!([1])), DEFAULT_PAGE_COUNT);
    }

    #[test]
    fn unknown_richness_falls_back() {
        let req = raw(json!({"topic": "t", "richness": "flowery"})).into_request(100).unwrap();
        assert_eq!(req.richness, Richness::Balanced);
        let req = raw(json!({"topic": "t", "richness": "concise"})).into_request(100).unwrap();
        assert_eq!(req.richness, Richness::Concise);
    }

    #[test]
    fn short_context_is_untouched() {
        assert_eq!(truncate_for_prompt("hello", 10), "hello");
    }

    #[test]
    fn long_context_keeps_head_and_tail() {
        let text: String = ('a'..='z').cycle().take(1000).collect();
        let out = truncate_for_prompt(&text, 100);
        assert!(out.starts_with(&text[..70]));
        assert!(out.ends_with(&text[970..]));
        assert!(out.contains(TRUNCATION_MARKER));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "é".repeat(500);
        let out = truncate_for_prompt(&text, 10);
        assert_eq!(out.chars().filter(|&c| c == 'é').count(), 10);
    }
}
