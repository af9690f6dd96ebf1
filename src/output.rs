//! Output types: the generated deck and the response payloads built from it.

use crate::error::DeckError;
use serde::{Deserialize, Serialize};

/// One slide of a generated deck. Identity is its position in the deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub title: String,
    #[serde(default)]
    pub bullets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A validated deck plus the text it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckResult {
    pub slides: Vec<Slide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Unmodified model response, kept for diagnostics.
    pub raw: String,
    /// Model that produced the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl DeckResult {
    /// Render the deck as Markdown, one `---`-separated section per slide.
    ///
    /// The layout is the one Marp and reveal.js read, so the file doubles as
    /// a presentable deck.
    pub fn to_markdown(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(self.slides.len() + 1);

        for slide in &self.slides {
            let mut section = format!("# {}\n", slide.title);
            if !slide.bullets.is_empty() {
                section.push('\n');
                for bullet in &slide.bullets {
                    section.push_str(&format!("- {}\n", bullet));
                }
            }
            if let Some(ref notes) = slide.notes {
                section.push_str(&format!("\n<!-- notes: {} -->\n", notes.replace("-->", "--\u{200B}>")));
            }
            parts.push(section);
        }

        if let Some(ref summary) = self.summary {
            parts.push(format!("## Summary\n\n{}\n", summary));
        }

        parts.join("\n---\n\n")
    }
}

/// Success payload: `{ ok, slides, summary?, raw?, model? }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub ok: bool,
    pub slides: Vec<Slide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl GenerateResponse {
    /// Build the payload; `include_raw` controls whether the model text is echoed.
    pub fn from_deck(deck: &DeckResult, include_raw: bool) -> Self {
        Self {
            ok: true,
            slides: deck.slides.clone(),
            summary: deck.summary.clone(),
            raw: include_raw.then(|| deck.raw.clone()),
            model: deck.model.clone(),
        }
    }
}

/// Failure payload: `{ error, raw? }`, sent with [`DeckError::status_code`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Unusable model text, when the model did answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl From<&DeckError> for ErrorResponse {
    fn from(e: &DeckError) -> Self {
        Self {
            error: e.user_message(),
            raw: e.raw_response().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck() -> DeckResult {
        DeckResult {
            slides: vec![
                Slide {
                    title: "Intro".into(),
                    bullets: vec!["one".into(), "two".into()],
                    notes: Some("say hi".into()),
                },
                Slide {
                    title: "End".into(),
                    bullets: vec![],
                    notes: None,
                },
            ],
            summary: Some("Short.".into()),
            raw: "{}".into(),
            model: Some("gemini-pro".into()),
        }
    }

    #[test]
    fn markdown_has_one_section_per_slide() {
        let md = deck().to_markdown();
        assert!(md.starts_with("# Intro\n\n- one\n- two\n"));
        assert!(md.contains("<!-- notes: say hi -->"));
        assert!(md.contains("# End\n"));
        assert!(md.ends_with("## Summary\n\nShort.\n"));
        assert_eq!(md.matches("\n---\n").count(), 2);
    }

    #[test]
    fn response_omits_raw_unless_asked() {
        let d = deck();
        let v = serde_json::to_value(GenerateResponse::from_deck(&d, false)).unwrap();
        assert_eq!(v["ok"], true);
        assert!(v.get("raw").is_none());
        assert_eq!(v["slides"][0]["bullets"][1], "two");
        assert!(v["slides"][1].get("notes").is_none());

        let v = serde_json::to_value(GenerateResponse::from_deck(&d, true)).unwrap();
        assert_eq!(v["raw"], "{}");
    }

    #[test]
    fn error_response_carries_raw_text() {
        let e = DeckError::ValidationFailed {
            model: "m".into(),
            reason: "response has no 'slides' array".into(),
            raw: "{\"pages\": []}".into(),
        };
        let body = ErrorResponse::from(&e);
        assert_eq!(body.raw.as_deref(), Some("{\"pages\": []}"));
        assert!(body.error.contains("slides"));
    }
}
