//! Prompts for slide-deck generation.
//!
//! The system instruction fixes the JSON schema; the user prompt carries the
//! per-request topic, context, page limit and richness. Callers can replace
//! the system instruction via [`crate::config::GenerationConfig::system_prompt`].

use crate::request::GenerationRequest;

/// Default system instruction: the JSON schema plus style rules.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = r#"You are a professional presentation designer.

Your output MUST be a single valid JSON object (no extra text, no code fences) with this shape:
{
  "slides": [
    {
      "title": "Slide title",
      "bullets": ["Point 1", "Point 2"],
      "notes": "Speaker notes (optional)"
    }
  ],
  "summary": "A one- or two-sentence summary (optional)"
}

Rules:
- Follow the requested page count as closely as you can. If the material does not fill it, merge content sensibly rather than padding.
- richness: "concise" => bullets are short phrases; "balanced" => complete sentences; "verbose" => detailed sentences, at most 6 bullets per slide.
- Prefer facts from the supplied context. When it is thin you may add common background knowledge, but never invent specific citations or figures.
- Output ONLY the JSON object."#;

/// Extra system message sent when the model config asks for JSON mode.
pub const JSON_MODE_REMINDER: &str =
    "Respond with application/json only. The first character of your reply must be '{' and the last must be '}'.";

/// Placeholder used when the caller supplies no context.
pub const NO_CONTEXT_MARKER: &str = "(no additional material provided)";

/// Build the user message for `request`.
///
/// `request.page_count` is already clamped and `request.context_text` already
/// bounded by [`GenerationRequest::new`], so this is pure formatting.
pub fn build_user_prompt(request: &GenerationRequest) -> String {
    let context = if request.context_text.is_empty() {
        NO_CONTEXT_MARKER
    } else {
        request.context_text.as_str()
    };

    format!(
        "Topic: {topic}\n\n\
         Supplementary material (may be truncated):\n{context}\n\n\
         Create the presentation content from the material above. The output must be valid JSON \
         following the schema from the system instruction, with no extra text.\n\
         Additional requirements:\n\
         - Produce at most {pages} slides.\n\
         - richness: {richness}\n",
        topic = request.topic,
        context = context,
        pages = request.page_count,
        richness = request.richness,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Richness;

    #[test]
    fn system_instruction_names_schema_keys() {
        for key in ["\"slides\"", "\"title\"", "\"bullets\"", "\"notes\"", "\"summary\""] {
            assert!(DEFAULT_SYSTEM_INSTRUCTION.contains(key), "missing {key}");
        }
    }

    #[test]
    fn user_prompt_carries_request_fields() {
        let req = GenerationRequest::new("Rust ownership", Some("Borrowing rules."), Some(4), Richness::Verbose, 3800)
            .unwrap();
        let prompt = build_user_prompt(&req);
        assert!(prompt.contains("Topic: Rust ownership"));
        assert!(prompt.contains("Borrowing rules."));
        assert!(prompt.contains("at most 4 slides"));
        assert!(prompt.contains("richness: verbose"));
    }

    #[test]
    fn user_prompt_marks_missing_context() {
        let req = GenerationRequest::new("AI", None, None, Richness::default(), 3800).unwrap();
        assert!(build_user_prompt(&req).contains(NO_CONTEXT_MARKER));
    }
}
