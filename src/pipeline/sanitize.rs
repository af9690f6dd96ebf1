//! Fence stripping: remove markdown code-fence wrappers from model output.
//!
//! Models asked for "JSON only" still answer with
//!
//! ````text
//! ```json
//! { "slides": [ … ] }
//! ```
//! ````
//!
//! often enough that every response goes through [`sanitize`] before JSON
//! extraction. Only the outer fence lines are removed; the interior bytes
//! are returned as-is apart from trimming at the very ends.

use once_cell::sync::Lazy;
use regex::Regex;

/// An opening fence line: three or more backticks or tildes, then an optional info string.
static RE_OPENING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:`{3,}|~{3,})[ \t]*[\w+.#-]*[ \t]*\r?$").unwrap());

/// A closing fence line: only backticks or tildes.
static RE_CLOSING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:`{3,}|~{3,})[ \t]*\r?$").unwrap());

/// Strip an outer code fence and surrounding whitespace.
///
/// * ```` ```json\n{…}\n``` ```` → `{…}`
/// * no fence → trimmed input
/// * opening fence without a closing one → everything after the opening line
/// * a single line wrapped in backticks (```` ```{…}``` ````) → the backticks removed
///
/// Never fails; an empty or whitespace-only input yields an empty string.
pub fn sanitize(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") && !trimmed.starts_with("~~~") {
        return trimmed.to_string();
    }

    let Some((first, rest)) = trimmed.split_once('\n') else {
        return strip_inline_fence(trimmed);
    };

    if !RE_OPENING_FENCE.is_match(first) {
        // Something like "```{"a":1}\n```": content starts on the fence line.
        return strip_inline_fence(trimmed);
    }

    let body = match rest.rsplit_once('\n') {
        Some((body, last)) if RE_CLOSING_FENCE.is_match(last) => body,
        None if RE_CLOSING_FENCE.is_match(rest) => "",
        _ => rest,
    };

    body.trim().to_string()
}

fn strip_inline_fence(line: &str) -> String {
    line.trim_matches(['`', '~']).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        let input = "```json\n{\"slides\":[]}\n```";
        assert_eq!(sanitize(input), "{\"slides\":[]}");
    }

    #[test]
    fn strips_fence_without_language() {
        let input = "```\n{\"a\": 1}\n```";
        assert_eq!(sanitize(input), "{\"a\": 1}");
    }

    #[test]
    fn strips_tilde_fence() {
        assert_eq!(sanitize("~~~json\n[1]\n~~~"), "[1]");
    }

    #[test]
    fn no_fence_is_trimmed_passthrough() {
        assert_eq!(sanitize("  \n{\"a\": 1}\n\n"), "{\"a\": 1}");
    }

    #[test]
    fn interior_is_byte_identical() {
        let interior = "{\n  \"title\": \"Line one\",\n\n  \"code\": \"```not a fence```\"\n}";
        let input = format!("```json\n{interior}\n```\n");
        assert_eq!(sanitize(&input), interior);
    }

    #[test]
    fn interior_fence_lines_survive() {
        let interior = "{\"md\": \"x\"}\n```\nstill content";
        let input = format!("```\n{interior}\n```");
        assert_eq!(sanitize(&input), interior);
    }

    #[test]
    fn unterminated_fence_keeps_rest() {
        assert_eq!(sanitize("```json\n{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn crlf_fences() {
        assert_eq!(sanitize("```json\r\n{\"a\": 1}\r\n```\r\n"), "{\"a\": 1}");
    }

    #[test]
    fn single_line_fence() {
        assert_eq!(sanitize("```{\"a\": 1}```"), "{\"a\": 1}");
    }

    #[test]
    fn empty_input() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("   \n "), "");
        assert_eq!(sanitize("```\n```"), "");
    }

    #[test]
    fn prose_around_fence_is_not_a_fence() {
        let input = "Here you go:\n```json\n{}\n```";
        assert_eq!(sanitize(input), input);
    }
}
