//! Model invocation: one call to the generation backend, classified.
//!
//! [`TextGenerator`] is the seam between the pipeline and whatever actually
//! produces text (an `edgequake_llm` provider in production, a scripted stub
//! in tests). [`invoke`] performs exactly one call and folds the result into
//! an [`InvocationOutcome`]; retry policy lives in [`super::retry`].

use crate::config::{GenerationParams, ModelConfig};
use crate::error::{FailureKind, UpstreamError};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Everything a backend needs for one call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationCall<'a> {
    pub model: &'a str,
    pub system_instruction: &'a str,
    pub user_prompt: &'a str,
    pub params: GenerationParams,
}

/// A text-generation backend.
///
/// Implementations perform a single request and must not retry internally.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for `call`, returning the raw response text.
    async fn generate(&self, call: &GenerationCall<'_>) -> Result<String, UpstreamError>;
}

/// Result of a single invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    Success(String),
    TransientFailure(String),
    FatalFailure(String),
}

/// Call `generator` once for `model`, merging its overrides over `defaults`.
pub async fn invoke(
    generator: &dyn TextGenerator,
    model: &ModelConfig,
    defaults: &GenerationParams,
    system_instruction: &str,
    user_prompt: &str,
) -> InvocationOutcome {
    let call = GenerationCall {
        model: &model.name,
        system_instruction,
        user_prompt,
        params: model.resolve(defaults),
    };

    match generator.generate(&call).await {
        Ok(text) => {
            debug!("Model {}: {} chars returned", model.name, text.len());
            InvocationOutcome::Success(text)
        }
        Err(e) => match classify_failure(&e) {
            FailureKind::Transient => InvocationOutcome::TransientFailure(e.to_string()),
            FailureKind::Fatal => InvocationOutcome::FatalFailure(e.to_string()),
        },
    }
}

/// Message fragments that mark overload or quota throttling.
const TRANSIENT_MARKERS: &[&str] = &[
    "overloaded",
    "unavailable",
    "rate limit",
    "rate-limit",
    "ratelimit",
    "too many requests",
    "quota",
    "resource_exhausted",
    "resource exhausted",
    "try again later",
    "timed out",
    "timeout",
];

/// A bare 429 or 503 in the message text, not part of a longer number.
static TRANSIENT_STATUS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:429|503)\b").unwrap());

/// Decide whether an upstream error is worth retrying.
///
/// A backend-assigned `kind` wins. Otherwise the HTTP status decides: 408,
/// 429 and the 5xx gateway/overload family are transient, everything else
/// is fatal. Only errors with neither are matched against
/// [`TRANSIENT_MARKERS`]; some providers surface throttling only as text.
pub fn classify_failure(err: &UpstreamError) -> FailureKind {
    if let Some(kind) = err.kind {
        return kind;
    }

    if let Some(status) = err.status {
        return match status {
            408 | 429 | 500 | 502 | 503 | 504 => FailureKind::Transient,
            _ => FailureKind::Fatal,
        };
    }

    let message = err.message.to_ascii_lowercase();
    let transient = TRANSIENT_MARKERS.iter().any(|m| message.contains(m))
        || TRANSIENT_STATUS_RE.is_match(&message);
    if transient {
        FailureKind::Transient
    } else {
        FailureKind::Fatal
    }
}
