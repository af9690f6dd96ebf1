//! Error types for the deckgen library.
//!
//! Two layers of errors reflect two layers of the pipeline:
//!
//! * Stage errors ([`ExtractError`], [`ValidationError`], [`PipelineError`],
//!   [`UpstreamError`], [`RateLimitExceeded`]) are returned by the individual
//!   stages and carry exactly the detail that stage knows about.
//!
//! * [`DeckError`] is the terminal outcome crossing into the caller (CLI,
//!   HTTP handler). Every stage error is folded into one of its variants by
//!   [`crate::generate::generate_deck`], and each variant maps onto an HTTP
//!   status via [`DeckError::status_code`].
//!
//! Responses that arrived but were unusable always keep the raw model text so
//! a caller can show it for debugging. Upstream reasons for a total failure are
//! logged, while [`DeckError::user_message`] hides them from end users.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// All terminal errors returned by the deckgen library.
#[derive(Debug, Error)]
pub enum DeckError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The request is unusable as given (e.g. blank topic).
    #[error("Invalid request: {0}")]
    InvalidInput(String),

    /// The caller exceeded its request budget.
    #[error("Too many requests for '{client_key}'; retry in {}s", .retry_after.as_secs_f64().ceil().max(1.0) as u64)]
    RateLimited {
        client_key: String,
        retry_after: Duration,
    },

    /// A context document has an extension we cannot read as text.
    #[error("Unsupported context format '{extension}' for '{path}'\nSupported: txt, md, markdown, csv, json, html")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// A context document could not be read.
    #[error("Failed to read context file '{path}': {source}")]
    ContextReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Upstream response errors ──────────────────────────────────────────
    /// The model answered but no JSON object could be recovered.
    #[error("Model response from '{model}' is not valid JSON: {reason}")]
    ExtractionFailed {
        model: String,
        reason: String,
        raw: String,
    },

    /// The model answered with JSON that does not describe a deck.
    #[error("Model response from '{model}' has no usable slides: {reason}")]
    ValidationFailed {
        model: String,
        reason: String,
        raw: String,
    },

    /// Every configured model failed; the last reason is kept for logs.
    #[error("All {models} models failed after {attempts} attempts.\nLast error: {last_reason}")]
    AllModelsFailed {
        models: usize,
        attempts: u32,
        last_reason: String,
    },

    // ── Provider errors ───────────────────────────────────────────────────
    /// The generation backend could not be constructed.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Listing upstream models failed.
    #[error("Failed to list models: {0}")]
    ModelListFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the exported deck.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeckError {
    /// HTTP status a request handler should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            DeckError::InvalidInput(_) | DeckError::ContextReadFailed { .. } => 400,
            DeckError::UnsupportedFormat { .. } => 415,
            DeckError::RateLimited { .. } => 429,
            DeckError::ExtractionFailed { .. }
            | DeckError::ValidationFailed { .. }
            | DeckError::ModelListFailed(_) => 502,
            DeckError::AllModelsFailed { .. } => 503,
            DeckError::ProviderNotConfigured { .. }
            | DeckError::OutputWriteFailed { .. }
            | DeckError::InvalidConfig(_)
            | DeckError::Internal(_) => 500,
        }
    }

    /// Message safe to show an end user.
    ///
    /// Upstream failure reasons can leak provider internals, so the terminal
    /// "all models failed" case is reported generically.
    pub fn user_message(&self) -> String {
        match self {
            DeckError::AllModelsFailed { .. } => {
                "Slide generation failed, please try again later.".to_string()
            }
            DeckError::ProviderNotConfigured { .. } => {
                "Server misconfiguration: no generation provider is available.".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Raw model text attached to the error, if the model did answer.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            DeckError::ExtractionFailed { raw, .. } | DeckError::ValidationFailed { raw, .. } => {
                Some(raw)
            }
            _ => None,
        }
    }
}

/// Failure to recover a JSON object from sanitized model text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// No `{` … `}` pair in the right order.
    #[error("no JSON object boundaries found")]
    NoJsonBoundary,

    /// A candidate slice was found but is not valid JSON.
    #[error("JSON parse failed: {reason}")]
    ParseFailed { raw: String, reason: String },
}

/// The parsed JSON does not describe a deck.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("response has no 'slides' array")]
    MissingSlides,
}

/// Whether an upstream failure is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Overload or quota throttling; expected to clear on retry.
    Transient,
    /// Anything else; retrying the same model will not help.
    Fatal,
}

/// An error reported by a [`crate::pipeline::invoke::TextGenerator`].
///
/// Backends fill in what they know: `kind` when the failure is already
/// typed, `status` when an HTTP status is available. Classification only
/// inspects the message when both are absent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}{message}", .status.map(|s| format!("[{s}] ")).unwrap_or_default())]
pub struct UpstreamError {
    pub kind: Option<FailureKind>,
    pub status: Option<u16>,
    pub message: String,
}

impl UpstreamError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: None,
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: None,
            status: Some(status),
            message: message.into(),
        }
    }

    /// An error whose retryability the backend has already decided.
    pub fn with_kind(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind: Some(kind),
            status: None,
            message: message.into(),
        }
    }
}

/// Terminal outcome of the retry/fallback pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("no models configured")]
    NoModelsConfigured,

    #[error("all models failed after {attempts} attempts: {last_reason}")]
    AllModelsFailed { attempts: u32, last_reason: String },
}

/// A client exceeded its request budget for the current window.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rate limit exceeded for '{client_key}' ({limit} requests per {}s)", .window.as_secs())]
pub struct RateLimitExceeded {
    pub client_key: String,
    pub limit: usize,
    pub window: Duration,
    /// Time until the oldest request in the window expires.
    pub retry_after: Duration,
}

impl From<RateLimitExceeded> for DeckError {
    fn from(e: RateLimitExceeded) -> Self {
        DeckError::RateLimited {
            client_key: e.client_key,
            retry_after: e.retry_after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_models_failed_hides_reason_from_users() {
        let e = DeckError::AllModelsFailed {
            models: 2,
            attempts: 6,
            last_reason: "[503] backend overloaded at pod-17".into(),
        };
        assert!(e.to_string().contains("pod-17"));
        assert!(!e.user_message().contains("pod-17"));
        assert_eq!(e.status_code(), 503);
    }

    #[test]
    fn rate_limited_display_rounds_up() {
        let e = DeckError::RateLimited {
            client_key: "10.0.0.1".into(),
            retry_after: Duration::from_millis(200),
        };
        let msg = e.to_string();
        assert!(msg.contains("10.0.0.1"), "got: {msg}");
        assert!(msg.contains("1s"), "got: {msg}");
        assert_eq!(e.status_code(), 429);
    }

    #[test]
    fn rate_limited_display_never_understates_wait() {
        let e = DeckError::RateLimited {
            client_key: "10.0.0.1".into(),
            retry_after: Duration::from_millis(1900),
        };
        assert!(e.to_string().ends_with("retry in 2s"), "got: {e}");

        let exact = DeckError::RateLimited {
            client_key: "10.0.0.1".into(),
            retry_after: Duration::from_secs(3),
        };
        assert!(exact.to_string().ends_with("retry in 3s"), "got: {exact}");
    }

    #[test]
    fn extraction_failure_keeps_raw_text() {
        let e = DeckError::ExtractionFailed {
            model: "gemini-2.0-flash".into(),
            reason: "no JSON object boundaries found".into(),
            raw: "Sorry, I cannot help".into(),
        };
        assert_eq!(e.raw_response(), Some("Sorry, I cannot help"));
        assert_eq!(e.status_code(), 502);
    }

    #[test]
    fn upstream_error_display_includes_status() {
        let e = UpstreamError::with_status(429, "quota");
        assert_eq!(e.to_string(), "[429] quota");
        assert_eq!(UpstreamError::new("boom").to_string(), "boom");
    }

    #[test]
    fn invalid_input_is_client_error() {
        assert_eq!(DeckError::InvalidInput("topic".into()).status_code(), 400);
    }
}
