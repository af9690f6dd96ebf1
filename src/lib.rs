//! # deckgen
//!
//! Generate slide-deck content with LLMs and turn whatever the model sends
//! back into a validated deck.
//!
//! ## Why this crate?
//!
//! Models asked for "JSON only" still wrap it in code fences, prepend a
//! sentence of chatter, drop fields, or answer with `503 overloaded` at peak
//! hours. This crate sits between the caller and the model: it retries and
//! falls back across an ordered model list, strips fences, extracts the
//! outermost JSON object and normalises every slide, so the caller always
//! gets either a usable deck or a typed error carrying the raw text.
//!
//! ## Pipeline Overview
//!
//! ```text
//! request
//!  │
//!  ├─ 1. Admit     per-client sliding-window rate limit
//!  ├─ 2. Prompt    schema instruction + topic, bounded context, page limit
//!  ├─ 3. Generate  retry transient failures, fall back across models
//!  ├─ 4. Sanitize  strip ``` / ~~~ fences
//!  ├─ 5. Extract   outermost {…} → serde_json::Value
//!  └─ 6. Validate  require slides[], fill titles, truncate to page limit
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deckgen::{generate_deck, GenerationConfig, GenerationRequest, Richness};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider reads GEMINI_API_KEY from the environment.
//!     let config = GenerationConfig::default();
//!     let request = GenerationRequest::new(
//!         "Rust ownership",
//!         None,
//!         Some(6),
//!         Richness::Balanced,
//!         config.max_context_chars,
//!     )?;
//!     let deck = generate_deck(&request, &config).await?;
//!     println!("{}", deck.to_markdown());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `deckgen` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! deckgen = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod generate;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod ratelimit;
pub mod request;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    GenerationConfig, GenerationConfigBuilder, GenerationOverrides, GenerationParams, ModelConfig,
    Richness, RetryPolicy,
};
pub use context::load_context;
pub use error::{DeckError, FailureKind, UpstreamError};
pub use export::write_deck;
pub use generate::{generate_deck, generate_deck_for, generate_deck_sync, generate_to_file};
pub use models::{list_models, ModelInfo};
pub use output::{DeckResult, ErrorResponse, GenerateResponse, Slide};
pub use pipeline::invoke::{GenerationCall, TextGenerator};
pub use pipeline::llm::LlmGenerator;
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use ratelimit::{RateLimiter, SlidingWindowLimiter};
pub use request::{GenerationRequest, RawGenerationRequest};
