//! Deck generation entry points.
//!
//! ```text
//! request ─▶ rate limit ─▶ prompt ─▶ retry/fallback ─▶ sanitize ─▶ extract ─▶ validate ─▶ deck
//! ```
//!
//! Everything below this module returns stage-specific errors; here they are
//! folded into [`DeckError`], the only error type callers see.

use crate::config::GenerationConfig;
use crate::error::{DeckError, ExtractError, PipelineError};
use crate::export::write_deck;
use crate::output::DeckResult;
use crate::pipeline::invoke::TextGenerator;
use crate::pipeline::llm::LlmGenerator;
use crate::pipeline::{extract, retry, sanitize, validate};
use crate::prompts::{build_user_prompt, DEFAULT_SYSTEM_INSTRUCTION};
use crate::request::GenerationRequest;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Generate a deck for `request`.
///
/// Equivalent to [`generate_deck_for`] without a client key: the configured
/// rate limiter, if any, is not consulted.
///
/// # Errors
/// * [`DeckError::AllModelsFailed`] when no model produced text
/// * [`DeckError::ExtractionFailed`] / [`DeckError::ValidationFailed`] when
///   the text is unusable (the raw text is attached)
/// * [`DeckError::ProviderNotConfigured`] when no backend can be built
pub async fn generate_deck(
    request: &GenerationRequest,
    config: &GenerationConfig,
) -> Result<DeckResult, DeckError> {
    run(None, request, config).await
}

/// Generate a deck on behalf of `client_key` (IP address, user id, …).
///
/// The configured rate limiter is consulted first; a throttled client gets
/// [`DeckError::RateLimited`] without any model being called.
pub async fn generate_deck_for(
    client_key: &str,
    request: &GenerationRequest,
    config: &GenerationConfig,
) -> Result<DeckResult, DeckError> {
    run(Some(client_key), request, config).await
}

/// Generate a deck and write it as Markdown to `output_path`.
///
/// The file is replaced atomically via [`write_deck`].
pub async fn generate_to_file(
    request: &GenerationRequest,
    output_path: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<DeckResult, DeckError> {
    let deck = generate_deck(request, config).await?;
    write_deck(&deck, output_path).await?;
    Ok(deck)
}

/// Synchronous wrapper around [`generate_deck`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_deck_sync(
    request: &GenerationRequest,
    config: &GenerationConfig,
) -> Result<DeckResult, DeckError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DeckError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_deck(request, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run(
    client_key: Option<&str>,
    request: &GenerationRequest,
    config: &GenerationConfig,
) -> Result<DeckResult, DeckError> {
    let start = Instant::now();

    // ── Step 1: Admission ────────────────────────────────────────────────
    match (client_key, config.rate_limiter.as_ref()) {
        (Some(key), Some(limiter)) => {
            limiter.check_and_record(key).await.map_err(|e| {
                warn!("{}", e);
                DeckError::from(e)
            })?;
        }
        (None, Some(_)) => debug!("Rate limiter configured but no client key given; not consulted"),
        _ => {}
    }

    info!(
        "Generating up to {} slides on '{}' ({})",
        request.page_count, request.topic, request.richness
    );

    // ── Step 2: Prompt ───────────────────────────────────────────────────
    let page_limit = request.page_count.min(config.max_page_count).max(1);
    let system_instruction = config
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_INSTRUCTION);
    let user_prompt = if page_limit == request.page_count {
        build_user_prompt(request)
    } else {
        build_user_prompt(&GenerationRequest {
            page_count: page_limit,
            ..request.clone()
        })
    };

    // ── Step 3: Retry/fallback across models ─────────────────────────────
    let generator = resolve_generator(config)?;
    let completion = retry::run_with_fallback(
        generator.as_ref(),
        &config.models,
        &config.generation_defaults(),
        &config.retry_policy(),
        system_instruction,
        &user_prompt,
        config.progress_callback.as_deref(),
    )
    .await
    .map_err(|e| match e {
        PipelineError::NoModelsConfigured => {
            DeckError::InvalidConfig("At least one model must be configured".into())
        }
        PipelineError::AllModelsFailed {
            attempts,
            last_reason,
        } => {
            error!("Generation failed after {} attempts: {}", attempts, last_reason);
            DeckError::AllModelsFailed {
                models: config.models.len(),
                attempts,
                last_reason,
            }
        }
    })?;

    // ── Step 4: Normalise the response ───────────────────────────────────
    let cleaned = sanitize::sanitize(&completion.text);
    let parsed = extract::extract(&cleaned).map_err(|e| {
        warn!("Model {} returned unparseable text: {}", completion.model, e);
        let reason = match &e {
            ExtractError::NoJsonBoundary => e.to_string(),
            ExtractError::ParseFailed { reason, .. } => reason.clone(),
        };
        DeckError::ExtractionFailed {
            model: completion.model.clone(),
            reason,
            raw: completion.text.clone(),
        }
    })?;

    let mut deck = validate::validate(&parsed, page_limit, &completion.text).map_err(|e| {
        warn!("Model {} returned JSON without slides", completion.model);
        DeckError::ValidationFailed {
            model: completion.model.clone(),
            reason: e.to_string(),
            raw: completion.text.clone(),
        }
    })?;
    deck.model = Some(completion.model);

    info!(
        "Deck ready: {} slides in {}ms",
        deck.slides.len(),
        start.elapsed().as_millis()
    );
    Ok(deck)
}

/// Use the injected backend, or build the default `edgequake_llm` one.
fn resolve_generator(config: &GenerationConfig) -> Result<Arc<dyn TextGenerator>, DeckError> {
    if let Some(ref generator) = config.generator {
        return Ok(Arc::clone(generator));
    }

    let name = config.provider_name.trim();
    if name.is_empty() {
        return Err(DeckError::ProviderNotConfigured {
            provider: String::new(),
            hint: "Set a provider name (e.g. gemini) or inject a generator.".into(),
        });
    }
    Ok(Arc::new(LlmGenerator::new(name)))
}
