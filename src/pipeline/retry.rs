//! Retry and model fallback.
//!
//! ## Strategy
//!
//! Models are tried in the configured order. Each gets up to
//! `max_retries` attempts:
//!
//! * success → return immediately
//! * transient failure (overload, quota) → wait `base * attempt + jitter`,
//!   then retry the same model; after the last attempt, fall back
//! * fatal failure → fall back at once, no retry
//!
//! With the defaults (3 attempts, 2000 ms base, ≤ 1000 ms jitter) a model
//! that stays overloaded costs at most ~9 s before the next one is tried.
//! The jitter keeps concurrent requests that failed together from retrying
//! together. Total attempts never exceed `models.len() * max_retries`.

use crate::config::{GenerationParams, ModelConfig, RetryPolicy};
use crate::error::{FailureKind, PipelineError};
use crate::pipeline::invoke::{invoke, InvocationOutcome, TextGenerator};
use crate::progress::GenerationProgressCallback;
use rand::Rng;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

/// Text returned by the first model that succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub model: String,
    /// Attempts across all models, including the successful one.
    pub attempts: u32,
}

/// Drive `generator` across `models` until one returns text.
///
/// # Errors
/// * [`PipelineError::NoModelsConfigured`] for an empty list
/// * [`PipelineError::AllModelsFailed`] once the last model is exhausted,
///   carrying the last failure reason
pub async fn run_with_fallback(
    generator: &dyn TextGenerator,
    models: &[ModelConfig],
    defaults: &GenerationParams,
    policy: &RetryPolicy,
    system_instruction: &str,
    user_prompt: &str,
    progress: Option<&dyn GenerationProgressCallback>,
) -> Result<Completion, PipelineError> {
    if models.is_empty() {
        return Err(PipelineError::NoModelsConfigured);
    }

    let max_attempts = policy.max_retries.max(1);
    let mut total_attempts = 0u32;
    let mut last_reason = String::new();

    for (idx, model) in models.iter().enumerate() {
        for attempt in 1..=max_attempts {
            total_attempts += 1;
            if let Some(cb) = progress {
                cb.on_attempt_start(&model.name, attempt);
            }

            let outcome = invoke(generator, model, defaults, system_instruction, user_prompt).await;
            let (kind, reason) = match outcome {
                InvocationOutcome::Success(text) => {
                    info!(
                        "Model {} answered after {} attempt(s) in total",
                        model.name, total_attempts
                    );
                    if let Some(cb) = progress {
                        cb.on_complete(&model.name, total_attempts);
                    }
                    return Ok(Completion {
                        text,
                        model: model.name.clone(),
                        attempts: total_attempts,
                    });
                }
                InvocationOutcome::TransientFailure(reason) => (FailureKind::Transient, reason),
                InvocationOutcome::FatalFailure(reason) => (FailureKind::Fatal, reason),
            };

            let backoff = (kind == FailureKind::Transient && attempt < max_attempts)
                .then(|| backoff_delay(policy, attempt));

            warn!(
                "Model {}: attempt {}/{} failed ({:?}): {}",
                model.name, attempt, max_attempts, kind, reason
            );
            if let Some(cb) = progress {
                cb.on_attempt_failed(&model.name, attempt, kind, &reason, backoff);
            }
            last_reason = reason;

            match backoff {
                Some(delay) => sleep(delay).await,
                None => break,
            }
        }

        if let Some(next) = models.get(idx + 1) {
            warn!("Falling back from {} to {}", model.name, next.name);
            if let Some(cb) = progress {
                cb.on_fallback(&model.name, &next.name);
            }
        }
    }

    Err(PipelineError::AllModelsFailed {
        attempts: total_attempts,
        last_reason,
    })
}

/// Delay before retry number `attempt` (1-indexed) of the same model.
pub fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let jitter = if policy.max_jitter_ms > 0 {
        rand::thread_rng().gen_range(0..=policy.max_jitter_ms)
    } else {
        0
    };
    Duration::from_millis(
        policy
            .backoff_base_ms
            .saturating_mul(u64::from(attempt))
            .saturating_add(jitter),
    )
}
