//! Production [`TextGenerator`] backed by `edgequake_llm` providers.
//!
//! `ProviderFactory::create_llm_provider(provider, model)` binds a provider
//! to one model, so [`LlmGenerator`] keeps one provider per model name and
//! creates it on first use. The provider reads its API key from the
//! environment (`GEMINI_API_KEY`, `OPENAI_API_KEY`, …).
//!
//! `edgequake_llm` reports failures as typed [`LlmError`] variants. Throttling,
//! timeouts and network errors are marked transient; auth, request, model and
//! token-limit errors are marked fatal. Only the untyped variants (`ApiError`,
//! `ProviderError`, `Unknown`) are left to the message heuristics in
//! [`super::invoke::classify_failure`].

use crate::error::{DeckError, FailureKind, UpstreamError};
use crate::pipeline::invoke::{GenerationCall, TextGenerator};
use crate::prompts::JSON_MODE_REMINDER;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, LlmError, ProviderFactory};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::debug;

/// Generates text through a named `edgequake_llm` provider.
pub struct LlmGenerator {
    provider_name: String,
    providers: Mutex<HashMap<String, Arc<dyn LLMProvider>>>,
}

impl LlmGenerator {
    pub fn new(provider_name: impl Into<String>) -> Self {
        Self {
            provider_name: provider_name.into(),
            providers: Mutex::new(HashMap::new()),
        }
    }

    /// Eagerly bind `model`, surfacing configuration problems (missing API
    /// key, unknown provider) before the first request.
    pub fn preflight(&self, model: &str) -> Result<(), DeckError> {
        self.provider_for(model)
            .map(|_| ())
            .map_err(|e| DeckError::ProviderNotConfigured {
                provider: self.provider_name.clone(),
                hint: e.message,
            })
    }

    fn provider_for(&self, model: &str) -> Result<Arc<dyn LLMProvider>, UpstreamError> {
        let mut providers = self
            .providers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(p) = providers.get(model) {
            return Ok(Arc::clone(p));
        }

        let provider = ProviderFactory::create_llm_provider(&self.provider_name, model).map_err(|e| {
            UpstreamError::new(format!(
                "provider '{}' unavailable for model '{}': {e}",
                self.provider_name, model
            ))
        })?;
        providers.insert(model.to_string(), Arc::clone(&provider));
        Ok(provider)
    }
}

#[async_trait]
impl TextGenerator for LlmGenerator {
    async fn generate(&self, call: &GenerationCall<'_>) -> Result<String, UpstreamError> {
        let provider = self.provider_for(call.model)?;

        let mut messages = vec![ChatMessage::system(call.system_instruction)];
        if call.params.json_mode {
            messages.push(ChatMessage::system(JSON_MODE_REMINDER));
        }
        messages.push(ChatMessage::user(call.user_prompt));

        let options = build_options(call);
        let start = Instant::now();
        let response = provider
            .chat(&messages, Some(&options))
            .await
            .map_err(upstream_error)?;

        debug!(
            "Model {}: {} input tokens, {} output tokens, {:?}",
            call.model,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }
}

/// Map a provider error onto an [`UpstreamError`], keeping its retryability.
fn upstream_error(e: LlmError) -> UpstreamError {
    let message = e.to_string();
    match e {
        LlmError::RateLimited(_) | LlmError::Timeout | LlmError::NetworkError(_) => {
            UpstreamError::with_kind(FailureKind::Transient, message)
        }
        LlmError::AuthError(_)
        | LlmError::InvalidRequest(_)
        | LlmError::ModelNotFound(_)
        | LlmError::TokenLimitExceeded { .. }
        | LlmError::ConfigError(_)
        | LlmError::NotSupported(_)
        | LlmError::SerializationError(_) => UpstreamError::with_kind(FailureKind::Fatal, message),
        _ => UpstreamError::new(message),
    }
}

/// Build `CompletionOptions` from the resolved call parameters.
fn build_options(call: &GenerationCall<'_>) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(call.params.temperature),
        max_tokens: Some(call.params.max_output_tokens),
        response_format: call.params.json_mode.then(|| "json_object".to_string()),
        ..Default::default()
    }
}
