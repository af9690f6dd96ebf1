//! Configuration types for slide-deck generation.
//!
//! All generation behaviour is controlled through [`GenerationConfig`], built
//! via its [`GenerationConfigBuilder`]. The config owns the collaborators a
//! request needs (generation backend, rate limiter, progress callback) so the
//! process entry point constructs them once and every request shares them.

use crate::error::DeckError;
use crate::pipeline::invoke::TextGenerator;
use crate::progress::ProgressCallback;
use crate::ratelimit::RateLimiter;
use crate::request::MAX_PAGE_COUNT;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Models tried in order when the caller does not name any.
pub const DEFAULT_MODELS: &[&str] = &["gemini-2.0-flash", "gemini-1.5-flash", "gemini-pro"];

/// Provider handed to `edgequake_llm::ProviderFactory` when none is named.
pub const DEFAULT_PROVIDER: &str = "gemini";

/// Configuration for slide-deck generation.
///
/// Built via [`GenerationConfig::builder()`] or using
/// [`GenerationConfig::default()`].
///
/// # Example
/// ```rust
/// use deckgen::{GenerationConfig, ModelConfig};
///
/// let config = GenerationConfig::builder()
///     .models(vec![ModelConfig::new("gemini-2.0-flash"), ModelConfig::new("gemini-pro")])
///     .max_retries(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// Ordered fallback list. The first entry is tried first.
    pub models: Vec<ModelConfig>,

    /// Provider name for the default backend (e.g. "gemini", "openai").
    pub provider_name: String,

    /// Pre-constructed generation backend. Takes precedence over `provider_name`.
    pub generator: Option<Arc<dyn TextGenerator>>,

    /// Consulted before any model call by [`crate::generate_deck_for`].
    /// [`crate::generate_deck`] has no client key and skips it.
    pub rate_limiter: Option<Arc<dyn RateLimiter>>,

    /// Receives retry and fallback events.
    pub progress_callback: Option<ProgressCallback>,

    /// Sampling temperature. Default: 0.2.
    ///
    /// Deck content should follow the requested structure closely; a low
    /// temperature keeps the JSON shape stable across calls.
    pub temperature: f32,

    /// Output-token cap per call. Default: 1400.
    pub max_output_tokens: usize,

    /// Ask the provider for a JSON-only response. Default: true.
    pub json_mode: bool,

    /// Attempts per model before falling back to the next one. Default: 3.
    pub max_retries: u32,

    /// Backoff base in milliseconds. Default: 2000.
    ///
    /// The n-th retry of a model waits `retry_backoff_ms * n` plus jitter.
    pub retry_backoff_ms: u64,

    /// Upper bound of the random delay added to each backoff. Default: 1000.
    pub max_jitter_ms: u64,

    /// Character budget for the user-supplied context. Default: 3800.
    pub max_context_chars: usize,

    /// Upper bound for the requested page count. Default: 20.
    ///
    /// Can only lower the limit: requests are already clamped to
    /// [`crate::request::MAX_PAGE_COUNT`], and the builder caps this value
    /// there too.
    pub max_page_count: usize,

    /// Custom system instruction. If None, uses the built-in default.
    pub system_prompt: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            models: DEFAULT_MODELS.iter().map(|m| ModelConfig::new(*m)).collect(),
            provider_name: DEFAULT_PROVIDER.to_string(),
            generator: None,
            rate_limiter: None,
            progress_callback: None,
            temperature: 0.2,
            max_output_tokens: 1400,
            json_mode: true,
            max_retries: 3,
            retry_backoff_ms: 2000,
            max_jitter_ms: 1000,
            max_context_chars: 3800,
            max_page_count: MAX_PAGE_COUNT,
            system_prompt: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("models", &self.models)
            .field("provider_name", &self.provider_name)
            .field("generator", &self.generator.as_ref().map(|_| "<dyn TextGenerator>"))
            .field("rate_limiter", &self.rate_limiter.as_ref().map(|_| "<dyn RateLimiter>"))
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("json_mode", &self.json_mode)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("max_jitter_ms", &self.max_jitter_ms)
            .field("max_context_chars", &self.max_context_chars)
            .field("max_page_count", &self.max_page_count)
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }

    /// The retry policy slice of this config.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff_base_ms: self.retry_backoff_ms,
            max_jitter_ms: self.max_jitter_ms,
        }
    }

    /// Generation parameters applied when a model has no override.
    pub fn generation_defaults(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            json_mode: self.json_mode,
        }
    }
}

/// Builder for [`GenerationConfig`].
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl fmt::Debug for GenerationConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl GenerationConfigBuilder {
    pub fn models(mut self, models: Vec<ModelConfig>) -> Self {
        self.config.models = models;
        self
    }

    /// Replace the model list with plain names, in order.
    pub fn model_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.models = names.into_iter().map(ModelConfig::new).collect();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.config.generator = Some(generator);
        self
    }

    pub fn rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.config.rate_limiter = Some(limiter);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_output_tokens(mut self, n: usize) -> Self {
        self.config.max_output_tokens = n.max(1);
        self
    }

    pub fn json_mode(mut self, v: bool) -> Self {
        self.config.json_mode = v;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n.max(1);
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn max_jitter_ms(mut self, ms: u64) -> Self {
        self.config.max_jitter_ms = ms;
        self
    }

    pub fn max_context_chars(mut self, n: usize) -> Self {
        self.config.max_context_chars = n;
        self
    }

    pub fn max_page_count(mut self, n: usize) -> Self {
        self.config.max_page_count = n.clamp(1, MAX_PAGE_COUNT);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, DeckError> {
        let c = &self.config;
        if c.models.is_empty() {
            return Err(DeckError::InvalidConfig(
                "At least one model must be configured".into(),
            ));
        }
        if let Some(m) = c.models.iter().find(|m| m.name.trim().is_empty()) {
            return Err(DeckError::InvalidConfig(format!(
                "Model names must not be blank: {m:?}"
            )));
        }
        if c.max_retries == 0 {
            return Err(DeckError::InvalidConfig("max_retries must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

// ── Model configs ────────────────────────────────────────────────────────

/// One entry in the ordered fallback list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider-side model identifier, e.g. "gemini-2.0-flash".
    pub name: String,
    /// Per-model generation parameters; unset fields use the config defaults.
    #[serde(default)]
    pub overrides: GenerationOverrides,
}

impl ModelConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            overrides: GenerationOverrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: GenerationOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Merge this model's overrides over `defaults`.
    pub fn resolve(&self, defaults: &GenerationParams) -> GenerationParams {
        GenerationParams {
            temperature: self.overrides.temperature.unwrap_or(defaults.temperature),
            max_output_tokens: self
                .overrides
                .max_output_tokens
                .unwrap_or(defaults.max_output_tokens),
            json_mode: self.overrides.json_mode.unwrap_or(defaults.json_mode),
        }
    }
}

/// Optional per-model generation parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_mode: Option<bool>,
}

/// Fully resolved parameters for one call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: usize,
    pub json_mode: bool,
}

/// Retry settings consumed by [`crate::pipeline::retry::run_with_fallback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per model, including the first one.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub max_jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        GenerationConfig::default().retry_policy()
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How much text each slide should carry.
///
/// | Richness | Bullets |
/// |----------|---------|
/// | concise  | short phrases |
/// | balanced | complete sentences (default) |
/// | verbose  | detailed sentences, at most six per slide |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Richness {
    Concise,
    #[default]
    Balanced,
    Verbose,
}

impl Richness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Richness::Concise => "concise",
            Richness::Balanced => "balanced",
            Richness::Verbose => "verbose",
        }
    }
}

impl fmt::Display for Richness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Richness {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "concise" => Ok(Richness::Concise),
            "balanced" => Ok(Richness::Balanced),
            "verbose" => Ok(Richness::Verbose),
            other => Err(DeckError::InvalidInput(format!(
                "unknown richness '{other}' (expected concise, balanced or verbose)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = GenerationConfig::default();
        assert_eq!(c.max_retries, 3);
        assert_eq!(c.retry_backoff_ms, 2000);
        assert_eq!(c.max_page_count, 20);
        assert_eq!(c.models.len(), DEFAULT_MODELS.len());
        assert_eq!(c.models[0].name, "gemini-2.0-flash");
    }

    #[test]
    fn max_page_count_only_lowers_the_limit() {
        let c = GenerationConfig::builder().max_page_count(30).build().unwrap();
        assert_eq!(c.max_page_count, MAX_PAGE_COUNT);
        let c = GenerationConfig::builder().max_page_count(3).build().unwrap();
        assert_eq!(c.max_page_count, 3);
        let c = GenerationConfig::builder().max_page_count(0).build().unwrap();
        assert_eq!(c.max_page_count, 1);
    }

    #[test]
    fn build_rejects_empty_model_list() {
        let err = GenerationConfig::builder().models(vec![]).build().unwrap_err();
        assert!(matches!(err, DeckError::InvalidConfig(_)));
    }

    #[test]
    fn build_rejects_blank_model_name() {
        let err = GenerationConfig::builder()
            .model_names(["gemini-pro", "  "])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("blank"));
    }

    #[test]
    fn max_retries_is_at_least_one() {
        let c = GenerationConfig::builder().max_retries(0).build().unwrap();
        assert_eq!(c.max_retries, 1);
    }

    #[test]
    fn overrides_merge_over_defaults() {
        let defaults = GenerationConfig::default().generation_defaults();
        let model = ModelConfig::new("x").with_overrides(GenerationOverrides {
            max_output_tokens: Some(8000),
            ..Default::default()
        });
        let p = model.resolve(&defaults);
        assert_eq!(p.max_output_tokens, 8000);
        assert_eq!(p.temperature, defaults.temperature);
        assert!(p.json_mode);
    }

    #[test]
    fn richness_parses_case_insensitively() {
        assert_eq!("Verbose".parse::<Richness>().unwrap(), Richness::Verbose);
        assert!("flowery".parse::<Richness>().is_err());
    }

    #[test]
    fn model_config_deserialises_without_overrides() {
        let m: ModelConfig = serde_json::from_str(r#"{"name":"gemini-pro"}"#).unwrap();
        assert_eq!(m, ModelConfig::new("gemini-pro"));
    }
}
