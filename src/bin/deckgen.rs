//! CLI binary for deckgen.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `GenerationConfig` and prints the resulting deck.

use anyhow::{Context, Result};
use clap::Parser;
use deckgen::{
    generate_deck, generate_deck_for, list_models, load_context, write_deck, ErrorResponse,
    FailureKind, GenerateResponse, GenerationConfig, GenerationProgressCallback, GenerationRequest,
    LlmGenerator, ProgressCallback, Richness, SlidingWindowLimiter,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner naming the model being tried, plus
/// one log line per failed attempt and per fallback.
struct CliProgressCallback {
    spinner: ProgressBar,
    failures: AtomicU32,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        spinner.set_style(style);
        spinner.set_prefix("Generating");
        spinner.set_message("building prompt…");
        spinner.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            spinner,
            failures: AtomicU32::new(0),
        })
    }

    /// Stop the spinner without a success line (used on pipeline errors).
    fn abandon(&self) {
        self.spinner.finish_and_clear();
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_attempt_start(&self, model: &str, attempt: u32) {
        if attempt == 1 {
            self.spinner.set_message(model.to_string());
        } else {
            self.spinner.set_message(format!("{model} (attempt {attempt})"));
        }
    }

    fn on_attempt_failed(
        &self,
        model: &str,
        attempt: u32,
        kind: FailureKind,
        reason: &str,
        backoff: Option<Duration>,
    ) {
        self.failures.fetch_add(1, Ordering::SeqCst);

        // Upstream error bodies can be long; keep one line per attempt.
        let msg: String = if reason.chars().count() > 80 {
            let mut s: String = reason.chars().take(79).collect();
            s.push('\u{2026}');
            s
        } else {
            reason.to_string()
        };

        let next = match (kind, backoff) {
            (FailureKind::Transient, Some(d)) => dim(&format!("retry in {:.1}s", d.as_secs_f64())),
            (FailureKind::Transient, None) => dim("attempts exhausted"),
            (FailureKind::Fatal, _) => dim("not retryable"),
        };

        self.spinner.println(format!(
            "  {} {:<20} #{}  {}  {}",
            red("✗"),
            model,
            attempt,
            red(&msg),
            next
        ));
    }

    fn on_fallback(&self, from: &str, to: &str) {
        self.spinner
            .println(format!("  {} {} → {}", cyan("↪"), dim(from), bold(to)));
    }

    fn on_complete(&self, model: &str, total_attempts: u32) {
        self.spinner.finish_and_clear();
        let failed = self.failures.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!("{} {} answered", green("✔"), bold(model));
        } else {
            eprintln!(
                "{} {} answered after {} attempts ({} failed)",
                cyan("⚠"),
                bold(model),
                total_attempts,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Five-slide deck on a topic (stdout)
  deckgen "Rust ownership"

  # Use a context document and write Markdown to a file
  deckgen "Quarterly review" --context notes.md --pages 8 -o review.md

  # Terse bullets, custom fallback order
  deckgen "Kubernetes basics" --richness concise \
      --model gemini-2.0-flash --model gemini-1.5-flash

  # JSON payload including the raw model response
  deckgen "Solar power" --json --raw > deck.json

  # Which models can this key use?
  deckgen --list-models

FALLBACK:
  Models are tried in the order given. Transient failures (overload, quota,
  timeouts) are retried on the same model with a growing delay; anything
  else moves on to the next model at once.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY         Google Gemini API key (GOOGLE_API_KEY also accepted)
  DECKGEN_MODELS         Comma-separated fallback list
  DECKGEN_PROVIDER       Provider name (gemini, openai, anthropic, ollama)
  RUST_LOG               Override the log filter (e.g. deckgen=debug)
"#;

/// Generate slide-deck content with LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "deckgen",
    version,
    about = "Generate slide-deck content with LLMs",
    long_about = "Generate slide-deck content (titles, bullets, speaker notes) for a topic, \
optionally grounded in a context document. Malformed model output is repaired where possible; \
overloaded models are retried and then replaced by the next model in the fallback list.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Presentation topic.
    #[arg(required_unless_present = "list_models")]
    topic: Option<String>,

    /// Text document (txt, md, csv, json, html) to ground the deck in.
    #[arg(long, env = "DECKGEN_CONTEXT")]
    context: Option<PathBuf>,

    /// Number of slides (clamped to 1–20; default 5).
    #[arg(long, env = "DECKGEN_PAGES", allow_negative_numbers = true)]
    pages: Option<i64>,

    /// Bullet style: concise, balanced, verbose.
    #[arg(long, env = "DECKGEN_RICHNESS", value_enum, default_value = "balanced")]
    richness: RichnessArg,

    /// Model to try; repeat for a fallback list (first is tried first).
    #[arg(
        long = "model",
        env = "DECKGEN_MODELS",
        value_delimiter = ',',
        long_help = "Model to try. Repeat the flag (or pass a comma-separated list) to build \
          the fallback order.\nDefault: gemini-2.0-flash, gemini-1.5-flash, gemini-pro."
    )]
    models: Vec<String>,

    /// LLM provider: gemini, openai, anthropic, ollama.
    #[arg(long, env = "DECKGEN_PROVIDER", default_value = "gemini")]
    provider: String,

    /// Client identity the rate limit is counted against.
    #[arg(long, env = "DECKGEN_CLIENT_KEY", default_value = "cli")]
    client_key: String,

    /// Requests allowed per client within --rate-window.
    #[arg(long, env = "DECKGEN_RATE_LIMIT")]
    rate_limit: Option<usize>,

    /// Rate-limit window in seconds.
    #[arg(long, env = "DECKGEN_RATE_WINDOW", default_value_t = 60)]
    rate_window: u64,

    /// Attempts per model before falling back.
    #[arg(long, env = "DECKGEN_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Backoff base in milliseconds (n-th retry waits n × base + jitter).
    #[arg(long, env = "DECKGEN_BACKOFF_MS", default_value_t = 2000)]
    backoff_ms: u64,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "DECKGEN_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "DECKGEN_MAX_TOKENS", default_value_t = 1400)]
    max_tokens: usize,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "DECKGEN_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Write Markdown to this file instead of stdout.
    #[arg(short, long, env = "DECKGEN_OUTPUT")]
    output: Option<PathBuf>,

    /// Output the JSON response payload instead of Markdown.
    #[arg(long, env = "DECKGEN_JSON")]
    json: bool,

    /// Include the raw model response in JSON output.
    #[arg(long, requires = "json")]
    raw: bool,

    /// List the models available to the API key and exit.
    #[arg(long)]
    list_models: bool,

    /// API key used by --list-models.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// HTTP timeout for --list-models, in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Disable the progress spinner.
    #[arg(long, env = "DECKGEN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DECKGEN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DECKGEN_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum RichnessArg {
    Concise,
    Balanced,
    Verbose,
}

impl From<RichnessArg> for Richness {
    fn from(v: RichnessArg) -> Self {
        match v {
            RichnessArg::Concise => Richness::Concise,
            RichnessArg::Balanced => Richness::Balanced,
            RichnessArg::Verbose => Richness::Verbose,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner already reports retries and fallbacks; keep library logs
    // down to errors while it is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.list_models;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── List-models mode ─────────────────────────────────────────────────
    if cli.list_models {
        return print_models(&cli).await;
    }

    // ── Build request and config ─────────────────────────────────────────
    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(
        &cli,
        progress
            .clone()
            .map(|cb| cb as Arc<dyn GenerationProgressCallback>),
    )
    .await?;

    let context = match cli.context {
        Some(ref path) => Some(
            load_context(path)
                .await
                .with_context(|| format!("Failed to load context from {:?}", path))?,
        ),
        None => None,
    };

    let request = GenerationRequest::new(
        cli.topic.as_deref().unwrap_or_default(),
        context.as_deref(),
        cli.pages,
        cli.richness.clone().into(),
        config.max_context_chars,
    )
    .context("Invalid request")?;

    // ── Generate ─────────────────────────────────────────────────────────
    let result = if config.rate_limiter.is_some() {
        generate_deck_for(&cli.client_key, &request, &config).await
    } else {
        generate_deck(&request, &config).await
    };

    let deck = match result {
        Ok(deck) => deck,
        Err(e) => {
            if let Some(ref cb) = progress {
                cb.abandon();
            }
            if cli.json {
                let body = serde_json::to_string_pretty(&ErrorResponse::from(&e))
                    .context("Failed to serialise error")?;
                println!("{body}");
            } else if let Some(raw) = e.raw_response() {
                if !cli.quiet {
                    eprintln!("{}\n{}", dim("Raw model response:"), raw);
                }
            }
            return Err(anyhow::Error::new(e).context("Generation failed"));
        }
    };

    // ── Output ───────────────────────────────────────────────────────────
    if let Some(ref output_path) = cli.output {
        write_deck(&deck, output_path)
            .await
            .context("Failed to write deck")?;
        if !cli.quiet {
            eprintln!(
                "{}  {} slides  →  {}",
                green("✔"),
                deck.slides.len(),
                bold(&output_path.display().to_string()),
            );
        }
    } else if cli.json {
        let json = serde_json::to_string_pretty(&GenerateResponse::from_deck(&deck, cli.raw))
            .context("Failed to serialise output")?;
        println!("{json}");
    } else {
        let markdown = deck.to_markdown();
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(markdown.as_bytes())
            .context("Failed to write to stdout")?;
        if !markdown.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    Ok(())
}

/// Map CLI args to `GenerationConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GenerationConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = GenerationConfig::builder()
        .provider_name(cli.provider.clone())
        .max_retries(cli.max_retries)
        .retry_backoff_ms(cli.backoff_ms)
        .temperature(cli.temperature)
        .max_output_tokens(cli.max_tokens);

    let models: Vec<&str> = cli
        .models
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .collect();
    if !models.is_empty() {
        builder = builder.model_names(models.iter().copied());
    }

    // A missing API key must fail here, not inside the retry loop.
    let generator = LlmGenerator::new(cli.provider.clone());
    let first_model = models.first().copied().unwrap_or(deckgen::config::DEFAULT_MODELS[0]);
    generator
        .preflight(first_model)
        .context("LLM provider is not configured")?;
    builder = builder.generator(Arc::new(generator));

    if let Some(limit) = cli.rate_limit {
        builder = builder.rate_limiter(Arc::new(SlidingWindowLimiter::new(
            limit,
            Duration::from_secs(cli.rate_window),
        )));
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}

/// `--list-models`: print the models that can generate content.
async fn print_models(cli: &Cli) -> Result<()> {
    let api_key = cli
        .api_key
        .clone()
        .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
        .unwrap_or_default();

    let models = list_models(&api_key, None, Duration::from_secs(cli.timeout))
        .await
        .context("Failed to list models")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&models).context("Failed to serialise models")?;
        println!("{json}");
        return Ok(());
    }

    for model in models.iter().filter(|m| m.supports_generation()) {
        match model.display_name {
            Some(ref name) => println!("{:<32} {}", model.id(), dim(name)),
            None => println!("{}", model.id()),
        }
    }
    Ok(())
}
