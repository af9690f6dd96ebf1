//! Progress-callback trait for retry and fallback events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to observe
//! the pipeline as it walks the model list: which model is being tried,
//! which attempts failed and why, and which model finally answered.
//!
//! # Example
//!
//! ```rust
//! use deckgen::{GenerationConfig, GenerationProgressCallback};
//! use std::sync::Arc;
//!
//! struct Log;
//!
//! impl GenerationProgressCallback for Log {
//!     fn on_fallback(&self, from: &str, to: &str) {
//!         eprintln!("{from} gave up, trying {to}");
//!     }
//! }
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(Arc::new(Log) as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::FailureKind;
use std::sync::Arc;
use std::time::Duration;

/// Called by the retry/fallback pipeline as it makes progress.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`: one config
/// (and therefore one callback) is shared by every concurrent request.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called just before a model call is sent.
    ///
    /// # Arguments
    /// * `model`: model name
    /// * `attempt`: 1-indexed attempt number for this model
    fn on_attempt_start(&self, model: &str, attempt: u32) {
        let _ = (model, attempt);
    }

    /// Called when a model call fails.
    ///
    /// # Arguments
    /// * `model`: model name
    /// * `attempt`: 1-indexed attempt number for this model
    /// * `kind`: transient (may be retried) or fatal
    /// * `reason`: human-readable error description
    /// * `backoff`: delay before the next attempt on the same model, if any
    fn on_attempt_failed(
        &self,
        model: &str,
        attempt: u32,
        kind: FailureKind,
        reason: &str,
        backoff: Option<Duration>,
    ) {
        let _ = (model, attempt, kind, reason, backoff);
    }

    /// Called when the pipeline abandons `from` and moves on to `to`.
    fn on_fallback(&self, from: &str, to: &str) {
        let _ = (from, to);
    }

    /// Called once when a model returns text.
    ///
    /// # Arguments
    /// * `model`: model that answered
    /// * `total_attempts`: attempts across all models, including this one
    fn on_complete(&self, model: &str, total_attempts: u32) {
        let _ = (model, total_attempts);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        transient: AtomicUsize,
        fatal: AtomicUsize,
        fallbacks: AtomicUsize,
        completed_after: AtomicU32,
    }

    impl GenerationProgressCallback for TrackingCallback {
        fn on_attempt_start(&self, _model: &str, _attempt: u32) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_attempt_failed(
            &self,
            _model: &str,
            _attempt: u32,
            kind: FailureKind,
            _reason: &str,
            _backoff: Option<Duration>,
        ) {
            match kind {
                FailureKind::Transient => self.transient.fetch_add(1, Ordering::SeqCst),
                FailureKind::Fatal => self.fatal.fetch_add(1, Ordering::SeqCst),
            };
        }

        fn on_fallback(&self, _from: &str, _to: &str) {
            self.fallbacks.fetch_add(1, Ordering::SeqCst);
        }

        fn on_complete(&self, _model: &str, total_attempts: u32) {
            self.completed_after.store(total_attempts, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_attempt_start("m", 1);
        cb.on_attempt_failed("m", 1, FailureKind::Transient, "busy", None);
        cb.on_fallback("m", "n");
        cb.on_complete("n", 2);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_attempt_start("a", 1);
        tracker.on_attempt_failed(
            "a",
            1,
            FailureKind::Transient,
            "503",
            Some(Duration::from_millis(10)),
        );
        tracker.on_attempt_start("a", 2);
        tracker.on_attempt_failed("a", 2, FailureKind::Fatal, "400", None);
        tracker.on_fallback("a", "b");
        tracker.on_attempt_start("b", 1);
        tracker.on_complete("b", 3);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.transient.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.fatal.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.fallbacks.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.completed_after.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_attempt_start("gemini-pro", 1);
        cb.on_complete("gemini-pro", 1);
    }
}
