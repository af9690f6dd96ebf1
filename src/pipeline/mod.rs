//! Pipeline stages for turning a model response into a deck.
//!
//! Each submodule implements exactly one step and is tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! retry ──▶ invoke ──▶ sanitize ──▶ extract ──▶ validate
//! (fallback) (1 call)   (fences)     (JSON)      (slides)
//! ```
//!
//! 1. [`retry`]: walk the model list, retrying transient failures with
//!    linear backoff and jitter; the only stage that sleeps
//! 2. [`invoke`]: one call through a [`invoke::TextGenerator`], classified
//!    as success, transient or fatal; [`llm`] is the production backend
//! 3. [`sanitize`]: strip markdown code fences the model wrapped around
//!    its answer
//! 4. [`extract`]: cut the outermost `{…}` and parse it as JSON
//! 5. [`validate`]: require a `slides` array, then normalise every slide

pub mod extract;
pub mod invoke;
pub mod llm;
pub mod retry;
pub mod sanitize;
pub mod validate;
