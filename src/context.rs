//! Context documents: turn a user-supplied file into prompt text.
//!
//! Only formats that already are text are read here. Binary office formats
//! (PDF, DOCX, PPTX) need a dedicated extractor and are rejected with
//! [`DeckError::UnsupportedFormat`] so the caller can convert them first.

use crate::error::DeckError;
use std::path::Path;
use tracing::debug;

/// Extensions read verbatim as UTF-8 text.
pub const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "csv", "json", "html", "htm"];

/// Read a context document as text.
///
/// Invalid UTF-8 sequences are replaced rather than rejected; stray bytes in
/// a pasted document should not sink the whole request.
pub async fn load_context(path: impl AsRef<Path>) -> Result<String, DeckError> {
    let path = path.as_ref();
    check_supported(path)?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| DeckError::ContextReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    let text = String::from_utf8_lossy(&bytes).into_owned();
    debug!("Loaded {} chars of context from {}", text.len(), path.display());
    Ok(text)
}

fn check_supported(path: &Path) -> Result<(), DeckError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if TEXT_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(DeckError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension,
        })
    }
}
