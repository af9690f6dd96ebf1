//! Writing generated decks to disk.

use crate::error::DeckError;
use crate::output::DeckResult;
use std::path::Path;
use tracing::info;

/// Write `deck` as Markdown to `path`, creating parent directories as needed.
///
/// Uses atomic write (temp file + rename) so readers never see a partial deck.
pub async fn write_deck(deck: &DeckResult, path: impl AsRef<Path>) -> Result<(), DeckError> {
    let path = path.as_ref();
    let write_err = |e| DeckError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, deck.to_markdown())
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    info!("Wrote {} slides to {}", deck.slides.len(), path.display());
    Ok(())
}
