//! Listing the models a Generative Language API key can use.
//!
//! Handy for picking a fallback list: `deckgen --list-models` prints the
//! models that support `generateContent`.

use crate::error::DeckError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Public Generative Language endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Generation method a model must support to be usable for decks.
pub const GENERATE_CONTENT: &str = "generateContent";

/// One entry of the model list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Resource name, e.g. `models/gemini-2.0-flash`.
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    /// Model id without the `models/` prefix, as passed to a provider.
    pub fn id(&self) -> &str {
        self.name.strip_prefix("models/").unwrap_or(self.name.as_str())
    }

    pub fn supports_generation(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == GENERATE_CONTENT)
    }
}

#[derive(Debug, Deserialize)]
struct ModelListPage {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

/// Fetch the model list for `api_key`.
///
/// `base_url` defaults to [`DEFAULT_BASE_URL`]; tests and proxies can point
/// it elsewhere.
///
/// # Errors
/// [`DeckError::ProviderNotConfigured`] for a blank key,
/// [`DeckError::ModelListFailed`] for transport, status or decoding failures.
pub async fn list_models(
    api_key: &str,
    base_url: Option<&str>,
    timeout: Duration,
) -> Result<Vec<ModelInfo>, DeckError> {
    if api_key.trim().is_empty() {
        return Err(DeckError::ProviderNotConfigured {
            provider: "gemini".into(),
            hint: "Set GEMINI_API_KEY to list models.".into(),
        });
    }

    let base = base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');
    let url = format!("{base}/v1beta/models");
    info!("Listing models from {}", url);

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DeckError::ModelListFailed(e.to_string()))?;

    let response = client
        .get(&url)
        .query(&[("key", api_key)])
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                DeckError::ModelListFailed(format!("timed out after {}s", timeout.as_secs()))
            } else {
                DeckError::ModelListFailed(e.to_string())
            }
        })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| DeckError::ModelListFailed(e.to_string()))?;

    if !status.is_success() {
        return Err(DeckError::ModelListFailed(format!("HTTP {status}: {body}")));
    }

    let models = parse_model_list(&body)?;
    debug!("{} models listed", models.len());
    Ok(models)
}

/// Decode a `GET /v1beta/models` response body.
pub fn parse_model_list(body: &str) -> Result<Vec<ModelInfo>, DeckError> {
    serde_json::from_str::<ModelListPage>(body)
        .map(|page| page.models)
        .map_err(|e| DeckError::ModelListFailed(format!("unexpected response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "models": [
            {
                "name": "models/gemini-2.0-flash",
                "displayName": "Gemini 2.0 Flash",
                "supportedGenerationMethods": ["generateContent", "countTokens"]
            },
            {
                "name": "models/text-embedding-004",
                "supportedGenerationMethods": ["embedContent"]
            }
        ],
        "nextPageToken": "abc"
    }"#;

    #[test]
    fn parses_model_list() {
        let models = parse_model_list(BODY).unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].id(), "gemini-2.0-flash");
        assert_eq!(models[0].display_name.as_deref(), Some("Gemini 2.0 Flash"));
        assert!(models[0].supports_generation());
        assert!(!models[1].supports_generation());
        assert_eq!(models[1].display_name, None);
    }

    #[test]
    fn empty_object_is_empty_list() {
        assert!(parse_model_list("{}").unwrap().is_empty());
    }

    #[test]
    fn garbage_is_list_failure() {
        assert!(matches!(
            parse_model_list("<html>"),
            Err(DeckError::ModelListFailed(_))
        ));
    }

    /// Serve one canned HTTP response on a local port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let reply = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn list_models_decodes_body_over_http() {
        let base = serve_once("HTTP/1.1 200 OK", BODY).await;
        let models = list_models("key", Some(&base), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].id(), "gemini-2.0-flash");
    }

    #[tokio::test]
    async fn error_status_keeps_body_in_message() {
        let base = serve_once("HTTP/1.1 403 Forbidden", r#"{"error":"API key not valid"}"#).await;
        let err = list_models("key", Some(&base), Duration::from_secs(5))
            .await
            .unwrap_err();
        match err {
            DeckError::ModelListFailed(msg) => {
                assert!(msg.contains("403"), "got: {msg}");
                assert!(msg.contains("API key not valid"), "got: {msg}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_key_is_rejected_before_any_request() {
        let err = list_models("  ", Some("http://127.0.0.1:9"), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DeckError::ProviderNotConfigured { .. }));
    }
}
