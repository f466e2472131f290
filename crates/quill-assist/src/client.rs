//! Reqwest implementation of the assist service client.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use quill_core::{defaults, AssistBackend, Error, Result};

/// Default assist service endpoint.
pub const DEFAULT_ASSIST_URL: &str = defaults::ASSIST_URL;

/// Timeout for assist requests (seconds). PDF processing dominates.
pub const ASSIST_TIMEOUT_SECS: u64 = defaults::ASSIST_TIMEOUT_SECS;

/// HTTP client for the assist service.
pub struct AssistClient {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl AssistClient {
    /// Create a new assist client with default settings.
    pub fn new() -> Self {
        Self::with_config(DEFAULT_ASSIST_URL.to_string(), ASSIST_TIMEOUT_SECS)
    }

    /// Create a new assist client with custom configuration.
    pub fn with_config(base_url: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        info!(
            "Initializing assist client: url={}, timeout={}s",
            base_url, timeout_secs
        );

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
        }
    }

    /// Create from environment variables.
    ///
    /// Reads `ASSIST_BASE_URL` and `ASSIST_TIMEOUT_SECS`, falling back to
    /// defaults when unset.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("ASSIST_BASE_URL").unwrap_or_else(|_| DEFAULT_ASSIST_URL.to_string());
        let timeout_secs = std::env::var("ASSIST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(ASSIST_TIMEOUT_SECS);

        Self::with_config(base_url, timeout_secs)
    }

    /// Base URL this client targets.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Internal JSON call shared by the text endpoints.
    ///
    /// Posts `body` to `path`, checks the status, and returns the parsed
    /// response. Non-2xx replies surface as `Error::Assist` carrying the
    /// upstream status and body.
    async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: for<'de> Deserialize<'de>,
    {
        let start = Instant::now();

        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Assist(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Assist(format!(
                "Assist service returned {}: {}",
                status, body
            )));
        }

        let result: Resp = response
            .json()
            .await
            .map_err(|e| Error::Assist(format!("Failed to parse response: {}", e)))?;

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(duration_ms = elapsed, path = path, "Assist call complete");
        if u128::from(elapsed) > defaults::ASSIST_SLOW_MS {
            warn!(
                duration_ms = elapsed,
                path = path,
                slow = true,
                "Slow assist operation"
            );
        }
        Ok(result)
    }
}

impl Default for AssistClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct TextRequest<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct StylizeRequest<'a> {
    text: &'a str,
    style: &'a str,
}

#[derive(Serialize)]
struct CollectionRequest<'a> {
    collection_name: &'a str,
}

#[derive(Serialize)]
struct QueryPdfRequest<'a> {
    collection_name: &'a str,
    question: &'a str,
}

#[derive(Deserialize)]
struct SummaryResponse {
    summary: String,
}

#[derive(Deserialize)]
struct KeypointsResponse {
    keypoints: String,
}

#[derive(Deserialize)]
struct StylizeResponse {
    styled_text: String,
}

#[derive(Deserialize)]
struct ProcessPdfResponse {
    collection_name: String,
}

#[derive(Deserialize)]
struct QueryPdfResponse {
    answer: String,
}

#[async_trait]
impl AssistBackend for AssistClient {
    #[instrument(skip(self, text), fields(subsystem = "assist", component = "client", op = "summarize", text_len = text.len()))]
    async fn summarize(&self, text: &str) -> Result<String> {
        let resp: SummaryResponse = self
            .post_json("/summarize_text/", &TextRequest { text })
            .await?;
        Ok(resp.summary)
    }

    #[instrument(skip(self, text), fields(subsystem = "assist", component = "client", op = "keypoints", text_len = text.len()))]
    async fn keypoints(&self, text: &str) -> Result<String> {
        let resp: KeypointsResponse = self.post_json("/keypoints", &TextRequest { text }).await?;
        Ok(resp.keypoints)
    }

    #[instrument(skip(self, text, style), fields(subsystem = "assist", component = "client", op = "stylize", text_len = text.len(), style = %style))]
    async fn stylize(&self, text: &str, style: &str) -> Result<String> {
        let resp: StylizeResponse = self
            .post_json("/stylize", &StylizeRequest { text, style })
            .await?;
        Ok(resp.styled_text)
    }

    #[instrument(skip(self, data), fields(subsystem = "assist", component = "client", op = "process_pdf", filename = %filename, size_bytes = data.len()))]
    async fn process_pdf(&self, filename: &str, data: Vec<u8>) -> Result<String> {
        let start = Instant::now();

        let part = Part::bytes(data)
            .file_name(filename.to_string())
            .mime_str("application/pdf")
            .map_err(|e| Error::Assist(format!("Invalid multipart payload: {}", e)))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/process-pdf", self.base_url))
            .timeout(Duration::from_secs(self.timeout_secs))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Assist(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Assist(format!(
                "Assist service returned {}: {}",
                status, body
            )));
        }

        let result: ProcessPdfResponse = response
            .json()
            .await
            .map_err(|e| Error::Assist(format!("Failed to parse response: {}", e)))?;

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            duration_ms = elapsed,
            collection = %result.collection_name,
            "PDF processed"
        );
        if u128::from(elapsed) > defaults::ASSIST_SLOW_MS {
            warn!(duration_ms = elapsed, slow = true, "Slow PDF processing");
        }
        Ok(result.collection_name)
    }

    #[instrument(skip(self, question), fields(subsystem = "assist", component = "client", op = "query_pdf", collection = %collection_name))]
    async fn query_pdf(&self, collection_name: &str, question: &str) -> Result<String> {
        let resp: QueryPdfResponse = self
            .post_json(
                "/query-pdf",
                &QueryPdfRequest {
                    collection_name,
                    question,
                },
            )
            .await?;
        Ok(resp.answer)
    }

    #[instrument(skip(self), fields(subsystem = "assist", component = "client", op = "delete_pdf", collection = %collection_name))]
    async fn delete_pdf(&self, collection_name: &str) -> Result<()> {
        let _: serde_json::Value = self
            .post_json("/delete-pdf", &CollectionRequest { collection_name })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constants() {
        assert_eq!(DEFAULT_ASSIST_URL, "http://127.0.0.1:8000");
        assert_eq!(ASSIST_TIMEOUT_SECS, 120);
    }

    #[test]
    fn test_default_config() {
        let client = AssistClient::new();
        assert_eq!(client.base_url(), DEFAULT_ASSIST_URL);
        assert_eq!(client.timeout_secs, ASSIST_TIMEOUT_SECS);
    }

    #[test]
    fn test_with_config_strips_trailing_slash() {
        let client = AssistClient::with_config("http://assist.internal:9000/".to_string(), 15);
        assert_eq!(client.base_url(), "http://assist.internal:9000");
        assert_eq!(client.timeout_secs, 15);
    }

    #[test]
    fn test_request_serialization_shapes() {
        let text = serde_json::to_value(TextRequest { text: "hello" }).unwrap();
        assert_eq!(text, serde_json::json!({"text": "hello"}));

        let stylize = serde_json::to_value(StylizeRequest {
            text: "hello",
            style: "formal",
        })
        .unwrap();
        assert_eq!(
            stylize,
            serde_json::json!({"text": "hello", "style": "formal"})
        );

        let query = serde_json::to_value(QueryPdfRequest {
            collection_name: "col-1",
            question: "what?",
        })
        .unwrap();
        assert_eq!(
            query,
            serde_json::json!({"collection_name": "col-1", "question": "what?"})
        );
    }

    #[test]
    fn test_response_deserialization_shapes() {
        let summary: SummaryResponse =
            serde_json::from_value(serde_json::json!({"summary": "short"})).unwrap();
        assert_eq!(summary.summary, "short");

        let processed: ProcessPdfResponse =
            serde_json::from_value(serde_json::json!({"collection_name": "col-9"})).unwrap();
        assert_eq!(processed.collection_name, "col-9");
    }
}
