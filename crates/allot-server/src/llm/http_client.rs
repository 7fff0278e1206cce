// crates/allot-server/src/llm/http_client.rs
// Shared HTTP plumbing for all LLM provider adapters

use anyhow::{Result, anyhow};
use reqwest::Client;
use tracing::warn;

/// Thin wrapper over the shared reqwest client.
///
/// One attempt per call: retry and backoff belong to the allocation engine.
pub struct LlmHttpClient {
    client: Client,
}

impl LlmHttpClient {
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Send one request built by `build_request` and return the body text.
    ///
    /// `vendor` prefixes the error message, e.g. "Gemini API request failed: ...".
    pub async fn execute_request<F>(
        &self,
        request_id: &str,
        vendor: &str,
        body: String,
        build_request: F,
    ) -> Result<String>
    where
        F: FnOnce(&Client, String) -> reqwest::RequestBuilder,
    {
        let response = build_request(&self.client, body).send().await.map_err(|e| {
            // Gemini keys live in the query string
            let e = e.without_url();
            warn!(request_id = %request_id, error = %e, "{} request failed", vendor);
            anyhow!("{} API request failed: {}", vendor, e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(
                request_id = %request_id,
                status = %status,
                error = %error_body,
                "{} returned non-success status", vendor
            );
            return Err(anyhow!("{} API request failed: {} {}", vendor, status, error_body));
        }

        Ok(response.text().await?)
    }
}
