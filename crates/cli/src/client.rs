//! API client for communicating with the scoring service

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use scorer_lib::{HealthResponse, ScoreResponse};
use serde::de::DeserializeOwned;
use url::Url;

/// API client for the scoring service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(90))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// GET a JSON body, accepting any status that still carries one
    async fn get_any_status<T: DeserializeOwned>(&self, path: &str) -> Result<(StatusCode, T)> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let body = response.text().await.context("Failed to read response")?;
        let parsed = serde_json::from_str(&body)
            .with_context(|| format!("API error ({}): {}", status, body))?;
        Ok((status, parsed))
    }

    /// Score raw JSON text remotely. Error statuses still carry a
    /// `ScoreResponse` body, so the body is returned whatever the status.
    pub async fn score(&self, body: String) -> Result<ScoreResponse> {
        let url = self.base_url.join("score").context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let text = response.text().await.context("Failed to read response")?;
        serde_json::from_str(&text).with_context(|| format!("API error ({}): {}", status, text))
    }

    /// Fetch service health; unhealthy services answer 503 with a body
    pub async fn health(&self) -> Result<(StatusCode, HealthResponse)> {
        self.get_any_status("healthz").await
    }
}
