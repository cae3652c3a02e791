use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::provider_adapter::{get_adapter, ImageProviderAdapter};
use super::types::{GenerationInput, Prediction, PredictionStatus};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::utils::{sanitize_header_value, truncate_for_log};

/// One generation attempt against the inference provider.
///
/// Every failure surfaces as [`AppError::GenerationFailed`]. There is no retry and
/// no way to abort a call once it is issued.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn generate(&self, prompt: &str, credential: &str) -> AppResult<String>;
}

pub struct ReplicateClient {
    http: reqwest::Client,
    adapter: Box<dyn ImageProviderAdapter>,
    base_url: String,
    model: String,
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl ReplicateClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            adapter: get_adapter("replicate")?,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            poll_interval: config.poll_interval(),
            timeout: config.request_timeout(),
        })
    }

    /// The HTTP client, so image downloads share its connection pool.
    pub fn http_client(&self) -> reqwest::Client {
        self.http.clone()
    }

    async fn run_prediction(&self, prompt: &str, credential: &str) -> Result<String, String> {
        let url = self.adapter.endpoint(&self.base_url, &self.model);
        let create_headers = self.adapter.headers(credential);
        let body = self.adapter.body(&GenerationInput::for_prompt(prompt));

        info!(
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "Creating prediction"
        );
        debug!("Sending request to: {}", url);
        for (key, value) in &create_headers {
            debug!("  {}: {}", key, sanitize_header_value(key, value));
        }

        let response = self
            .http
            .post(&url)
            .headers(to_header_map(&create_headers)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;
        let mut prediction = self.read_prediction(response).await?;

        // Only the Authorization header is needed to follow the prediction
        let poll_headers: HashMap<String, String> = create_headers
            .into_iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("authorization"))
            .collect();

        while !prediction.status.is_terminal() {
            let poll_url = prediction
                .poll_url()
                .ok_or_else(|| "Prediction is still running but has no status URL".to_string())?;
            let poll_url = Url::parse(poll_url)
                .map_err(|e| format!("Invalid status URL {}: {}", poll_url, e))?;

            tokio::time::sleep(self.poll_interval).await;
            debug!(
                id = prediction.id.as_deref().unwrap_or("?"),
                status = ?prediction.status,
                "Polling prediction"
            );

            let response = self
                .http
                .get(poll_url)
                .headers(to_header_map(&poll_headers)?)
                .send()
                .await
                .map_err(|e| format!("Status request failed: {}", e))?;
            prediction = self.read_prediction(response).await?;
        }

        resolve_prediction(&prediction)
    }

    async fn read_prediction(&self, response: reqwest::Response) -> Result<Prediction, String> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(format!(
                "API error {}: {}",
                status,
                truncate_for_log(&error_text, 200)
            ));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse response: {}", e))?;
        self.adapter.parse_prediction(json)
    }
}

#[async_trait]
impl InferenceClient for ReplicateClient {
    async fn generate(&self, prompt: &str, credential: &str) -> AppResult<String> {
        let attempt = self.run_prediction(prompt, credential);
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, attempt)
                .await
                .unwrap_or_else(|_| Err(format!("No response after {}s", limit.as_secs()))),
            None => attempt.await,
        };

        match result {
            Ok(url) => {
                info!("Prediction succeeded");
                Ok(url)
            }
            Err(cause) => {
                warn!("Image generation failed: {}", cause);
                Err(AppError::GenerationFailed(cause))
            }
        }
    }
}

/// Maps a terminal prediction to the first output locator or a failure cause.
pub fn resolve_prediction(prediction: &Prediction) -> Result<String, String> {
    match prediction.status {
        PredictionStatus::Succeeded => prediction
            .first_output()
            .ok_or_else(|| "Provider returned no output".to_string()),
        PredictionStatus::Failed => Err(prediction.error_message()),
        PredictionStatus::Canceled => Err("prediction was canceled".to_string()),
        PredictionStatus::Starting | PredictionStatus::Processing => {
            Err(format!("prediction still {:?}", prediction.status).to_lowercase())
        }
    }
}

fn to_header_map(headers: &HashMap<String, String>) -> Result<HeaderMap, String> {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| format!("Invalid header name {}: {}", key, e))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| format!("Invalid value for header {}", key))?;
        map.insert(name, value);
    }
    Ok(map)
}
