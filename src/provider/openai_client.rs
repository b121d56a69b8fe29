use crate::{
    config::ProviderConfig,
    error::{Result, StylegenError},
    models::{ApiErrorResponse, ImageSize, ImagesGenerationRequest, ImagesGenerationResponse},
    provider::traits::ImageProvider,
};
use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Client for an OpenAI-compatible `images/generations` endpoint.
#[derive(Clone)]
pub struct OpenAiImageClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OpenAiImageClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StylegenError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            model: config.model().to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/images/generations", self.base_url)
    }

    fn build_headers(credential: &str) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        let auth: header::HeaderValue = format!("Bearer {}", credential)
            .parse()
            .map_err(|_| StylegenError::Validation("API key contains invalid characters".into()))?;
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        Ok(headers)
    }
}

/// Pulls a readable message out of a provider error body.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.trim().is_empty() => format!("Error from image API ({})", status),
        Err(_) => format!("Error from image API ({}): {}", status, body.trim()),
    }
}

/// A success without any URL is an item failure with no message of its own;
/// the relay fills in the indexed fallback text.
fn first_image_url(response: ImagesGenerationResponse) -> Result<String> {
    response.data.into_iter().find_map(|d| d.url).ok_or_else(|| {
        log::warn!("Image API returned no image URL");
        StylegenError::Upstream(String::new())
    })
}

#[async_trait]
impl ImageProvider for OpenAiImageClient {
    async fn generate_image(
        &self,
        credential: &str,
        prompt: &str,
        size: ImageSize,
    ) -> Result<String> {
        let payload = ImagesGenerationRequest {
            model: &self.model,
            prompt,
            n: 1,
            size: size.as_str(),
        };

        log::debug!("Requesting one {} image from {}", size, self.model);

        let response = self
            .client
            .post(self.endpoint())
            .headers(Self::build_headers(credential)?)
            .json(&payload)
            .send()
            .await
            .map_err(|e| StylegenError::Upstream(format!("Image API request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(status, &body);
            log::warn!("Image API returned {}: {}", status, message);
            return Err(StylegenError::Upstream(message));
        }

        let parsed: ImagesGenerationResponse = response
            .json()
            .await
            .map_err(|e| StylegenError::Upstream(format!("Invalid image API response: {}", e)))?;

        if let Some(revised) = parsed.data.first().and_then(|d| d.revised_prompt.as_deref()) {
            log::debug!("Provider revised prompt: {}", revised);
        }

        first_image_url(parsed)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
