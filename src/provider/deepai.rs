use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{error_detail, ImageProvider};
use crate::core::{GenerationError, GenerationRequest, ImageReference, ModelChoice};

/// DeepAI text2img provider
pub struct DeepAiProvider {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

#[derive(Debug, Deserialize)]
struct Text2ImgResponse {
    output_url: Option<String>,
}

impl DeepAiProvider {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// DeepAI exposes the model tier directly; quality has no counterpart.
    fn build_form(request: &GenerationRequest) -> reqwest::multipart::Form {
        let version = match request.model {
            ModelChoice::Hd => "hd",
            ModelChoice::Standard | ModelChoice::Genius => "standard",
        };

        reqwest::multipart::Form::new()
            .text("text", request.prompt.trim().to_string())
            .text("image_generator_version", version)
    }
}

#[async_trait]
impl ImageProvider for DeepAiProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<ImageReference, GenerationError> {
        let url = format!("{}/api/text2img", self.base_url);

        tracing::debug!(
            "Sending DeepAI request to {}: model={}, prompt={}",
            url,
            request.model,
            request.prompt_preview(60)
        );

        let response = self
            .client
            .post(&url)
            .header("api-key", self.api_key.expose_secret())
            .multipart(Self::build_form(request))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("DeepAI request failed: {}", e);
                GenerationError::Transport(e)
            })?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!("Response status: {}", status);
        tracing::debug!("Response body: {}", body);

        if !status.is_success() {
            tracing::warn!("DeepAI API error ({}): {}", status, body);
            return Err(GenerationError::from_status(status, error_detail(&body)));
        }

        let parsed: Text2ImgResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::warn!("Failed to parse DeepAI response: {}", e);
            GenerationError::no_image()
        })?;

        parsed
            .output_url
            .filter(|u| !u.trim().is_empty())
            .map(ImageReference::url)
            .ok_or_else(GenerationError::no_image)
    }

    fn name(&self) -> &str {
        "deepai"
    }
}
