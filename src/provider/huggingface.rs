use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{error_detail, ImageProvider};
use crate::core::{GenerationError, GenerationRequest, ImageReference, ModelChoice, QualityLevel};

const MIN_STEPS: u32 = 10;
const MAX_STEPS: u32 = 50;
const MIN_GUIDANCE: f32 = 3.0;
const MAX_GUIDANCE: f32 = 12.0;

/// Hugging Face Inference API provider
pub struct HuggingFaceProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

/// Request body for a text-to-image model
#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize, PartialEq)]
struct InferenceParameters {
    num_inference_steps: u32,
    guidance_scale: f32,
    width: u32,
    height: u32,
}

impl InferenceParameters {
    fn for_request(model: ModelChoice, quality: QualityLevel) -> Self {
        let fraction = quality.fraction();
        let steps = MIN_STEPS + ((MAX_STEPS - MIN_STEPS) as f32 * fraction).round() as u32;
        let guidance = MIN_GUIDANCE + (MAX_GUIDANCE - MIN_GUIDANCE) * fraction;
        let side = match model {
            ModelChoice::Hd => 1024,
            ModelChoice::Standard | ModelChoice::Genius => 512,
        };

        Self {
            num_inference_steps: steps,
            guidance_scale: (guidance * 10.0).round() / 10.0,
            width: side,
            height: side,
        }
    }
}

/// JSON success bodies some hosted endpoints return instead of raw bytes
#[derive(Debug, Deserialize)]
struct JsonImageResponse {
    url: Option<String>,
    output_url: Option<String>,
    /// base64 encoded
    image: Option<String>,
}

impl HuggingFaceProvider {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: SecretString,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        }
    }

    fn parse_json_body(body: &[u8]) -> Result<ImageReference, GenerationError> {
        let parsed: JsonImageResponse = serde_json::from_slice(body).map_err(|e| {
            tracing::warn!("Unrecognized Hugging Face response: {}", e);
            GenerationError::no_image()
        })?;

        if let Some(url) = parsed.url.or(parsed.output_url).filter(|u| !u.trim().is_empty()) {
            return Ok(ImageReference::url(url));
        }

        match parsed.image {
            Some(data) => {
                let bytes = BASE64.decode(data.trim()).map_err(|e| {
                    tracing::warn!("Failed to decode base64 image: {}", e);
                    GenerationError::no_image()
                })?;
                if bytes.is_empty() {
                    return Err(GenerationError::no_image());
                }
                Ok(ImageReference::inline(bytes, "image/png"))
            }
            None => Err(GenerationError::no_image()),
        }
    }
}

#[async_trait]
impl ImageProvider for HuggingFaceProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<ImageReference, GenerationError> {
        let url = format!("{}/models/{}", self.base_url, self.model);
        let body = InferenceRequest {
            inputs: request.prompt.trim(),
            parameters: InferenceParameters::for_request(request.model, request.quality),
        };

        tracing::debug!("Sending Hugging Face request to: {}", url);
        tracing::debug!("Request parameters: {:?}", body.parameters);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .header(ACCEPT, "image/png")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Hugging Face request failed: {}", e);
                GenerationError::Transport(e)
            })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = response.bytes().await?;

        tracing::debug!(
            "Response status: {}, content type: {}, {} bytes",
            status,
            content_type,
            bytes.len()
        );

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            tracing::warn!("Hugging Face API error ({}): {}", status, body);
            return Err(GenerationError::from_status(status, error_detail(&body)));
        }

        if content_type.starts_with("image/") {
            if bytes.is_empty() {
                return Err(GenerationError::no_image());
            }
            let mime_type = content_type
                .split(';')
                .next()
                .unwrap_or("image/png")
                .trim()
                .to_string();
            return Ok(ImageReference::inline(bytes.to_vec(), mime_type));
        }

        Self::parse_json_body(&bytes)
    }

    fn name(&self) -> &str {
        "huggingface"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::CREDITS_EXHAUSTED;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn test_provider(base_url: &str) -> HuggingFaceProvider {
        HuggingFaceProvider::new(
            Client::new(),
            base_url,
            "test/diffusion",
            SecretString::from("hf-token".to_string()),
        )
    }

    #[test]
    fn quality_maps_to_steps_and_guidance() {
        let low = InferenceParameters::for_request(ModelChoice::Standard, QualityLevel::new(0));
        assert_eq!(low.num_inference_steps, 10);
        assert_eq!(low.guidance_scale, 3.0);
        assert_eq!(low.width, 512);

        let mid = InferenceParameters::for_request(ModelChoice::Standard, QualityLevel::new(50));
        assert_eq!(mid.num_inference_steps, 30);
        assert_eq!(mid.guidance_scale, 7.5);

        let high = InferenceParameters::for_request(ModelChoice::Hd, QualityLevel::new(100));
        assert_eq!(high.num_inference_steps, 50);
        assert_eq!(high.guidance_scale, 12.0);
        assert_eq!(high.height, 1024);
    }

    #[tokio::test]
    async fn raw_image_body_becomes_inline_reference() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/test/diffusion"))
            .and(header("authorization", "Bearer hf-token"))
            .and(body_partial_json(serde_json::json!({
                "inputs": "a lighthouse",
                "parameters": { "num_inference_steps": 30, "width": 1024 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(PNG_MAGIC.to_vec(), "image/png"))
            .expect(1)
            .mount(&server)
            .await;

        let request = GenerationRequest::new("  a lighthouse ")
            .with_model(ModelChoice::Hd)
            .with_quality(50);
        let reference = test_provider(&server.uri()).generate(&request).await.unwrap();

        match reference {
            ImageReference::Inline { mime_type, data } => {
                assert_eq!(mime_type, "image/png");
                assert_eq!(&data[..], PNG_MAGIC);
            }
            other => panic!("expected inline image, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn json_url_body_becomes_url_reference() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "url": "https://example.test/hf.png"
            })))
            .mount(&server)
            .await;

        let reference = test_provider(&server.uri())
            .generate(&GenerationRequest::new("a bridge"))
            .await
            .unwrap();
        assert_eq!(reference.as_url(), Some("https://example.test/hf.png"));
    }

    #[tokio::test]
    async fn json_base64_body_is_decoded() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "image": BASE64.encode(PNG_MAGIC)
            })))
            .mount(&server)
            .await;

        let reference = test_provider(&server.uri())
            .generate(&GenerationRequest::new("a bridge"))
            .await
            .unwrap();
        assert!(matches!(reference, ImageReference::Inline { ref data, .. } if &data[..] == PNG_MAGIC));
    }

    #[tokio::test]
    async fn rate_limit_maps_to_quota_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": "Rate limit reached"
            })))
            .mount(&server)
            .await;

        let err = test_provider(&server.uri())
            .generate(&GenerationRequest::new("a bridge"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), CREDITS_EXHAUSTED);
    }

    #[tokio::test]
    async fn model_loading_error_is_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "error": "Model test/diffusion is currently loading",
                "estimated_time": 20.0
            })))
            .mount(&server)
            .await;

        let err = test_provider(&server.uri())
            .generate(&GenerationRequest::new("a bridge"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Model test/diffusion is currently loading");
    }

    #[tokio::test]
    async fn unrecognized_success_body_is_a_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let err = test_provider(&server.uri())
            .generate(&GenerationRequest::new("a bridge"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Provider { .. }));
    }
}
