mod deepai;
mod huggingface;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use deepai::DeepAiProvider;
pub use huggingface::HuggingFaceProvider;

use crate::config::Config;
use crate::core::{GenerationError, GenerationRequest, ImageReference};
use crate::http_client;

/// A third-party service that turns a prompt into an image
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Send exactly one generation request. Implementations never retry.
    async fn generate(&self, request: &GenerationRequest) -> Result<ImageReference, GenerationError>;

    /// Get the provider name
    fn name(&self) -> &str;
}

/// Provider selected in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProviderKind {
    #[default]
    #[serde(rename = "deepai")]
    DeepAi,
    #[serde(rename = "huggingface")]
    HuggingFace,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::DeepAi => "deepai",
            ProviderKind::HuggingFace => "huggingface",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::DeepAi => "https://api.deepai.org",
            ProviderKind::HuggingFace => "https://api-inference.huggingface.co",
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &["deepai", "huggingface"]
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deepai" => Ok(ProviderKind::DeepAi),
            "huggingface" | "hf" => Ok(ProviderKind::HuggingFace),
            other => Err(format!(
                "Unknown provider '{}'. Valid values: {}",
                other,
                Self::variants().join(", ")
            )),
        }
    }
}

/// Build the provider named in `config`
pub fn from_config(config: &Config) -> Result<Arc<dyn ImageProvider>, GenerationError> {
    let api_key = config
        .api_key()
        .ok_or(GenerationError::MissingApiKey)?
        .to_string();

    let client = http_client::for_timeout(config.timeout())
        .map_err(|e| GenerationError::Config(format!("Failed to create HTTP client: {}", e)))?;
    let base_url = config.base_url();

    tracing::debug!(
        "Using provider {} at {} (timeout {}s)",
        config.api.provider,
        base_url,
        config.api.timeout_secs
    );

    let provider: Arc<dyn ImageProvider> = match config.api.provider {
        ProviderKind::DeepAi => Arc::new(DeepAiProvider::new(client, base_url, api_key.into())),
        ProviderKind::HuggingFace => Arc::new(HuggingFaceProvider::new(
            client,
            base_url,
            config.api.hf_model.clone(),
            api_key.into(),
        )),
    };

    Ok(provider)
}

/// Pull a human-readable message out of a provider error body
fn error_detail(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        err: Option<String>,
        error: Option<serde_json::Value>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let nested = parsed.error.and_then(|value| match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Object(map) => map
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string),
        _ => None,
    });

    parsed
        .message
        .or(parsed.err)
        .or(nested)
        .filter(|m| !m.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_detail_reads_known_shapes() {
        assert_eq!(error_detail(r#"{"message":"bad prompt"}"#).as_deref(), Some("bad prompt"));
        assert_eq!(error_detail(r#"{"err":"quota"}"#).as_deref(), Some("quota"));
        assert_eq!(error_detail(r#"{"error":"loading"}"#).as_deref(), Some("loading"));
        assert_eq!(
            error_detail(r#"{"error":{"message":"nested"}}"#).as_deref(),
            Some("nested")
        );
        assert_eq!(error_detail("<html>502</html>"), None);
        assert_eq!(error_detail(r#"{"message":""}"#), None);
    }

    #[test]
    fn missing_key_is_reported_before_any_call() {
        let config = Config::default();
        assert!(matches!(from_config(&config), Err(GenerationError::MissingApiKey)));
    }

    #[test]
    fn factory_selects_configured_vendor() {
        let mut config = Config::default();
        config.api.key = Some("k".into());
        assert_eq!(from_config(&config).unwrap().name(), "deepai");

        config.api.provider = ProviderKind::HuggingFace;
        assert_eq!(from_config(&config).unwrap().name(), "huggingface");
    }

    #[test]
    fn provider_kind_round_trips_through_toml_names() {
        assert_eq!("hf".parse::<ProviderKind>().unwrap(), ProviderKind::HuggingFace);
        assert_eq!(ProviderKind::DeepAi.to_string(), "deepai");
    }
}
