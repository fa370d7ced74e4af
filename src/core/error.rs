use reqwest::StatusCode;
use thiserror::Error;

pub const PROMPT_REQUIRED: &str = "Please enter a prompt";
pub const CREDITS_EXHAUSTED: &str = "API credits exhausted. Please try again later.";
pub const GENERIC_FAILURE: &str = "Failed to generate image. Please try again.";
pub const DOWNLOAD_FAILED: &str = "Failed to download image";

#[derive(Error, Debug)]
pub enum GenerationError {
    /// Rejected locally, no request was sent
    #[error("{0}")]
    Validation(String),

    #[error("Provider rejected the credential or quota (HTTP {status})")]
    AuthOrQuota { status: u16 },

    #[error("Provider error: {}", message.as_deref().unwrap_or(GENERIC_FAILURE))]
    Provider {
        status: Option<u16>,
        message: Option<String>,
    },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("API key not configured. Set IMAGINE_API_KEY environment variable or run: imagine config set api.key <your-key>")]
    MissingApiKey,

    #[error("Config error: {0}")]
    Config(String),
}

impl GenerationError {
    /// Map a non-success HTTP status to the matching error kind.
    pub fn from_status(status: StatusCode, detail: Option<String>) -> Self {
        if is_auth_or_quota(status) {
            GenerationError::AuthOrQuota {
                status: status.as_u16(),
            }
        } else {
            GenerationError::Provider {
                status: Some(status.as_u16()),
                message: detail.filter(|m| !m.trim().is_empty()),
            }
        }
    }

    /// A success response that carried no usable image.
    pub fn no_image() -> Self {
        GenerationError::Provider {
            status: None,
            message: Some("No image was generated".to_string()),
        }
    }

    /// The message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::Validation(message) => message.clone(),
            GenerationError::AuthOrQuota { .. } => CREDITS_EXHAUSTED.to_string(),
            GenerationError::Provider {
                message: Some(message),
                ..
            } => message.clone(),
            GenerationError::Provider { message: None, .. } | GenerationError::Transport(_) => {
                GENERIC_FAILURE.to_string()
            }
            GenerationError::Download(_) => DOWNLOAD_FAILED.to_string(),
            GenerationError::MissingApiKey | GenerationError::Config(_) => self.to_string(),
        }
    }
}

/// Statuses a provider uses to refuse a credential or an exhausted quota.
pub fn is_auth_or_quota(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::UNAUTHORIZED
            | StatusCode::PAYMENT_REQUIRED
            | StatusCode::FORBIDDEN
            | StatusCode::TOO_MANY_REQUESTS
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_to_capacity_message() {
        let err = GenerationError::from_status(StatusCode::UNAUTHORIZED, Some("bad key".into()));
        assert!(matches!(err, GenerationError::AuthOrQuota { status: 401 }));
        assert_eq!(err.user_message(), CREDITS_EXHAUSTED);
        assert_ne!(err.user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn provider_detail_is_surfaced() {
        let err = GenerationError::from_status(
            StatusCode::BAD_REQUEST,
            Some("prompt too long".into()),
        );
        assert_eq!(err.user_message(), "prompt too long");
    }

    #[test]
    fn blank_detail_falls_back_to_generic() {
        let err = GenerationError::from_status(StatusCode::INTERNAL_SERVER_ERROR, Some("  ".into()));
        assert_eq!(err.user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn download_errors_use_generic_message() {
        let err = GenerationError::Download("connection reset".into());
        assert_eq!(err.user_message(), DOWNLOAD_FAILED);
    }
}
