use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Where the bytes of a generated image can be found
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ImageReference {
    /// Hosted by the provider
    Url { url: String },
    /// Returned directly in the response body
    Inline {
        mime_type: String,
        #[serde(skip)]
        data: Arc<[u8]>,
    },
}

impl ImageReference {
    pub fn url(url: impl Into<String>) -> Self {
        ImageReference::Url { url: url.into() }
    }

    pub fn inline(data: impl Into<Arc<[u8]>>, mime_type: impl Into<String>) -> Self {
        ImageReference::Inline {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    #[cfg(test)]
    pub fn as_url(&self) -> Option<&str> {
        match self {
            ImageReference::Url { url } => Some(url),
            ImageReference::Inline { .. } => None,
        }
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageReference::Url { url } => f.write_str(url),
            ImageReference::Inline { mime_type, data } => {
                write!(f, "<{} bytes of {}>", data.len(), mime_type)
            }
        }
    }
}

/// A successfully generated image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedImage {
    pub reference: ImageReference,
    /// Unique per generation, used for the download filename
    pub identity: String,
    pub provider: String,
    pub created_at: DateTime<Utc>,
}

impl GeneratedImage {
    pub fn new(reference: ImageReference, provider: impl Into<String>) -> Self {
        let now = Utc::now();
        let uuid = Uuid::new_v4().simple().to_string();
        Self {
            reference,
            identity: format!("{}-{}", now.timestamp_millis(), &uuid[..8]),
            provider: provider.into(),
            created_at: now,
        }
    }

    pub fn file_name(&self) -> String {
        format!("generated-image-{}.png", self.identity)
    }
}

/// State of the most recent generation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum RequestOutcome {
    #[default]
    Idle,
    Pending,
    Success(GeneratedImage),
    Failed(String),
}

impl RequestOutcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestOutcome::Pending)
    }

    pub fn image(&self) -> Option<&GeneratedImage> {
        match self {
            RequestOutcome::Success(image) => Some(image),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn error(&self) -> Option<&str> {
        match self {
            RequestOutcome::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn status_name(&self) -> &'static str {
        match self {
            RequestOutcome::Idle => "idle",
            RequestOutcome::Pending => "pending",
            RequestOutcome::Success(_) => "success",
            RequestOutcome::Failed(_) => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identities_are_unique() {
        let a = GeneratedImage::new(ImageReference::url("https://example.test/a.png"), "mock");
        let b = GeneratedImage::new(ImageReference::url("https://example.test/a.png"), "mock");
        assert!(!a.identity.is_empty());
        assert_ne!(a.identity, b.identity);
        assert_eq!(a.file_name(), format!("generated-image-{}.png", a.identity));
    }

    #[test]
    fn inline_bytes_are_not_serialized() {
        let reference = ImageReference::inline(vec![1u8, 2, 3], "image/png");
        let json = serde_json::to_value(&reference).unwrap();
        assert_eq!(json, serde_json::json!({"type": "inline", "mime_type": "image/png"}));
        assert_eq!(reference.to_string(), "<3 bytes of image/png>");
    }

    #[test]
    fn failed_outcome_serializes_with_detail() {
        let json = serde_json::to_value(RequestOutcome::Failed("nope".into())).unwrap();
        assert_eq!(json, serde_json::json!({"status": "failed", "detail": "nope"}));
    }
}
