use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::{GeneratedImage, GenerationError, GenerationRequest, RequestOutcome};
use crate::download;
use crate::provider::ImageProvider;

pub const INTERRUPTED: &str = "Generation was interrupted";

/// Owns the outcome of the latest generation and the single in-flight request.
///
/// At most one request is in flight at a time: a `submit` made while another
/// is pending is turned away with `Pending` and sends nothing. The state lock
/// is never held across an await point.
pub struct ImageRequestController {
    provider: Arc<dyn ImageProvider>,
    client: Client,
    state: Mutex<RequestOutcome>,
}

/// Resolves a pending state if the submitting future is dropped early
struct PendingGuard<'a> {
    state: &'a Mutex<RequestOutcome>,
    settled: bool,
}

impl PendingGuard<'_> {
    fn settle(mut self, outcome: RequestOutcome) {
        *lock(self.state) = outcome;
        self.settled = true;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!("Generation dropped before the provider answered");
            *lock(self.state) = RequestOutcome::Failed(INTERRUPTED.to_string());
        }
    }
}

fn lock(state: &Mutex<RequestOutcome>) -> MutexGuard<'_, RequestOutcome> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ImageRequestController {
    /// `client` is used to fetch images for download
    pub fn new(provider: Arc<dyn ImageProvider>, client: Client) -> Self {
        Self {
            provider,
            client,
            state: Mutex::new(RequestOutcome::Idle),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Snapshot of the current outcome
    #[cfg(test)]
    pub fn outcome(&self) -> RequestOutcome {
        lock(&self.state).clone()
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.state).is_pending()
    }

    pub fn current_image(&self) -> Option<GeneratedImage> {
        lock(&self.state).image().cloned()
    }

    /// Validate `request`, send it to the provider and record the outcome.
    pub async fn submit(&self, request: GenerationRequest) -> RequestOutcome {
        {
            let mut state = lock(&self.state);
            if state.is_pending() {
                tracing::warn!("Ignoring submit while a generation is in flight");
                return RequestOutcome::Pending;
            }
            if let Err(e) = request.validate() {
                tracing::debug!("Rejected request locally: {}", e);
                *state = RequestOutcome::Failed(e.user_message());
                return state.clone();
            }
            *state = RequestOutcome::Pending;
        }

        let guard = PendingGuard {
            state: &self.state,
            settled: false,
        };

        tracing::info!(
            "Generating with {}: model={}, quality={}, prompt={}",
            self.provider.name(),
            request.model,
            request.quality,
            request.prompt_preview(40)
        );

        let outcome = match self.provider.generate(&request).await {
            Ok(reference) => {
                let image = GeneratedImage::new(reference, self.provider.name());
                tracing::info!("Generated image {}", image.identity);
                RequestOutcome::Success(image)
            }
            Err(e) => {
                tracing::warn!("Generation failed: {}", e);
                RequestOutcome::Failed(e.user_message())
            }
        };

        guard.settle(outcome.clone());
        outcome
    }

    /// Save `image` into `output_dir`. The recorded outcome is left untouched.
    pub async fn download(&self, image: &GeneratedImage, output_dir: &Path) -> Result<PathBuf, GenerationError> {
        download::save(&self.client, image, output_dir)
            .await
            .inspect_err(|e| tracing::warn!("Download of {} failed: {}", image.identity, e))
    }

    /// Save the image from the latest successful generation
    pub async fn download_current(&self, output_dir: &Path) -> Result<PathBuf, GenerationError> {
        let image = self
            .current_image()
            .ok_or_else(|| GenerationError::Validation("No image to download".to_string()))?;
        self.download(&image, output_dir).await
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}
