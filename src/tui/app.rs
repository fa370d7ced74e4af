use image::RgbImage;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::config::Config;
use crate::controller::ImageRequestController;
use crate::core::{GeneratedImage, GenerationRequest, ModelChoice, QualityLevel, RequestOutcome};
use crate::download::fetch_bytes;
use crate::{http_client, provider};

/// Largest preview kept in memory, in pixels
const PREVIEW_MAX_SIDE: u32 = 256;

/// Form field with keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Prompt,
    Model,
    Quality,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Prompt => Focus::Model,
            Focus::Model => Focus::Quality,
            Focus::Quality => Focus::Prompt,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Focus::Prompt => Focus::Quality,
            Focus::Model => Focus::Prompt,
            Focus::Quality => Focus::Model,
        }
    }
}

/// Results delivered by background tasks
#[derive(Debug)]
pub enum AppEvent {
    Generated(RequestOutcome),
    PreviewReady { identity: String, image: RgbImage },
    Downloaded(Result<PathBuf, String>),
}

/// TUI application state
pub struct App {
    pub config: Config,

    /// None when the provider could not be set up
    pub controller: Option<Arc<ImageRequestController>>,
    pub setup_error: Option<String>,

    /// Current prompt input
    pub input: String,

    /// Cursor position in input, in chars
    pub cursor_pos: usize,

    pub focus: Focus,
    pub model: ModelChoice,
    pub quality: QualityLevel,

    /// Latest outcome as seen by the UI
    pub outcome: RequestOutcome,

    /// Decoded preview of the current image
    pub preview: Option<RgbImage>,

    pub downloading: bool,

    /// Status message
    pub status_message: Option<String>,

    /// Error message
    pub error_message: Option<String>,

    /// Whether to quit
    pub should_quit: bool,

    /// Frame counter for the spinner
    pub tick: usize,

    events_tx: UnboundedSender<AppEvent>,
    events_rx: UnboundedReceiver<AppEvent>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let (controller, setup_error) = match build_controller(&config) {
            Ok(controller) => (Some(Arc::new(controller)), None),
            Err(e) => (None, Some(e)),
        };

        Self::with_controller(config, controller, setup_error)
    }

    pub fn with_controller(
        config: Config,
        controller: Option<Arc<ImageRequestController>>,
        setup_error: Option<String>,
    ) -> Self {
        let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();

        Self {
            model: config.defaults.model,
            quality: config.defaults.quality,
            config,
            controller,
            setup_error,
            input: String::new(),
            cursor_pos: 0,
            focus: Focus::Prompt,
            outcome: RequestOutcome::Idle,
            preview: None,
            downloading: false,
            status_message: None,
            error_message: None,
            should_quit: false,
            tick: 0,
            events_tx,
            events_rx,
        }
    }

    /// Set status message
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.error_message = None;
    }

    /// Set error message
    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.error_message = Some(msg.into());
        self.status_message = None;
    }

    /// Clear messages
    pub fn clear_messages(&mut self) {
        self.status_message = None;
        self.error_message = None;
    }

    pub fn is_generating(&self) -> bool {
        self.outcome.is_pending()
    }

    pub fn current_image(&self) -> Option<&GeneratedImage> {
        self.outcome.image()
    }

    pub fn request(&self) -> GenerationRequest {
        GenerationRequest::new(self.input.clone())
            .with_model(self.model)
            .with_quality(self.quality)
    }

    /// Start a generation in the background
    pub fn submit(&mut self) {
        let Some(controller) = self.controller.clone() else {
            let msg = self
                .setup_error
                .clone()
                .unwrap_or_else(|| "No provider configured".to_string());
            self.set_error(msg);
            return;
        };

        // The trigger is disabled while a request is in flight
        if self.is_generating() || controller.is_pending() {
            self.set_status("Still generating, please wait");
            return;
        }

        let request = self.request();
        if let Err(e) = request.validate() {
            self.set_error(e.user_message());
            return;
        }

        self.outcome = RequestOutcome::Pending;
        self.preview = None;
        self.set_status(format!("Generating: {}", request.prompt_preview(50)));

        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = controller.submit(request).await;
            let _ = tx.send(AppEvent::Generated(outcome));
        });
    }

    /// Save the current image in the background
    pub fn download(&mut self) {
        let Some(controller) = self.controller.clone() else {
            return;
        };
        if self.current_image().is_none() {
            self.set_error("No image to download");
            return;
        }
        if self.downloading {
            return;
        }

        self.downloading = true;
        self.set_status("Downloading...");

        let output_dir = PathBuf::from(&self.config.output.directory);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = controller
                .download_current(&output_dir)
                .await
                .map_err(|e| e.user_message());
            let _ = tx.send(AppEvent::Downloaded(result));
        });
    }

    fn load_preview(&self, generated: GeneratedImage) {
        let Some(controller) = self.controller.clone() else {
            return;
        };
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let bytes = match fetch_bytes(controller.client(), &generated.reference).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::debug!("Failed to fetch preview: {}", e);
                    return;
                }
            };
            let decoded = tokio::task::spawn_blocking(move || {
                image::load_from_memory(&bytes)
                    .map(|img| img.thumbnail(PREVIEW_MAX_SIDE, PREVIEW_MAX_SIDE).to_rgb8())
            })
            .await;

            match decoded {
                Ok(Ok(rgb)) => {
                    let _ = tx.send(AppEvent::PreviewReady {
                        identity: generated.identity,
                        image: rgb,
                    });
                }
                Ok(Err(e)) => tracing::debug!("Failed to decode preview: {}", e),
                Err(e) => tracing::debug!("Preview task failed: {}", e),
            }
        });
    }

    /// Apply results from background tasks
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Generated(outcome) => {
                tracing::debug!("Generation finished: {}", outcome.status_name());
                self.outcome = outcome;
                match self.outcome.clone() {
                    RequestOutcome::Success(image) => {
                        self.set_status(format!("Image generated successfully! ({})", image.identity));
                        if self.config.output.auto_download {
                            self.download();
                        }
                        self.load_preview(image);
                    }
                    RequestOutcome::Failed(message) => self.set_error(message),
                    RequestOutcome::Idle | RequestOutcome::Pending => {}
                }
            }
            AppEvent::PreviewReady { identity, image } => {
                // Ignore previews for images that were superseded
                if self.current_image().is_some_and(|i| i.identity == identity) {
                    self.preview = Some(image);
                }
            }
            AppEvent::Downloaded(result) => {
                self.downloading = false;
                match result {
                    Ok(path) => self.set_status(format!("Saved to {}", path.display())),
                    Err(message) => self.set_error(message),
                }
            }
        }
    }

    pub fn cycle_model(&mut self) {
        self.model = self.model.next_available();
    }

    pub fn adjust_quality(&mut self, delta: i16) {
        self.quality = if delta >= 0 {
            self.quality.step_up(delta.unsigned_abs().min(u8::MAX as u16) as u8)
        } else {
            self.quality.step_down(delta.unsigned_abs().min(u8::MAX as u16) as u8)
        };
    }

    // Prompt editing works on char positions so multibyte input is safe
    fn byte_index(&self, char_pos: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    pub fn input_len(&self) -> usize {
        self.input.chars().count()
    }

    pub fn insert_char(&mut self, c: char) {
        let idx = self.byte_index(self.cursor_pos);
        self.input.insert(idx, c);
        self.cursor_pos += 1;
    }

    pub fn delete_before_cursor(&mut self) {
        if self.cursor_pos > 0 {
            self.cursor_pos -= 1;
            let idx = self.byte_index(self.cursor_pos);
            self.input.remove(idx);
        }
    }

    pub fn delete_at_cursor(&mut self) {
        if self.cursor_pos < self.input_len() {
            let idx = self.byte_index(self.cursor_pos);
            self.input.remove(idx);
        }
    }
}

fn build_controller(config: &Config) -> Result<ImageRequestController, String> {
    let provider = provider::from_config(config).map_err(|e| e.user_message())?;
    let client = http_client::for_timeout(config.timeout()).map_err(|e| e.to_string())?;
    Ok(ImageRequestController::new(provider, client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ImageReference;

    fn app() -> App {
        App::with_controller(Config::default(), None, Some("API key not configured".into()))
    }

    #[test]
    fn prompt_editing_handles_multibyte_chars() {
        let mut app = app();
        for c in "héllo".chars() {
            app.insert_char(c);
        }
        app.cursor_pos = 2;
        app.delete_before_cursor();
        assert_eq!(app.input, "hllo");
        app.delete_at_cursor();
        assert_eq!(app.input, "hlo");
        assert_eq!(app.cursor_pos, 1);
    }

    #[test]
    fn model_cycle_skips_reserved_tier() {
        let mut app = app();
        assert_eq!(app.model, ModelChoice::Standard);
        app.cycle_model();
        assert_eq!(app.model, ModelChoice::Hd);
        app.cycle_model();
        assert_eq!(app.model, ModelChoice::Standard);
    }

    #[test]
    fn quality_adjustment_is_clamped() {
        let mut app = app();
        app.adjust_quality(80);
        assert_eq!(app.quality.value(), 100);
        app.adjust_quality(-300);
        assert_eq!(app.quality.value(), 0);
    }

    #[test]
    fn submit_without_provider_shows_setup_error() {
        let mut app = app();
        app.input = "a fox".into();
        app.submit();
        assert_eq!(app.error_message.as_deref(), Some("API key not configured"));
        assert_eq!(app.outcome, RequestOutcome::Idle);
    }

    #[test]
    fn failed_generation_is_reported() {
        let mut app = app();
        app.handle_event(AppEvent::Generated(RequestOutcome::Failed("boom".into())));
        assert_eq!(app.error_message.as_deref(), Some("boom"));
        assert_eq!(app.outcome.status_name(), "failed");
    }

    #[test]
    fn stale_preview_is_ignored() {
        let mut app = app();
        app.config.output.auto_download = false;
        let image = GeneratedImage::new(ImageReference::url("https://example.test/a.png"), "mock");
        app.outcome = RequestOutcome::Success(image);

        app.handle_event(AppEvent::PreviewReady {
            identity: "someone-else".into(),
            image: RgbImage::new(1, 1),
        });
        assert!(app.preview.is_none());
    }
}
