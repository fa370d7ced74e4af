use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::{GenerationError, PROMPT_REQUIRED};

/// Model tier offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelChoice {
    #[default]
    Standard,
    Hd,
    /// Reserved premium tier, shown but never submitted
    Genius,
}

impl ModelChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelChoice::Standard => "standard",
            ModelChoice::Hd => "hd",
            ModelChoice::Genius => "genius",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ModelChoice::Standard => "Standard",
            ModelChoice::Hd => "HD",
            ModelChoice::Genius => "Genius (Premium)",
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, ModelChoice::Genius)
    }

    pub fn all() -> &'static [ModelChoice] {
        &[ModelChoice::Standard, ModelChoice::Hd, ModelChoice::Genius]
    }

    pub fn variants() -> &'static [&'static str] {
        &["standard", "hd", "genius"]
    }

    /// Next selectable model, skipping reserved ones
    pub fn next_available(&self) -> Self {
        match self {
            ModelChoice::Standard => ModelChoice::Hd,
            ModelChoice::Hd | ModelChoice::Genius => ModelChoice::Standard,
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(ModelChoice::Standard),
            "hd" => Ok(ModelChoice::Hd),
            "genius" => Ok(ModelChoice::Genius),
            other => Err(format!(
                "Invalid model '{}'. Valid values: {}",
                other,
                Self::variants().join(", ")
            )),
        }
    }
}

/// Quality vs speed slider value, 0-100
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct QualityLevel(u8);

impl QualityLevel {
    pub const MAX: u8 = 100;

    pub fn new(value: u8) -> Self {
        Self(value.min(Self::MAX))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Position on the slider as 0.0..=1.0
    pub fn fraction(&self) -> f32 {
        f32::from(self.0) / f32::from(Self::MAX)
    }

    pub fn step_up(self, by: u8) -> Self {
        Self::new(self.0.saturating_add(by))
    }

    pub fn step_down(self, by: u8) -> Self {
        Self::new(self.0.saturating_sub(by))
    }
}

impl Default for QualityLevel {
    fn default() -> Self {
        Self(50)
    }
}

impl From<u8> for QualityLevel {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl From<QualityLevel> for u8 {
    fn from(value: QualityLevel) -> Self {
        value.0
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// A prompt together with the settings chosen for it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default)]
    pub model: ModelChoice,
    #[serde(default)]
    pub quality: QualityLevel,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: ModelChoice) -> Self {
        self.model = model;
        self
    }

    pub fn with_quality(mut self, quality: impl Into<QualityLevel>) -> Self {
        self.quality = quality.into();
        self
    }

    /// Checks everything that can be checked without a network call.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.prompt.trim().is_empty() {
            return Err(GenerationError::Validation(PROMPT_REQUIRED.to_string()));
        }
        if !self.model.is_available() {
            return Err(GenerationError::Validation(format!(
                "The {} model is not available yet",
                self.model.label()
            )));
        }
        Ok(())
    }

    /// Prompt truncated for display
    pub fn prompt_preview(&self, max_len: usize) -> String {
        let prompt = self.prompt.trim();
        if prompt.chars().count() <= max_len {
            prompt.to_string()
        } else {
            let cut: String = prompt.chars().take(max_len.saturating_sub(3)).collect();
            format!("{}...", cut)
        }
    }
}
