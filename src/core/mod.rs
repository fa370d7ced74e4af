pub mod error;
pub mod outcome;
pub mod request;

pub use error::GenerationError;
pub use outcome::{GeneratedImage, ImageReference, RequestOutcome};
pub use request::{GenerationRequest, ModelChoice, QualityLevel};
