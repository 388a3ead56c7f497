pub mod groq;
pub mod types;

use crate::{credential::Credential, error::ExtractError};

pub use groq::GroqService;
pub use types::{ChatRequest, ChatResponse};

/// The external multimodal model. One call per image, no retries.
pub trait ExtractionService {
    /// Sends the prompt plus the base64 image and returns the model's raw text.
    fn complete(
        &self,
        image_base64: &str,
        prompt: &str,
        credential: &Credential,
    ) -> Result<String, ExtractError>;
}

impl<S: ExtractionService + ?Sized> ExtractionService for &S {
    fn complete(
        &self,
        image_base64: &str,
        prompt: &str,
        credential: &Credential,
    ) -> Result<String, ExtractError> {
        (**self).complete(image_base64, prompt, credential)
    }
}
