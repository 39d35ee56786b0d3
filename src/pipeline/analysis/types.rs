use std::sync::Arc;

use super::AnalysisError;
use crate::models::InputMode;

/// Normalized text handed to the prompt composer, tagged with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionContext {
    pub mode: InputMode,
    pub text: String,
}

/// Image bytes sent alongside the prompt for multimodal models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl InlineImage {
    pub fn png(data: Vec<u8>) -> Self {
        Self {
            mime_type: "image/png".to_string(),
            data,
        }
    }
}

/// One call to the text generation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub image: Option<InlineImage>,
}

impl GenerationRequest {
    pub fn new(prompt: String) -> Self {
        Self {
            prompt,
            image: None,
        }
    }

    pub fn with_image(mut self, image: Option<InlineImage>) -> Self {
        self.image = image;
        self
    }
}

/// Generative model client abstraction (allows mocking)
///
/// Returns the model's raw text, or `AnalysisError::Upstream` when the call
/// itself failed. No guarantee is made about what the text contains.
pub trait LlmClient {
    fn generate(&self, request: &GenerationRequest) -> Result<String, AnalysisError>;

    fn model_name(&self) -> &str;
}

impl<T: LlmClient + ?Sized> LlmClient for Arc<T> {
    fn generate(&self, request: &GenerationRequest) -> Result<String, AnalysisError> {
        (**self).generate(request)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}
