use super::ExtractionError;

/// Raw OCR result from the engine
#[derive(Debug, Clone)]
pub struct OcrPageResult {
    pub text: String,
    /// Mean engine confidence, 0.0-1.0. Informational only.
    pub confidence: f32,
}

/// Decoded, orientation-corrected image re-encoded for the OCR engine.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// Lossless grayscale PNG.
    pub png_bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// EXIF orientation that was applied (1 = none).
    pub orientation: u32,
}

/// Text recognized on a report image, with the image it was read from.
#[derive(Debug, Clone)]
pub struct ImageText {
    pub text: String,
    pub confidence: f32,
    pub image: PreparedImage,
}

/// OCR engine abstraction (allows mocking for tests)
pub trait OcrEngine {
    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError>;
}
