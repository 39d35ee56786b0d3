use std::panic::{self, AssertUnwindSafe};

use super::preprocess::prepare_image;
use super::types::{ImageText, OcrEngine};
use super::ExtractionError;

/// Image → text stage of the analysis pipeline: prepare → OCR.
///
/// No confidence threshold is applied; whatever the engine recognized,
/// garbled tokens included, is handed on as-is.
pub struct ImageTextExtractor {
    engine: Box<dyn OcrEngine + Send + Sync>,
}

impl ImageTextExtractor {
    pub fn new(engine: Box<dyn OcrEngine + Send + Sync>) -> Self {
        Self { engine }
    }

    /// Recognize the text on an uploaded report image.
    ///
    /// Decoder or OCR panics are contained and reported as `OcrProcessing`.
    pub fn extract_text(&self, image_bytes: &[u8]) -> Result<ImageText, ExtractionError> {
        panic::catch_unwind(AssertUnwindSafe(|| self.run(image_bytes))).unwrap_or_else(
            |payload| {
                let detail = panic_detail(payload.as_ref());
                tracing::error!(detail = %detail, "OCR stage panicked");
                Err(ExtractionError::OcrProcessing(detail))
            },
        )
    }

    fn run(&self, image_bytes: &[u8]) -> Result<ImageText, ExtractionError> {
        let image = prepare_image(image_bytes)?;
        let page = self.engine.ocr_image(&image.png_bytes)?;

        tracing::info!(
            chars = page.text.chars().count(),
            confidence = page.confidence,
            "OCR complete"
        );

        Ok(ImageText {
            text: page.text,
            confidence: page.confidence,
            image,
        })
    }
}

fn panic_detail(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "OCR engine panicked".to_string()
    }
}
