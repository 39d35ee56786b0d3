pub mod types;
pub mod preprocess;
pub mod ocr;
pub mod orchestrator;

pub use types::*;
pub use preprocess::*;
pub use ocr::*;
pub use orchestrator::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Image data is empty")]
    EmptyImage,

    #[error("Image data exceeds {0}MB limit")]
    ImageTooLarge(usize),

    #[error("cannot identify image file: {0}")]
    ImageDecode(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Tesseract OCR initialization failed: {0}")]
    OcrInit(String),

    #[error("OCR processing failed: {0}")]
    OcrProcessing(String),

    #[error("OCR support is not available in this build (enable the `ocr` feature)")]
    OcrUnavailable,
}
