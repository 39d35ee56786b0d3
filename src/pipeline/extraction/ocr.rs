use std::path::Path;
#[cfg(feature = "ocr")]
use std::path::PathBuf;

use super::types::{OcrEngine, OcrPageResult};
use super::ExtractionError;

/// Language pack used for report OCR.
pub const OCR_LANGUAGE: &str = "eng";

/// Tesseract OCR engine.
/// Only available when compiled with the `ocr` feature flag.
#[cfg(feature = "ocr")]
pub struct TesseractEngine {
    tessdata_dir: Option<PathBuf>,
    language: String,
}

#[cfg(feature = "ocr")]
impl TesseractEngine {
    /// Use the system tessdata location, or `tessdata_dir` when given.
    pub fn new(tessdata_dir: Option<&Path>) -> Result<Self, ExtractionError> {
        if let Some(dir) = tessdata_dir {
            let traineddata = dir.join(format!("{OCR_LANGUAGE}.traineddata"));
            if !traineddata.exists() {
                return Err(ExtractionError::OcrInit(format!(
                    "{} not found",
                    traineddata.display()
                )));
            }
        }

        Ok(Self {
            tessdata_dir: tessdata_dir.map(Path::to_path_buf),
            language: OCR_LANGUAGE.to_string(),
        })
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for TesseractEngine {
    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        let datapath = match self.tessdata_dir.as_deref() {
            Some(dir) => Some(
                dir.to_str()
                    .ok_or_else(|| ExtractionError::OcrInit("Invalid tessdata path".into()))?,
            ),
            None => None,
        };

        let mut tess = tesseract::Tesseract::new(datapath, Some(&self.language))
            .map_err(|e| ExtractionError::OcrInit(e.to_string()))?;

        // Fully automatic page segmentation: reports mix tables, headers and handwriting.
        tess.set_page_seg_mode(tesseract::PageSegMode::PsmAuto);

        let mut tess = tess
            .set_image_from_mem(image_bytes)
            .map_err(|e| ExtractionError::OcrProcessing(e.to_string()))?;

        let text = tess
            .get_text()
            .map_err(|e| ExtractionError::OcrProcessing(e.to_string()))?;

        let confidence = tess.mean_text_conf().max(0) as f32 / 100.0;

        Ok(OcrPageResult { text, confidence })
    }
}

/// Stand-in used when the crate is built without the `ocr` feature.
/// Every image request fails with an OCR error instead of reaching the model.
pub struct UnavailableOcrEngine;

impl OcrEngine for UnavailableOcrEngine {
    fn ocr_image(&self, _image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        Err(ExtractionError::OcrUnavailable)
    }
}

/// The OCR engine this build supports.
pub fn default_ocr_engine(
    tessdata_dir: Option<&Path>,
) -> Result<Box<dyn OcrEngine + Send + Sync>, ExtractionError> {
    #[cfg(feature = "ocr")]
    {
        Ok(Box::new(TesseractEngine::new(tessdata_dir)?))
    }

    #[cfg(not(feature = "ocr"))]
    {
        if let Some(dir) = tessdata_dir {
            tracing::warn!(
                tessdata_dir = %dir.display(),
                "tessdata configured but OCR support is not compiled in"
            );
        }
        Ok(Box::new(UnavailableOcrEngine))
    }
}

/// Mock OCR engine for unit testing without Tesseract.
pub struct MockOcrEngine {
    pub text: String,
    pub confidence: f32,
}

impl MockOcrEngine {
    pub fn new(text: &str, confidence: f32) -> Self {
        Self {
            text: text.to_string(),
            confidence,
        }
    }
}

impl OcrEngine for MockOcrEngine {
    fn ocr_image(&self, _image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        Ok(OcrPageResult {
            text: self.text.clone(),
            confidence: self.confidence,
        })
    }
}
