use super::types::ExtractionContext;
use super::AnalysisError;
use crate::models::{InputMode, ManualRecord};

/// Header placed above OCR text so the model treats it as a scan transcript.
pub const OCR_CONTEXT_HEADER: &str = "RAW OCR TEXT FROM MEDICAL REPORT:";

/// Header placed above questionnaire data.
pub const MANUAL_CONTEXT_HEADER: &str = "MANUAL USER DATA:";

/// What the context is built from. Exactly one source per request.
#[derive(Debug, Clone, Copy)]
pub enum ContextSource<'a> {
    Ocr(&'a str),
    Manual(&'a ManualRecord),
}

/// Normalize OCR text or a questionnaire into the single context block the
/// prompt embeds.
///
/// OCR text is embedded verbatim. The questionnaire is embedded as pretty JSON
/// with every field present, nulls included. An empty questionnaire is
/// `NoInput` so the model is never called for it.
pub fn build_context(source: ContextSource<'_>) -> Result<ExtractionContext, AnalysisError> {
    match source {
        ContextSource::Ocr(text) => Ok(ExtractionContext {
            mode: InputMode::Image,
            text: format!("{OCR_CONTEXT_HEADER}\n{text}"),
        }),
        ContextSource::Manual(record) => {
            if record.is_empty() {
                return Err(AnalysisError::NoInput);
            }
            let fields = serde_json::to_string_pretty(record).map_err(|e| {
                AnalysisError::Internal(format!("cannot serialize manual data: {e}"))
            })?;
            Ok(ExtractionContext {
                mode: InputMode::Manual,
                text: format!("{MANUAL_CONTEXT_HEADER}\n{fields}"),
            })
        }
    }
}
