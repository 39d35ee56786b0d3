pub mod types;
pub mod context;
pub mod prompt;
pub mod gemini;
pub mod parser;
pub mod enrich;
pub mod orchestrator;

pub use types::*;
pub use context::*;
pub use prompt::*;
pub use gemini::*;
pub use parser::*;
pub use enrich::*;
pub use orchestrator::*;

use thiserror::Error;

use crate::models::AssessmentResult;
use crate::pipeline::extraction::ExtractionError;

/// Every way one analysis run can fail. The display text of each variant is
/// the `reason` reported to the caller.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("GEMINI_API_KEY not configured")]
    Configuration,

    #[error("No input provided")]
    NoInput,

    #[error("OCR failed: {0}")]
    Ocr(#[from] ExtractionError),

    #[error("Unified analysis failed: {0}")]
    Upstream(String),

    #[error("Model did not return valid JSON")]
    InvalidJson { raw: String },

    #[error("Model response did not match the expected schema: {detail}")]
    SchemaMismatch { detail: String, raw: String },

    #[error("Unified analysis failed: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Stable class name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::NoInput => "no_input",
            Self::Ocr(_) => "decode",
            Self::Upstream(_) => "upstream_call",
            Self::InvalidJson { .. } | Self::SchemaMismatch { .. } => "schema",
            Self::Internal(_) => "internal",
        }
    }

    /// Convert into the `error` outcome; schema failures keep the model text.
    pub fn into_assessment(self) -> AssessmentResult {
        let reason = self.to_string();
        let raw_response = match self {
            Self::InvalidJson { raw } | Self::SchemaMismatch { raw, .. } => Some(raw),
            _ => None,
        };
        AssessmentResult::Error {
            reason,
            raw_response,
        }
    }
}
