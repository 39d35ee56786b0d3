use serde::{Deserialize, Serialize};

use super::enums::{DietQuality, ExerciseLevel, InputMode, RiskLevel, Smoker};

/// Number of canonical fields the model extracts.
pub const CANONICAL_FIELD_COUNT: usize = 4;

/// Unknown fields at or above which a profile cannot be assessed.
pub const INCOMPLETE_THRESHOLD: usize = 3;

/// Reason reported for profiles with too little evidence.
pub const INCOMPLETE_REASON: &str = ">50% fields missing";

/// The four health fields the model must always populate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawExtraction {
    pub age: Option<u32>,
    pub smoker: Smoker,
    pub exercise: ExerciseLevel,
    pub diet: DietQuality,
}

impl Default for RawExtraction {
    fn default() -> Self {
        Self {
            age: None,
            smoker: Smoker::Unknown,
            exercise: ExerciseLevel::Unknown,
            diet: DietQuality::Unknown,
        }
    }
}

impl RawExtraction {
    /// Fields that are null or `unknown`.
    pub fn unknown_count(&self) -> usize {
        [
            self.age.is_none(),
            self.smoker == Smoker::Unknown,
            self.exercise == ExerciseLevel::Unknown,
            self.diet == DietQuality::Unknown,
        ]
        .into_iter()
        .filter(|missing| *missing)
        .count()
    }
}

/// Outcome of one analysis. `status` discriminates the shape on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssessmentResult {
    Ok {
        risk_level: RiskLevel,
        factors: Vec<String>,
        recommendations: Vec<String>,
        /// Absent when the model did not report its extraction.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        raw_extraction: Option<RawExtraction>,
    },
    #[serde(rename = "incomplete_profile")]
    Incomplete {
        reason: String,
        /// Kept for `developer_info` when the model did report its extraction.
        #[serde(skip)]
        raw_extraction: Option<RawExtraction>,
    },
    Error {
        reason: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        raw_response: Option<String>,
    },
}

impl AssessmentResult {
    pub fn incomplete(reason: impl Into<String>) -> Self {
        Self::Incomplete {
            reason: reason.into(),
            raw_extraction: None,
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self::Error {
            reason: reason.into(),
            raw_response: None,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Ok { .. } => "ok",
            Self::Incomplete { .. } => "incomplete_profile",
            Self::Error { .. } => "error",
        }
    }

    pub fn raw_extraction(&self) -> Option<&RawExtraction> {
        match self {
            Self::Ok { raw_extraction, .. } | Self::Incomplete { raw_extraction, .. } => {
                raw_extraction.as_ref()
            }
            Self::Error { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Ok { .. } => None,
            Self::Incomplete { reason, .. } | Self::Error { reason, .. } => Some(reason),
        }
    }
}

/// Provenance metadata attached to every response for auditing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeveloperInfo {
    pub ocr_text: Option<String>,
    pub input_mode: InputMode,
    /// The raw extraction object, or `{}` when the outcome carried none.
    pub extracted_data: serde_json::Value,
}

/// The externally observable response: the assessment plus `developer_info`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedResult {
    #[serde(flatten)]
    pub assessment: AssessmentResult,
    pub developer_info: DeveloperInfo,
}

impl EnrichedResult {
    pub fn status(&self) -> &'static str {
        self.assessment.status()
    }
}
