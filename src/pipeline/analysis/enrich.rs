use serde_json::Value;

use crate::models::{AssessmentResult, DeveloperInfo, EnrichedResult, InputMode};

/// Attach `developer_info` to an assessment. OCR text only exists for the
/// image path; the manual path always reports `null`.
pub fn enrich(
    assessment: AssessmentResult,
    mode: InputMode,
    ocr_text: Option<String>,
) -> EnrichedResult {
    let ocr_text = match mode {
        InputMode::Image => ocr_text,
        InputMode::Manual => None,
    };

    let extracted_data = assessment
        .raw_extraction()
        .and_then(|extraction| serde_json::to_value(extraction).ok())
        .unwrap_or_else(|| Value::Object(Default::default()));

    EnrichedResult {
        assessment,
        developer_info: DeveloperInfo {
            ocr_text,
            input_mode: mode,
            extracted_data,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DietQuality, ExerciseLevel, RawExtraction, RiskLevel, Smoker};
    use serde_json::json;

    fn ok_assessment() -> AssessmentResult {
        AssessmentResult::Ok {
            risk_level: RiskLevel::High,
            factors: vec!["Smoking".into(), "Sedentary lifestyle".into(), "Age".into()],
            recommendations: vec![
                "Quit smoking now".into(),
                "Walk daily after meals".into(),
                "Schedule annual checkups".into(),
            ],
            raw_extraction: Some(RawExtraction {
                age: Some(64),
                smoker: Smoker::Yes,
                exercise: ExerciseLevel::Sedentary,
                diet: DietQuality::Average,
            }),
        }
    }

    #[test]
    fn image_path_keeps_ocr_text() {
        let enriched = enrich(ok_assessment(), InputMode::Image, Some("Age: 64".into()));
        assert_eq!(enriched.developer_info.ocr_text.as_deref(), Some("Age: 64"));
        assert_eq!(enriched.developer_info.input_mode, InputMode::Image);
        assert_eq!(
            enriched.developer_info.extracted_data,
            json!({"age": 64, "smoker": "yes", "exercise": "sedentary", "diet": "average"})
        );
    }

    #[test]
    fn manual_path_drops_ocr_text() {
        let enriched = enrich(ok_assessment(), InputMode::Manual, Some("stray".into()));
        assert_eq!(enriched.developer_info.ocr_text, None);
    }

    #[test]
    fn error_outcome_has_empty_extracted_data() {
        let enriched = enrich(
            AssessmentResult::error("No input provided"),
            InputMode::Manual,
            None,
        );
        assert_eq!(enriched.developer_info.extracted_data, json!({}));

        let wire = serde_json::to_value(&enriched).unwrap();
        assert_eq!(wire["status"], "error");
        assert_eq!(wire["reason"], "No input provided");
        assert_eq!(wire["developer_info"]["input_mode"], "manual");
        assert!(wire["developer_info"]["ocr_text"].is_null());
    }

    #[test]
    fn ok_without_reported_extraction_has_empty_extracted_data() {
        let assessment = AssessmentResult::Ok {
            risk_level: RiskLevel::Moderate,
            factors: vec!["Smoking".into()],
            recommendations: vec!["Quit smoking now".into()],
            raw_extraction: None,
        };
        let enriched = enrich(assessment, InputMode::Manual, None);
        assert_eq!(enriched.status(), "ok");
        assert_eq!(enriched.developer_info.extracted_data, json!({}));
    }

    #[test]
    fn ok_outcome_flattens_on_the_wire() {
        let enriched = enrich(ok_assessment(), InputMode::Image, Some("t".into()));
        let wire = serde_json::to_value(enriched).unwrap();
        assert_eq!(wire["status"], "ok");
        assert_eq!(wire["risk_level"], "high");
        assert_eq!(wire["developer_info"]["input_mode"], "image/ocr");
    }
}
