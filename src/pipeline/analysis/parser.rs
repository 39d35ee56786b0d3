//! Model response → `AssessmentResult`.
//!
//! Two fixed stages: strip the markdown fences models add despite being told
//! not to, then parse strictly. Text that is not JSON is never salvaged.
//! Once parsed, the object is read into the closed schema: out-of-vocabulary
//! values are repaired to `unknown` rather than rejected, casing is
//! normalized and keys outside the schema are dropped. Only an unusable
//! overall shape is a schema error.

use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use super::AnalysisError;
use crate::models::{
    AssessmentResult, DietQuality, ExerciseLevel, RawExtraction, RiskLevel, Smoker,
    INCOMPLETE_REASON, INCOMPLETE_THRESHOLD,
};

/// Ages above this are treated as misreads.
const MAX_PLAUSIBLE_AGE: u32 = 130;

/// Expected number of factors / recommendations.
const EXPECTED_ITEMS: std::ops::RangeInclusive<usize> = 3..=4;

/// A model response read into the closed schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub assessment: AssessmentResult,
    /// Canonical fields the model itself left out, null or `"unknown"`.
    /// Values repaired to `unknown` are not counted. `None` when the model
    /// reported no extraction at all.
    pub reported_missing: Option<usize>,
}

/// Remove every markdown code-fence marker and surrounding whitespace.
pub fn strip_code_fences(response: &str) -> String {
    response
        .trim()
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Normalize, then parse as JSON. Fails with `InvalidJson` carrying the
/// response verbatim.
pub fn parse_json_payload(response: &str) -> Result<Value, AnalysisError> {
    let cleaned = strip_code_fences(response);
    serde_json::from_str(&cleaned).map_err(|e| {
        tracing::warn!(
            response_len = response.len(),
            error = %e,
            "Model response is not valid JSON"
        );
        AnalysisError::InvalidJson {
            raw: response.to_string(),
        }
    })
}

/// Parse the model's raw text into one of the assessment shapes.
pub fn parse_model_response(response: &str) -> Result<ParsedResponse, AnalysisError> {
    let payload = parse_json_payload(response)?;
    let mut repairs = Vec::new();

    let parsed = interpret_payload(payload, &mut repairs).map_err(|detail| {
        AnalysisError::SchemaMismatch {
            detail,
            raw: response.to_string(),
        }
    })?;

    if !repairs.is_empty() {
        tracing::warn!(
            repair_count = repairs.len(),
            repairs = ?repairs,
            "Model response repaired"
        );
    }

    Ok(parsed)
}

/// Downgrade an `ok` result whose reported extraction is too sparse to
/// assess. Results without a reported extraction are left alone.
pub fn enforce_completeness(parsed: ParsedResponse) -> AssessmentResult {
    match parsed {
        ParsedResponse {
            assessment: AssessmentResult::Ok { raw_extraction, .. },
            reported_missing: Some(missing),
        } if missing >= INCOMPLETE_THRESHOLD => {
            tracing::warn!(
                missing_fields = missing,
                unknown_fields = raw_extraction.as_ref().map_or(0, RawExtraction::unknown_count),
                "Model assessed an incomplete profile; downgrading to incomplete_profile"
            );
            AssessmentResult::Incomplete {
                reason: INCOMPLETE_REASON.to_string(),
                raw_extraction,
            }
        }
        other => other.assessment,
    }
}

#[derive(Deserialize)]
struct ModelPayload {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    risk_level: Option<Value>,
    #[serde(default)]
    factors: Option<Value>,
    #[serde(default)]
    recommendations: Option<Value>,
    #[serde(default)]
    raw_extraction: Option<Value>,
}

/// One canonical field after repair.
struct Reading<T> {
    value: T,
    /// The model itself gave no value (absent, null or `"unknown"`).
    stated_missing: bool,
}

impl<T> Reading<T> {
    fn stated(value: T) -> Self {
        Self {
            value,
            stated_missing: false,
        }
    }

    fn missing(value: T) -> Self {
        Self {
            value,
            stated_missing: true,
        }
    }
}

fn interpret_payload(payload: Value, repairs: &mut Vec<String>) -> Result<ParsedResponse, String> {
    if !payload.is_object() {
        return Err(format!("expected a JSON object, got {}", json_type(&payload)));
    }
    let payload: ModelPayload = serde_json::from_value(payload).map_err(|e| e.to_string())?;

    let status = payload
        .status
        .as_deref()
        .map(|s| s.trim().to_ascii_lowercase());

    match status.as_deref() {
        Some("incomplete_profile") => {
            let reason = payload
                .reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| INCOMPLETE_REASON.to_string());
            let (raw_extraction, reported_missing) =
                split_extraction(repair_extraction(payload.raw_extraction.as_ref(), repairs));
            Ok(ParsedResponse {
                assessment: AssessmentResult::Incomplete {
                    reason,
                    raw_extraction,
                },
                reported_missing,
            })
        }
        Some("ok") => interpret_ok(payload, repairs),
        None if payload.risk_level.is_some() => {
            repairs.push("missing status inferred as ok".into());
            interpret_ok(payload, repairs)
        }
        None => Err("missing status".into()),
        Some(other) => Err(format!("unexpected status {other:?}")),
    }
}

fn interpret_ok(
    payload: ModelPayload,
    repairs: &mut Vec<String>,
) -> Result<ParsedResponse, String> {
    let risk_level = payload
        .risk_level
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| RiskLevel::from_str(&s.trim().to_ascii_lowercase()).ok())
        .ok_or_else(|| {
            let got = payload
                .risk_level
                .as_ref()
                .map_or_else(|| "nothing".to_string(), Value::to_string);
            format!("risk_level must be one of low, moderate, high (got {got})")
        })?;

    let factors = repair_phrases("factors", payload.factors.as_ref(), repairs);
    let recommendations =
        repair_phrases("recommendations", payload.recommendations.as_ref(), repairs);

    let extraction = repair_extraction(payload.raw_extraction.as_ref(), repairs);
    if extraction.is_none() {
        repairs.push("raw_extraction not reported".into());
    }
    let (raw_extraction, reported_missing) = split_extraction(extraction);

    Ok(ParsedResponse {
        assessment: AssessmentResult::Ok {
            risk_level,
            factors,
            recommendations,
            raw_extraction,
        },
        reported_missing,
    })
}

fn split_extraction(
    extraction: Option<(RawExtraction, usize)>,
) -> (Option<RawExtraction>, Option<usize>) {
    match extraction {
        Some((extraction, missing)) => (Some(extraction), Some(missing)),
        None => (None, None),
    }
}

/// Coerce a list of short phrases. A bare string becomes a one-item list,
/// non-string and blank items are dropped.
fn repair_phrases(field: &str, value: Option<&Value>, repairs: &mut Vec<String>) -> Vec<String> {
    let phrases: Vec<String> = match value {
        Some(Value::Array(items)) => {
            let phrases: Vec<String> = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if phrases.len() != items.len() {
                let dropped = items.len() - phrases.len();
                repairs.push(format!("{field}: dropped {dropped} unusable items"));
            }
            phrases
        }
        Some(Value::String(s)) if !s.trim().is_empty() => {
            repairs.push(format!("{field}: single string wrapped in a list"));
            vec![s.trim().to_string()]
        }
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            repairs.push(format!("{field}: ignored {}", json_type(other)));
            Vec::new()
        }
    };

    if !EXPECTED_ITEMS.contains(&phrases.len()) {
        repairs.push(format!("{field}: {} items (expected 3-4)", phrases.len()));
    }
    phrases
}

/// Read the reported extraction, with the number of fields the model itself
/// left empty. `None` when no extraction object was reported.
fn repair_extraction(
    value: Option<&Value>,
    repairs: &mut Vec<String>,
) -> Option<(RawExtraction, usize)> {
    let fields = match value {
        Some(Value::Object(fields)) => fields,
        None | Some(Value::Null) => return None,
        Some(other) => {
            repairs.push(format!("raw_extraction: ignored {}", json_type(other)));
            return None;
        }
    };

    let age = repair_age(fields.get("age"), repairs);
    let smoker = repair_smoker(fields.get("smoker"), repairs);
    let exercise = repair_vocabulary(
        "exercise",
        fields.get("exercise"),
        ExerciseLevel::Unknown,
        repairs,
    );
    let diet = repair_vocabulary("diet", fields.get("diet"), DietQuality::Unknown, repairs);

    let missing = [
        age.stated_missing,
        smoker.stated_missing,
        exercise.stated_missing,
        diet.stated_missing,
    ]
    .into_iter()
    .filter(|m| *m)
    .count();

    let extraction = RawExtraction {
        age: age.value,
        smoker: smoker.value,
        exercise: exercise.value,
        diet: diet.value,
    };
    Some((extraction, missing))
}

fn repair_age(value: Option<&Value>, repairs: &mut Vec<String>) -> Reading<Option<u32>> {
    let age = match value {
        None | Some(Value::Null) => return Reading::missing(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Some(Value::String(s)) => {
            let text = s.trim();
            if is_stated_unknown(text) {
                return Reading::missing(None);
            }
            let parsed = parse_leading_number(text);
            if parsed.is_some() {
                repairs.push("age: number read from text".into());
            }
            parsed
        }
        Some(_) => None,
    };

    match age {
        Some(a) if a <= u64::from(MAX_PLAUSIBLE_AGE) => Reading::stated(Some(a as u32)),
        Some(a) => {
            repairs.push(format!("age: implausible value {a} set to null"));
            Reading::stated(None)
        }
        None => {
            repairs.push("age: unusable value set to null".into());
            Reading::stated(None)
        }
    }
}

/// `"61"`, `"61.0"` and `"61 years"` all read as 61.
fn parse_leading_number(text: &str) -> Option<u64> {
    if let Some(whole) = text.parse::<u64>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|f| *f >= 0.0)
            .map(|f| f.round() as u64)
    }) {
        return Some(whole);
    }
    let digits: String = text.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn repair_smoker(value: Option<&Value>, repairs: &mut Vec<String>) -> Reading<Smoker> {
    match value {
        Some(Value::Bool(smokes)) => {
            repairs.push("smoker: boolean converted".into());
            Reading::stated(if *smokes { Smoker::Yes } else { Smoker::No })
        }
        other => repair_vocabulary("smoker", other, Smoker::Unknown, repairs),
    }
}

fn repair_vocabulary<T: FromStr>(
    field: &str,
    value: Option<&Value>,
    unknown: T,
    repairs: &mut Vec<String>,
) -> Reading<T> {
    match value {
        None | Some(Value::Null) => Reading::missing(unknown),
        Some(Value::String(s)) if is_stated_unknown(s.trim()) => Reading::missing(unknown),
        Some(Value::String(s)) => match T::from_str(&s.trim().to_ascii_lowercase()) {
            Ok(parsed) => Reading::stated(parsed),
            Err(_) => {
                repairs.push(format!("{field}: value outside vocabulary set to unknown"));
                Reading::stated(unknown)
            }
        },
        Some(other) => {
            repairs.push(format!("{field}: {} set to unknown", json_type(other)));
            Reading::stated(unknown)
        }
    }
}

fn is_stated_unknown(text: &str) -> bool {
    text.is_empty() || text.eq_ignore_ascii_case("unknown") || text.eq_ignore_ascii_case("null")
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok_payload() -> Value {
        json!({
            "risk_level": "moderate",
            "factors": ["Smoking", "Low activity", "Poor diet"],
            "recommendations": [
                "Quit smoking gradually",
                "Walk thirty minutes daily",
                "Eat more vegetables"
            ],
            "raw_extraction": {"age": 47, "smoker": "yes", "exercise": "sedentary", "diet": "poor"},
            "status": "ok"
        })
    }

    fn parse(payload: &Value) -> ParsedResponse {
        parse_model_response(&payload.to_string()).unwrap()
    }

    #[test]
    fn strips_json_fence() {
        let body = ok_payload().to_string();
        let fenced = format!("```json\n{body}\n```");
        assert_eq!(strip_code_fences(&fenced), body);
    }

    #[test]
    fn strips_bare_fence_and_whitespace() {
        assert_eq!(strip_code_fences("  ```\n{\"a\":1}\n```  \n"), "{\"a\":1}");
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn fenced_payload_round_trips() {
        let expected = ok_payload();
        let pretty = serde_json::to_string_pretty(&expected).unwrap();
        let fenced = format!("```json\n{pretty}\n```");
        assert_eq!(parse_json_payload(&fenced).unwrap(), expected);
    }

    #[test]
    fn parses_ok_response() {
        let parsed = parse(&ok_payload());
        assert_eq!(parsed.reported_missing, Some(0));
        match parsed.assessment {
            AssessmentResult::Ok {
                risk_level,
                factors,
                recommendations,
                raw_extraction,
            } => {
                assert_eq!(risk_level, RiskLevel::Moderate);
                assert_eq!(factors.len(), 3);
                assert_eq!(recommendations[0], "Quit smoking gradually");
                assert_eq!(
                    raw_extraction,
                    Some(RawExtraction {
                        age: Some(47),
                        smoker: Smoker::Yes,
                        exercise: ExerciseLevel::Sedentary,
                        diet: DietQuality::Poor,
                    })
                );
            }
            other => panic!("expected ok, got {other:?}"),
        }
    }

    #[test]
    fn schema_values_are_normalized_and_extra_keys_dropped() {
        let mut payload = ok_payload();
        payload["risk_level"] = json!("Moderate");
        payload["score"] = json!(55);

        let parsed = parse(&payload);
        let wire = serde_json::to_value(&parsed.assessment).unwrap();
        assert_eq!(wire["risk_level"], "moderate");
        assert!(wire.get("score").is_none());
    }

    #[test]
    fn parses_incomplete_profile() {
        let parsed = parse(&json!({
            "status": "incomplete_profile",
            "reason": ">50% fields missing"
        }));
        assert_eq!(
            parsed.assessment,
            AssessmentResult::incomplete(">50% fields missing")
        );
        assert_eq!(parsed.reported_missing, None);
    }

    #[test]
    fn incomplete_without_reason_gets_default() {
        let parsed = parse(&json!({"status": "incomplete_profile"}));
        assert_eq!(parsed.assessment.reason(), Some(INCOMPLETE_REASON));
    }

    #[test]
    fn garbage_is_invalid_json_with_verbatim_raw() {
        let garbage = "I'm sorry, I cannot assess this report.\n";
        match parse_model_response(garbage) {
            Err(AnalysisError::InvalidJson { raw }) => assert_eq!(raw, garbage),
            other => panic!("expected InvalidJson, got {other:?}"),
        }
    }

    #[test]
    fn commentary_around_json_is_not_salvaged() {
        let response = format!("Here is the result: {}", ok_payload());
        assert!(matches!(
            parse_model_response(&response),
            Err(AnalysisError::InvalidJson { .. })
        ));
    }

    #[test]
    fn non_object_is_schema_mismatch() {
        match parse_model_response("[1, 2, 3]") {
            Err(AnalysisError::SchemaMismatch { detail, raw }) => {
                assert!(detail.contains("array"));
                assert_eq!(raw, "[1, 2, 3]");
            }
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn unknown_status_is_schema_mismatch() {
        let result = parse_model_response(r#"{"status": "pending"}"#);
        assert!(matches!(result, Err(AnalysisError::SchemaMismatch { .. })));
    }

    #[test]
    fn ok_without_valid_risk_level_is_schema_mismatch() {
        let mut payload = ok_payload();
        payload["risk_level"] = json!("extreme");
        match parse_model_response(&payload.to_string()) {
            Err(AnalysisError::SchemaMismatch { detail, .. }) => {
                assert!(detail.contains("extreme"))
            }
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn missing_status_with_risk_level_is_ok() {
        let mut payload = ok_payload();
        payload.as_object_mut().unwrap().remove("status");
        assert_eq!(parse(&payload).assessment.status(), "ok");
    }

    #[test]
    fn out_of_vocabulary_values_become_unknown_without_counting_as_missing() {
        let mut payload = ok_payload();
        payload["raw_extraction"] = json!({
            "age": "52",
            "smoker": true,
            "exercise": "athlete",
            "diet": "Healthy"
        });
        let parsed = parse(&payload);
        assert_eq!(
            parsed.assessment.raw_extraction(),
            Some(&RawExtraction {
                age: Some(52),
                smoker: Smoker::Yes,
                exercise: ExerciseLevel::Unknown,
                diet: DietQuality::Healthy,
            })
        );
        assert_eq!(parsed.reported_missing, Some(0));
    }

    #[test]
    fn free_text_extraction_is_not_treated_as_missing() {
        let mut payload = ok_payload();
        payload["raw_extraction"] = json!({
            "age": "61 years",
            "smoker": "current smoker",
            "exercise": "never",
            "diet": "poor"
        });
        let parsed = parse(&payload);
        let extraction = parsed.assessment.raw_extraction().unwrap();
        assert_eq!(extraction.age, Some(61));
        assert_eq!(extraction.smoker, Smoker::Unknown);
        assert_eq!(parsed.reported_missing, Some(0));
        assert_eq!(enforce_completeness(parsed).status(), "ok");
    }

    #[test]
    fn stated_unknowns_are_counted() {
        let mut payload = ok_payload();
        payload["raw_extraction"] = json!({
            "age": null,
            "smoker": "Unknown",
            "diet": "unknown"
        });
        assert_eq!(parse(&payload).reported_missing, Some(4));
    }

    #[test]
    fn implausible_age_becomes_null() {
        let mut payload = ok_payload();
        payload["raw_extraction"]["age"] = json!(451);
        let parsed = parse(&payload);
        assert_eq!(parsed.assessment.raw_extraction().unwrap().age, None);
        assert_eq!(parsed.reported_missing, Some(0));
    }

    #[test]
    fn missing_raw_extraction_stays_absent() {
        let mut payload = ok_payload();
        payload.as_object_mut().unwrap().remove("raw_extraction");
        let parsed = parse(&payload);
        assert_eq!(parsed.assessment.raw_extraction(), None);
        assert_eq!(parsed.reported_missing, None);
    }

    #[test]
    fn leading_number_parsing() {
        assert_eq!(parse_leading_number("61"), Some(61));
        assert_eq!(parse_leading_number("61.4"), Some(61));
        assert_eq!(parse_leading_number("61 years"), Some(61));
        assert_eq!(parse_leading_number("sixty"), None);
    }

    #[test]
    fn phrases_are_coerced() {
        let mut repairs = Vec::new();
        let phrases = repair_phrases(
            "factors",
            Some(&json!(["Smoking", 42, "  ", "Obesity"])),
            &mut repairs,
        );
        assert_eq!(phrases, vec!["Smoking", "Obesity"]);
        assert!(!repairs.is_empty());

        let single = repair_phrases("factors", Some(&json!("Smoking")), &mut repairs);
        assert_eq!(single, vec!["Smoking"]);
    }

    #[test]
    fn enforce_downgrades_sparse_ok() {
        let mut payload = ok_payload();
        payload["raw_extraction"] =
            json!({"age": 30, "smoker": "unknown", "exercise": "unknown", "diet": null});
        match enforce_completeness(parse(&payload)) {
            AssessmentResult::Incomplete {
                reason,
                raw_extraction,
            } => {
                assert_eq!(reason, INCOMPLETE_REASON);
                assert_eq!(raw_extraction.unwrap().age, Some(30));
            }
            other => panic!("expected incomplete, got {other:?}"),
        }
    }

    #[test]
    fn enforce_keeps_ok_without_reported_extraction() {
        let mut payload = ok_payload();
        payload.as_object_mut().unwrap().remove("raw_extraction");
        let parsed = parse(&payload);
        let expected = parsed.assessment.clone();
        assert_eq!(enforce_completeness(parsed), expected);
    }

    #[test]
    fn enforce_keeps_sufficient_ok() {
        let parsed = parse(&ok_payload());
        let expected = parsed.assessment.clone();
        assert_eq!(enforce_completeness(parsed), expected);
    }
}
