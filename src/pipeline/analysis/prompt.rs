use super::types::ExtractionContext;
use crate::models::{InputMode, INCOMPLETE_REASON};

const OCR_PROVENANCE_NOTE: &str = "\
NOTE: The input is raw OCR text from a scanned or photographed medical report.
It may be noisy or handwritten. Expect misread characters and misspelled labels
(for example \"agz\" or \"aqe\" for \"age\", \"5\" read as \"S\"). Read through the noise,
but never fill a gap with a guess.";

const MANUAL_PROVENANCE_NOTE: &str = "\
NOTE: The input was entered directly by the user as form fields. Treat the values
as the user's own statements. Map free-text answers (for example exercise \"rarely\")
onto the allowed values, and use \"unknown\" when an answer does not map.";

/// Build the single instruction string for one analysis.
///
/// Pure: the same context always yields the same prompt.
pub fn build_analysis_prompt(context: &ExtractionContext) -> String {
    let provenance_note = match context.mode {
        InputMode::Image => OCR_PROVENANCE_NOTE,
        InputMode::Manual => MANUAL_PROVENANCE_NOTE,
    };
    let source = match context.mode {
        InputMode::Image => "image",
        InputMode::Manual => "manual",
    };
    let input = &context.text;

    format!(
        r#"You are a highly accurate medical information extraction and health risk
screening system.
You do not diagnose. You only report what the input supports.

RULES (NO EXCEPTIONS):
1. Extract ONLY information clearly supported by the input.
2. NEVER hallucinate or infer a value that is not there.
3. If a value is unclear or missing, use null (age) or "unknown" (other fields).
4. "unknown" is always preferred over a guess.
5. Be conservative and evidence-based.

{provenance_note}

<input source="{source}">
{input}
</input>

FIELDS TO EXTRACT (closed vocabulary, no other values allowed):
- age: a number, or null
- smoker: "yes", "no", or "unknown"
- exercise: "sedentary", "moderate", "active", or "unknown"
- diet: "poor", "average", "healthy", or "unknown"

TASKS:
1. Extract the four fields above into raw_extraction.
2. If 3 or more of the 4 fields are null or "unknown", skip the risk assessment and return exactly:
{{"status": "incomplete_profile", "reason": "{INCOMPLETE_REASON}"}}
3. If sufficient data exists:
   - Identify 3 to 4 health risk factors (each 1 to 3 words)
   - Classify risk_level as "low", "moderate", or "high"
   - Provide 3 to 4 short recommendations (each 3 to 5 words)

OUTPUT RULES:
- Return ONLY one valid JSON object
- No markdown, no code fences
- No explanations
- No extra commentary

VALID OUTPUT FORMAT (if sufficient data):
{{
  "status": "ok",
  "risk_level": "low | moderate | high",
  "factors": ["short factor 1", "short factor 2", "short factor 3"],
  "recommendations": ["short rec 1", "short rec 2", "short rec 3"],
  "raw_extraction": {{
    "age": number_or_null,
    "smoker": "yes | no | unknown",
    "exercise": "sedentary | moderate | active | unknown",
    "diet": "poor | average | healthy | unknown"
  }}
}}
"#
    )
}
