use serde::{Deserialize, Serialize};

use super::enums::InputMode;

/// Exercise value the questionnaire form submits when the user leaves it untouched.
pub const DEFAULT_EXERCISE: &str = "rarely";

/// One analysis request, as handed over by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HealthInput {
    /// Encoded image of a medical report (PNG, JPEG, TIFF or BMP).
    Image(Vec<u8>),
    /// Questionnaire filled in by the user.
    Manual(ManualRecord),
}

impl HealthInput {
    /// Pick the request variant the way the upload form is resolved:
    /// a non-empty image wins, otherwise the manual fields are used.
    pub fn from_parts(image: Option<Vec<u8>>, manual: ManualRecord) -> Self {
        match image {
            Some(bytes) if !bytes.is_empty() => Self::Image(bytes),
            _ => Self::Manual(manual),
        }
    }

    pub fn mode(&self) -> InputMode {
        match self {
            Self::Image(_) => InputMode::Image,
            Self::Manual(_) => InputMode::Manual,
        }
    }
}

/// Questionnaire fields. Serialized verbatim (nulls included) into the model context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub smoker: bool,
    #[serde(default = "default_exercise")]
    pub exercise: String,
    #[serde(default)]
    pub diet: String,
    #[serde(default)]
    pub health_notes: Option<String>,
}

fn default_exercise() -> String {
    DEFAULT_EXERCISE.to_string()
}

impl Default for ManualRecord {
    fn default() -> Self {
        Self {
            name: String::new(),
            age: None,
            smoker: false,
            exercise: default_exercise(),
            diet: String::new(),
            health_notes: None,
        }
    }
}

impl ManualRecord {
    /// True when nothing beyond form defaults was supplied.
    pub fn is_empty(&self) -> bool {
        let exercise = self.exercise.trim();
        self.name.trim().is_empty()
            && self.age.is_none()
            && !self.smoker
            && (exercise.is_empty() || exercise.eq_ignore_ascii_case(DEFAULT_EXERCISE))
            && self.diet.trim().is_empty()
            && self
                .health_notes
                .as_deref()
                .map_or(true, |n| n.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_record_is_empty() {
        assert!(ManualRecord::default().is_empty());
    }

    #[test]
    fn whitespace_fields_count_as_empty() {
        let record = ManualRecord {
            name: "   ".into(),
            exercise: " Rarely ".into(),
            diet: "\n".into(),
            health_notes: Some("  ".into()),
            ..ManualRecord::default()
        };
        assert!(record.is_empty());
    }

    #[test]
    fn any_real_value_makes_record_non_empty() {
        let with_age = ManualRecord { age: Some(52), ..ManualRecord::default() };
        let smoker = ManualRecord { smoker: true, ..ManualRecord::default() };
        let active = ManualRecord { exercise: "regularly".into(), ..ManualRecord::default() };
        let notes = ManualRecord {
            health_notes: Some("asthma since childhood".into()),
            ..ManualRecord::default()
        };
        for record in [with_age, smoker, active, notes] {
            assert!(!record.is_empty(), "{record:?} should not be empty");
        }
    }

    #[test]
    fn deserializes_form_with_defaults() {
        let record: ManualRecord = serde_json::from_str(r#"{"name": "Ana", "age": 41}"#).unwrap();
        assert_eq!(record.name, "Ana");
        assert_eq!(record.age, Some(41));
        assert!(!record.smoker);
        assert_eq!(record.exercise, "rarely");
        assert!(record.health_notes.is_none());
    }

    #[test]
    fn image_bytes_take_precedence() {
        let manual = ManualRecord { age: Some(30), ..ManualRecord::default() };
        let input = HealthInput::from_parts(Some(vec![1, 2, 3]), manual.clone());
        assert_eq!(input.mode(), InputMode::Image);

        let input = HealthInput::from_parts(Some(Vec::new()), manual.clone());
        assert_eq!(input, HealthInput::Manual(manual));
    }
}
