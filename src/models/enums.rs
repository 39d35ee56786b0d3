use serde::{Deserialize, Serialize};

use super::InvalidEnumValue;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnumValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnumValue {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Smoker {
    Yes => "yes",
    No => "no",
    Unknown => "unknown",
});

str_enum!(ExerciseLevel {
    Sedentary => "sedentary",
    Moderate => "moderate",
    Active => "active",
    Unknown => "unknown",
});

str_enum!(DietQuality {
    Poor => "poor",
    Average => "average",
    Healthy => "healthy",
    Unknown => "unknown",
});

str_enum!(RiskLevel {
    Low => "low",
    Moderate => "moderate",
    High => "high",
});

/// Where the analyzed data came from.
///
/// The wire value for the image path is `image/ocr`, the tag downstream
/// consumers of `developer_info` already key on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputMode {
    #[serde(rename = "image/ocr")]
    Image,
    #[serde(rename = "manual")]
    Manual,
}

impl InputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image/ocr",
            Self::Manual => "manual",
        }
    }
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
