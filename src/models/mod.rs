pub mod assessment;
pub mod enums;
pub mod input;

pub use assessment::*;
pub use enums::*;
pub use input::*;

/// A string that is not part of a closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnumValue {
    pub field: String,
    pub value: String,
}
