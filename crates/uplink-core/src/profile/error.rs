use thiserror::Error;

use super::tag::{DecodeRule, Tag};

/// Errors raised while building or looking up device profiles.
///
/// These are configuration errors: unlike malformed frames they stop the
/// caller instead of degrading to a partial record.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("unknown device profile `{name}`")]
    UnknownProfile { name: String, available: Vec<String> },
    #[error("device profile name must not be empty")]
    EmptyName,
    #[error("device profile `{name}` is defined more than once")]
    DuplicateProfile { name: String },
    #[error("tag {tag} must name an output field")]
    EmptyField { tag: Tag },
    #[error("tag {tag} is declared twice (fields `{first}` and `{second}`)")]
    DuplicateTag {
        tag: Tag,
        first: String,
        second: String,
    },
    #[error("tag {tag} width {width} is too small for rule {rule} (needs {min})")]
    WidthTooSmall {
        tag: Tag,
        rule: DecodeRule,
        width: usize,
        min: usize,
    },
    #[error("tag {tag} width {width} exceeds the maximum field width {max}")]
    WidthTooLarge { tag: Tag, width: usize, max: usize },
    #[error("invalid profile configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Errors raised when producing wire bytes for a field value.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("profile has no field named `{field}`")]
    UnknownField { field: String },
    #[error("rule {rule} cannot encode value {value}")]
    WrongValueKind { rule: DecodeRule, value: String },
    #[error("value {value} is out of range for rule {rule}")]
    OutOfRange { rule: DecodeRule, value: String },
}
