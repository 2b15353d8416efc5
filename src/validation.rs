//! The name and size rules shared by folder creation, upload, rename and move.

use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;
use crate::error::{FsError, FsResult};

/// Characters that cannot appear in an item name.
pub const FORBIDDEN_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Verdict of [`validate_file_name`], shaped for form rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameValidation {
    pub valid: bool,
    pub error: Option<String>,
}

impl NameValidation {
    fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(reason.into()),
        }
    }
}

pub fn validate_file_name(name: &str, config: &StoreConfig) -> NameValidation {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return NameValidation::rejected("name cannot be empty");
    }
    if trimmed.chars().count() > config.max_name_length {
        return NameValidation::rejected(format!(
            "name cannot exceed {} characters",
            config.max_name_length
        ));
    }
    if trimmed == "." || trimmed == ".." {
        return NameValidation::rejected("name cannot be '.' or '..'");
    }
    if let Some(c) = trimmed.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return NameValidation::rejected(format!("name cannot contain '{c}'"));
    }
    if trimmed.chars().any(char::is_control) {
        return NameValidation::rejected("name cannot contain control characters");
    }

    NameValidation::ok()
}

/// Validate `name` and return the trimmed form that gets stored.
pub(crate) fn check_file_name(name: &str, config: &StoreConfig) -> FsResult<String> {
    let verdict = validate_file_name(name, config);
    if verdict.valid {
        Ok(name.trim().to_string())
    } else {
        Err(FsError::Validation(verdict.error.unwrap_or_default()))
    }
}

pub(crate) fn check_file_size(size: u64, config: &StoreConfig) -> FsResult<()> {
    match config.max_file_size {
        Some(max) if size > max => Err(FsError::Validation(format!(
            "file size {size} exceeds the {max} byte limit"
        ))),
        _ => Ok(()),
    }
}
