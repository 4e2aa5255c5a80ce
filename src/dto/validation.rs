//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a text field holds something other than whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Field must not be blank".into());
        return Err(err);
    }

    Ok(())
}
