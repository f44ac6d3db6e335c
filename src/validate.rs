//! Form checks run before anything is sent to the API.
//!
//! First name and email are required and the email must look like an
//! address. Failures are reported per field so the form can show them inline.
use std::borrow::Cow;

use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{Error, Result};
use crate::model::{UserField, UserInput};

pub fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some(Cow::from("required"));
        return Err(err);
    }
    Ok(())
}

/// Validate form input, returning `Error::ValidationFailed` on the first bad submit.
pub fn validate_input(input: &UserInput) -> Result<()> {
    input.validate().map_err(Error::ValidationFailed)
}

/// First message recorded for `field`, for inline display.
pub fn field_message(errors: &ValidationErrors, field: UserField) -> Option<String> {
    let errs = errors.field_errors();
    let first = errs.get(field.key())?.first()?;
    Some(
        first
            .message
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_else(|| first.code.to_string()),
    )
}
