use std::fmt;

use shared::domain::ServiceHeader;
use thiserror::Error;

use crate::controller::{AuthoringMode, Draft};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Header,
    Description,
    Images,
}

impl FormField {
    pub fn as_str(self) -> &'static str {
        match self {
            FormField::Header => "header",
            FormField::Description => "description",
            FormField::Images => "images",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: FormField,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: FormField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub(crate) struct ValidatedFields {
    pub(crate) header: ServiceHeader,
    pub(crate) description: String,
}

/// Checks run before any upload or store call.
pub(crate) fn validate_draft(draft: &Draft) -> Result<ValidatedFields, ValidationError> {
    let Some(header) = draft.header else {
        return Err(ValidationError::new(
            FormField::Header,
            "select a service header",
        ));
    };

    let description = draft.description.trim();
    if description.is_empty() {
        return Err(ValidationError::new(
            FormField::Description,
            "description is required",
        ));
    }

    if matches!(draft.mode, AuthoringMode::New) && draft.staging.is_empty() {
        return Err(ValidationError::new(
            FormField::Images,
            "select at least one image",
        ));
    }

    Ok(ValidatedFields {
        header,
        description: description.to_string(),
    })
}
