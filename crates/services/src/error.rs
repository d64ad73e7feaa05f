//! # Service Errors

use domains::{ApiError, ValidationErrors};
use thiserror::Error;

/// Why a form submission (login, signup, posting) did not go through.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// Caught client-side; nothing was sent.
    #[error("invalid form: {0}")]
    Invalid(ValidationErrors),

    /// The backend refused it. Carries the message to show on the form.
    #[error("{0}")]
    Rejected(String),
}

impl FormError {
    pub fn from_api(err: &ApiError, fallback: &str) -> Self {
        FormError::Rejected(err.user_message(fallback))
    }

    pub fn field_errors(&self) -> Option<&ValidationErrors> {
        match self {
            FormError::Invalid(errors) => Some(errors),
            FormError::Rejected(_) => None,
        }
    }
}

impl From<ValidationErrors> for FormError {
    fn from(errors: ValidationErrors) -> Self {
        FormError::Invalid(errors)
    }
}

/// An interaction refused locally, before any request was issued.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionRejected {
    /// The same control already has a request in flight.
    #[error("a request for this action is already in progress")]
    Busy,

    #[error("you need to be logged in to do that")]
    NotSignedIn,

    #[error("you do not have permission to do that")]
    Forbidden,

    /// The screen has nothing loaded to act on.
    #[error("nothing to act on yet")]
    NotLoaded,

    #[error("invalid input: {0}")]
    Invalid(ValidationErrors),
}

impl From<ValidationErrors> for ActionRejected {
    fn from(errors: ValidationErrors) -> Self {
        ActionRejected::Invalid(errors)
    }
}
