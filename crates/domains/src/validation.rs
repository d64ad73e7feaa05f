//! Client-side form checks. They run before any request is built, so an
//! invalid form never reaches the network.

use crate::error::{Field, ValidationErrors};

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_TITLE_LEN: usize = 5;
pub const MIN_DESCRIPTION_LEN: usize = 20;
pub const MAX_COMMENT_LEN: usize = 1000;
pub const MIN_REASON_LEN: usize = 5;
pub const MAX_REASON_LEN: usize = 500;

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Checked as typed: surrounding spaces count toward the length.
pub fn username(value: &str) -> Option<&'static str> {
    if value.is_empty() {
        Some("Username is required")
    } else if char_len(value) < MIN_USERNAME_LEN {
        Some("Username must be at least 3 characters")
    } else {
        None
    }
}

pub fn email(value: &str) -> Option<&'static str> {
    if value.is_empty() {
        Some("Email is required")
    } else if !value.contains('@') || !value.contains('.') {
        Some("Please enter a valid email")
    } else {
        None
    }
}

/// Signup password rule. Login only requires a non-empty password.
pub fn password(value: &str) -> Option<&'static str> {
    if value.is_empty() {
        Some("Password is required")
    } else if char_len(value) < MIN_PASSWORD_LEN {
        Some("Password must be at least 6 characters")
    } else {
        None
    }
}

pub fn title(value: &str) -> Option<&'static str> {
    let value = value.trim();
    if value.is_empty() {
        Some("Title is required")
    } else if char_len(value) < MIN_TITLE_LEN {
        Some("Title must be at least 5 characters")
    } else {
        None
    }
}

pub fn description(value: &str) -> Option<&'static str> {
    let value = value.trim();
    if value.is_empty() {
        Some("Description is required")
    } else if char_len(value) < MIN_DESCRIPTION_LEN {
        Some("Description must be at least 20 characters.")
    } else {
        None
    }
}

pub fn link(value: &str) -> Option<&'static str> {
    let value = value.trim();
    if value.is_empty() {
        Some("Link is required")
    } else if !value.starts_with("http://") && !value.starts_with("https://") {
        Some("Please enter a valid URL (starting with http:// or https://)")
    } else {
        None
    }
}

pub fn comment(value: &str) -> Option<&'static str> {
    let value = value.trim();
    if value.is_empty() {
        Some("Comment cannot be empty")
    } else if char_len(value) > MAX_COMMENT_LEN {
        Some("Comment cannot exceed 1000 characters")
    } else {
        None
    }
}

pub fn report_reason(value: &str) -> Option<&'static str> {
    let len = char_len(value.trim());
    if len < MIN_REASON_LEN {
        Some("Reason must be at least 5 characters")
    } else if len > MAX_REASON_LEN {
        Some("Reason cannot exceed 500 characters")
    } else {
        None
    }
}

/// Collects the messages of several checks into one error set.
pub fn collect<'a>(
    checks: impl IntoIterator<Item = (Field, Option<&'a str>)>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    for (field, message) in checks {
        if let Some(message) = message {
            errors.push(field, message);
        }
    }
    errors.into_result()
}

/// Wraps a single check as a one-field result.
pub fn check(field: Field, message: Option<&str>) -> Result<(), ValidationErrors> {
    collect([(field, message)])
}
