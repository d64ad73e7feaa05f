//! Transient messages shown after an interaction.

use domains::ApiError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// Server message verbatim when there is one, `fallback` otherwise.
    pub fn from_api(err: &ApiError, fallback: &str) -> Self {
        Self::error(err.user_message(fallback))
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}
