use thiserror::Error;

use crate::application::messages;
use crate::domain::entities::email::ValidationError;

/// Classified store failure categories. Each maps to one fixed sentence,
/// except `Unknown`, which falls back to the backend's own text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreErrorKind {
    Duplicate,
    MissingField,
    Constraint,
    TableNotFound,
    PermissionDenied,
    Unknown,
}

impl StoreErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreErrorKind::Duplicate => "DUPLICATE",
            StoreErrorKind::MissingField => "MISSING_FIELD",
            StoreErrorKind::Constraint => "CONSTRAINT",
            StoreErrorKind::TableNotFound => "TABLE_NOT_FOUND",
            StoreErrorKind::PermissionDenied => "PERMISSION_DENIED",
            StoreErrorKind::Unknown => "UNKNOWN",
        }
    }

    fn fixed_message(&self) -> Option<&'static str> {
        match self {
            StoreErrorKind::Duplicate => Some(messages::DUPLICATE),
            StoreErrorKind::MissingField => Some(messages::MISSING_FIELD),
            StoreErrorKind::Constraint => Some(messages::CONSTRAINT),
            StoreErrorKind::TableNotFound => Some(messages::TABLE_NOT_FOUND),
            StoreErrorKind::PermissionDenied => Some(messages::PERMISSION_DENIED),
            StoreErrorKind::Unknown => None,
        }
    }
}

/// An error reported by the hosted store, already classified.
///
/// SECURITY: `message`, `details` and `hint` are raw backend text. Only
/// `user_message()` is meant for display.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} ({}): {message}", .kind.as_str(), .code.as_deref().unwrap_or("no code"))]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub code: Option<String>,
    pub message: String,
    pub details: Option<String>,
    pub hint: Option<String>,
}

impl StoreError {
    pub fn has_code(&self, code: &str) -> bool {
        self.code.as_deref() == Some(code)
    }

    pub fn user_message(&self) -> String {
        if let Some(fixed) = self.kind.fixed_message() {
            return fixed.to_string();
        }
        if self.message.trim().is_empty() {
            messages::GENERIC_FAILURE.to_string()
        } else {
            self.message.clone()
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn store_kind(&self) -> Option<StoreErrorKind> {
        match self {
            AppError::Store(err) => Some(err.kind),
            _ => None,
        }
    }

    pub fn is_table_missing(&self) -> bool {
        self.store_kind() == Some(StoreErrorKind::TableNotFound)
    }

    pub fn is_permission_denied(&self) -> bool {
        self.store_kind() == Some(StoreErrorKind::PermissionDenied)
    }

    /// Sentence safe to show in an alert.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(err) => err.to_string(),
            AppError::Store(err) => err.user_message(),
            AppError::Network(_) => messages::CONNECTIVITY_FAILURE.to_string(),
            AppError::Config(_) | AppError::Internal(_) => messages::GENERIC_FAILURE.to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
