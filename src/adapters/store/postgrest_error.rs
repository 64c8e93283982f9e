//! PostgREST error bodies and their classification.

use serde::Deserialize;

use crate::app_error::{StoreError, StoreErrorKind};

pub const UNIQUE_VIOLATION: &str = "23505";
pub const NOT_NULL_VIOLATION: &str = "23502";
pub const FOREIGN_KEY_VIOLATION: &str = "23503";
pub const UNDEFINED_TABLE: &str = "42P01";
pub const INSUFFICIENT_PRIVILEGE: &str = "42501";
/// Table absent from the schema cache (newer PostgREST versions).
pub const TABLE_NOT_IN_SCHEMA_CACHE: &str = "PGRST205";
/// JWT rejected for the requested role.
pub const JWT_REJECTED: &str = "PGRST301";
/// Singular response requested but zero rows matched.
pub const NO_ROWS: &str = "PGRST116";

/// The JSON body PostgREST sends with non-2xx responses.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PostgrestErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl PostgrestErrorBody {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: Some(code.to_string()),
            message: Some(message.to_string()),
            details: None,
            hint: None,
        }
    }
}

impl From<PostgrestErrorBody> for StoreError {
    fn from(body: PostgrestErrorBody) -> Self {
        let message = body.message.unwrap_or_default();
        let kind = classify(body.code.as_deref(), &message);
        StoreError {
            kind,
            code: body.code,
            message,
            details: body.details,
            hint: body.hint,
        }
    }
}

/// Map a backend code and message to a store error category.
///
/// Codes win over message text; the text rules only catch errors that arrive
/// without a recognised code.
pub fn classify(code: Option<&str>, message: &str) -> StoreErrorKind {
    match code {
        Some(UNIQUE_VIOLATION) => return StoreErrorKind::Duplicate,
        Some(NOT_NULL_VIOLATION) => return StoreErrorKind::MissingField,
        Some(FOREIGN_KEY_VIOLATION) => return StoreErrorKind::Constraint,
        Some(UNDEFINED_TABLE) | Some(TABLE_NOT_IN_SCHEMA_CACHE) => {
            return StoreErrorKind::TableNotFound;
        }
        Some(INSUFFICIENT_PRIVILEGE) | Some(JWT_REJECTED) => {
            return StoreErrorKind::PermissionDenied;
        }
        _ => {}
    }

    if mentions_permission(message) {
        StoreErrorKind::PermissionDenied
    } else if message.contains("foreign key") || message.contains("constraint") {
        StoreErrorKind::Constraint
    } else {
        StoreErrorKind::Unknown
    }
}

pub fn mentions_permission(message: &str) -> bool {
    message.contains("permission") || message.contains("policy")
}
