//! User-facing copy for the waitlist form and its alerts.

pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";
pub const CONNECTIVITY_FAILURE: &str =
    "Unable to connect to the server. Please check your internet connection.";

pub const DUPLICATE: &str = "This email is already registered";
pub const MISSING_FIELD: &str = "Missing required field. Please contact support.";
pub const CONSTRAINT: &str = "Database constraint error. Please contact support.";
pub const TABLE_NOT_FOUND: &str = "Database table not found. Please contact support.";
pub const PERMISSION_DENIED: &str = "Database access denied. Please contact support.";

pub const SUCCESS_TITLE: &str = "Success!";
pub const SUCCESS_MESSAGE: &str = "Thanks for joining our waitlist! We'll be in touch soon.";
pub const ALREADY_REGISTERED_TITLE: &str = "Already Registered";
pub const ALREADY_REGISTERED_MESSAGE: &str =
    "This email is already on our waitlist! We'll be in touch soon.";
pub const ERROR_TITLE: &str = "Error";

/// Labels rendered around the email input.
pub struct FormCopy;

impl FormCopy {
    pub const TITLE: &'static str = "Join the Waitlist";
    pub const PLACEHOLDER: &'static str = "Enter your email address";
    pub const BUTTON: &'static str = "Join Waitlist";
    pub const SUBMITTING: &'static str = "Joining...";
    pub const DISCLAIMER: &'static str = "We'll never spam you. Unsubscribe at any time.";
}

/// A blocking alert: title plus body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub title: &'static str,
    pub message: String,
}

impl Feedback {
    pub fn success() -> Self {
        Self {
            title: SUCCESS_TITLE,
            message: SUCCESS_MESSAGE.to_string(),
        }
    }

    pub fn already_registered() -> Self {
        Self {
            title: ALREADY_REGISTERED_TITLE,
            message: ALREADY_REGISTERED_MESSAGE.to_string(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            title: ERROR_TITLE,
            message: message.into(),
        }
    }
}
