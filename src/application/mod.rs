pub mod app_error;
pub mod messages;
pub mod use_cases;
