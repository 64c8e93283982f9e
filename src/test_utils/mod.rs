//! Test utilities.
//!
//! This module provides:
//! - A scripted `WaitlistStore` for exercising the submission controller
//! - An in-memory `RecordBackend` for exercising the store adapter's fallbacks

mod backend_mocks;
mod store_mocks;

pub use backend_mocks::*;
pub use store_mocks::*;
