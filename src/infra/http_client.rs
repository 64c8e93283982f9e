//! HTTP client factory with consistent timeout configuration.
//!
//! The store backend must get its `reqwest::Client` from here rather than
//! constructing one directly.

use reqwest::Client;
use std::time::Duration;

/// Default connect timeout (TCP handshake + TLS).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default request timeout (total request/response time).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build an HTTP client with the given total request timeout.
pub fn try_build_client(request_timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(request_timeout))
        .timeout(request_timeout)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_default_timeout() {
        assert!(try_build_client(DEFAULT_REQUEST_TIMEOUT).is_ok());
    }

    #[test]
    fn builds_with_short_timeout() {
        assert!(try_build_client(Duration::from_secs(1)).is_ok());
    }
}
