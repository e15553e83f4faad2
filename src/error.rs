//! Relay error kinds
//!
//! Every failure on an API route collapses into one of these variants. The
//! routes decide the response body shape; the status is always 500.

use hyper::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// Unparsable query parameter or request body
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Upstream answered with a non-200 status
    #[error("upstream API error: status {status}")]
    Upstream { status: u16 },

    /// Upstream could not be reached or timed out
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Upstream reply (or the model text inside it) did not decode
    #[error("decode error: {0}")]
    Decode(String),
}

impl RelayError {
    /// Status code sent to the caller
    pub const fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::UpstreamUnavailable(err.to_string())
        }
    }
}
