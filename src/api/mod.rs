//! Client for the OONI backend API.
//!
//! Covers the app statistics endpoint and the measurement metadata endpoint.

mod client;
mod models;

pub use client::*;
pub use models::*;

use std::time::Duration;
use thiserror::Error;

/// API error types.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("backend returned HTTP {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}
