//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the gateway, with the response body when it could be read.
    #[error("Gateway error (status {status}): {body}")]
    Transport { status: u16, body: String },

    #[error("Empty response: {0}")]
    EmptyResponse(String),

    #[error("Malformed operation result: {0}")]
    MalformedResult(String),

    #[error("Video initiation failed: {0}")]
    Initiation(String),

    #[error("Video download failed: {0}")]
    Download(String),

    #[error("Gave up polling after {0} status checks")]
    PollLimit(u32),

    #[error("Gave up polling after {0:?}")]
    PollTimeout(Duration),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl Error {
    /// True for network failures and non-2xx gateway responses.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Transport { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
