//! Error types for the Pacifica client.

use thiserror::Error;

use crate::types::ApiErrorCode;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] config::ConfigError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The secret did not decode to an accepted key shape. Raised before any
    /// network activity.
    #[error("Invalid key material: {message}")]
    KeyFormat { message: String },

    /// Non-2xx HTTP status from the venue.
    #[error("Request failed with status {status}: {body}")]
    Transport { status: u16, body: String },

    /// 2xx response whose envelope reports `success: false`.
    #[error("API error: {message}")]
    Api { message: String, code: Option<i64> },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Signing error: {message}")]
    Signing { message: String },
}

impl Error {
    pub(crate) fn key_format(message: impl Into<String>) -> Self {
        Self::KeyFormat {
            message: message.into(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// HTTP status of a rejected request, if this error came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Venue error code carried by an unsuccessful response envelope.
    pub fn api_code(&self) -> Option<ApiErrorCode> {
        match self {
            Self::Api {
                code: Some(code), ..
            } => Some(ApiErrorCode::from_code(*code)),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
