use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::time::Duration;
use thiserror::Error;

use crate::models::ErrorResponse;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors surfaced by the HTTP layer and application bootstrap.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Validation(#[from] PreferenceValidationError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl ApiError {
    /// Error category reported in the `error` field of the response body.
    pub fn category(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "Bad request",
            ApiError::Validation(_) => "Validation error",
            _ => "Internal server error",
        }
    }

    /// Human-readable detail lines for the response body.
    pub fn details(&self) -> Vec<String> {
        match self {
            ApiError::BadRequest(message) => vec![message.clone()],
            ApiError::Validation(err) => err.errors.clone(),
            // Internal failures are logged, not echoed to the caller.
            _ => Vec::new(),
        }
    }

    pub fn to_response(&self, request_id: Option<String>) -> ErrorResponse {
        ErrorResponse {
            error: self.category().to_string(),
            details: self.details(),
            request_id,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        HttpResponse::build(self.status_code()).json(self.to_response(None))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::Config(err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(format!("{:#}", err))
    }
}

/// Raw preference input failed schema, range or cross-field checks.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}", display_errors(.errors))]
pub struct PreferenceValidationError {
    pub errors: Vec<String>,
}

impl PreferenceValidationError {
    pub fn new(errors: Vec<String>) -> Self {
        Self { errors }
    }
}

fn display_errors(errors: &[String]) -> String {
    if errors.is_empty() {
        "Invalid preferences".to_string()
    } else {
        errors.join("; ")
    }
}

/// The text-generation collaborator could not produce a completion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("API key for the text-generation service is not set")]
    MissingApiKey,

    #[error("text-generation service rejected credentials (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("text-generation request timed out after {0:?}")]
    Timeout(Duration),

    #[error("text-generation HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("text-generation request failed: {0}")]
    Transport(String),

    #[error("unexpected text-generation response shape: {0}")]
    UnexpectedShape(String),
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GenerationError::UnexpectedShape(err.to_string())
        } else {
            GenerationError::Transport(err.to_string())
        }
    }
}

/// The completion text could not be turned into ranked items.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("no JSON array found in completion")]
    NoArray,

    #[error("completion is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("expected a JSON array, got {0}")]
    NotAnArray(&'static str),

    #[error("no valid recommendations parsed ({warnings} items skipped)")]
    NoValidItems { warnings: usize },
}

/// A source record is unusable; fatal for the whole batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("candidate at position {index} is missing required field: name")]
    MissingName { index: usize },
}
