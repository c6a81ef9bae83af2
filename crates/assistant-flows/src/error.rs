//! Error types for the assistant flows.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("completion API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Missing LLM API key (set HIGHPOINT_LLM_API_KEY)")]
    MissingApiKey,

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

pub type AssistantResult<T> = Result<T, AssistantError>;
