use thiserror::Error;

/// Failures while loading configuration or preparing the local directories.
#[derive(Error, Debug)]
pub enum CoreError {
    /// One or more store connection variables are absent or empty.
    #[error("store is not configured; missing {}", missing.join(", "))]
    NotConfigured { missing: Vec<&'static str> },

    #[error("no home directory to place ~/.highpoint in")]
    NoHomeDir,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid store URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("config file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
