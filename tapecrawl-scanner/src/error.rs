use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status error: {status} {url}")]
    Status { status: StatusCode, url: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Render session error: {0}")]
    Render(String),

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ScanError {
    /// Transport failures and non-success responses.
    pub fn is_fetch(&self) -> bool {
        matches!(self, ScanError::Http(_) | ScanError::Status { .. })
    }

    /// The body could not be interpreted as HTML.
    pub fn is_parse(&self) -> bool {
        matches!(self, ScanError::Parse(_))
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
