use chirp_config::ConfigError;
use chirp_http::HttpError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TwitterError {
    /// The API answered with anything other than `200 OK`.
    #[error("Failed: {status} ({message})")]
    Status { status: u16, message: String },

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("response handler failed: {0:#}")]
    Handler(#[source] anyhow::Error),
}

impl TwitterError {
    /// HTTP status for [`TwitterError::Status`], `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            TwitterError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TwitterError>;
