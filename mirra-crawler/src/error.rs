use thiserror::Error;

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),

    #[error("Mirror cancelled")]
    Cancelled,

    #[error("Other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, MirrorError>;
