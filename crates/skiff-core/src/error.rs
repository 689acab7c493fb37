//! Error types for Skiff

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Dropbox API error: {0}")]
    Dropbox(String),

    #[error("Supervisor API error: {0}")]
    Supervisor(String),

    #[error("Upload error: {0}")]
    Upload(String),
}

impl Error {
    /// Whether this error means the credential itself is bad.
    ///
    /// Auth failures at startup are fatal; everything else is retried or
    /// abandoned per cycle.
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
