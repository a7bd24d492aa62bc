//! Error types for the data repository service

use thiserror::Error;

/// Errors raised by the data pipeline and the GitHub-facing layers
#[derive(Error, Debug)]
pub enum Error {
    #[error("archive error: {0}")]
    Archive(String),

    #[error("malformed data file: {0}")]
    MalformedDataFile(String),

    #[error("indexer input is already compressed: {0}")]
    PrecompressedInput(String),

    #[error("GitHub request failed for {url}: {source}")]
    Upstream {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if the error is transient (a retry against the hosting provider may succeed)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Upstream { .. } | Error::Io(_))
    }

    /// Get error category for logging and metrics
    pub fn category(&self) -> &'static str {
        match self {
            Error::Archive(_) => "archive",
            Error::MalformedDataFile(_) => "malformed_data_file",
            Error::PrecompressedInput(_) => "precompressed_input",
            Error::Upstream { .. } => "upstream",
            Error::NotFound(_) => "not_found",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
        }
    }
}
