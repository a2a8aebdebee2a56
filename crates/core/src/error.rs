use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum YtprepError {
    #[error("Could not extract video ID from input: {input}")]
    InvalidIdentifier { input: String },

    #[error("Failed to extract video information for {video_id}: {reason}")]
    FetchFailed { video_id: String, reason: String },

    #[error("Failed to process subtitles: {reason}")]
    CaptionParse { reason: String },

    #[error("Cache IO error at {path}: {source}")]
    CacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl YtprepError {
    pub(crate) fn cache_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        YtprepError::CacheIo {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, YtprepError>;
