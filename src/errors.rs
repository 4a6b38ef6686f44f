use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("HTTP Request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Server error: status code {status_code}, message: {message}")]
    ServerError {
        status_code: u16,
        message: String,
    },

    #[error("Polling timed out for video {video_id} after {elapsed:?}")]
    PollTimeout {
        video_id: u64,
        elapsed: Duration,
    },

    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("Invalid video id: {0}")]
    InvalidVideoId(String),

    #[error("Invalid quality level {requested}, {available} level(s) loaded")]
    InvalidLevel {
        requested: usize,
        available: usize,
    },

    #[error("Param error: {0}")]
    ParamError(String),

    #[error("An upload is already in progress")]
    UploadInProgress,

    #[error("Manager shut down")]
    ManagerShutdown,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl StudioError {
    pub fn server_error(status_code: u16, message: impl Into<String>) -> Self {
        Self::ServerError {
            status_code,
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }

    /// HTTP status carried by the error, if the backend answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ServerError { status_code, .. } => Some(*status_code),
            Self::HttpError(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Error alias
pub type Result<T, E = StudioError> = std::result::Result<T, E>;
