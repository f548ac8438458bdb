use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Video not found: {video_id}")]
    VideoNotFound { video_id: Uuid },

    #[error("Video transcription was not found")]
    MissingTranscript { video_id: Uuid },

    #[error("Completion API failed: {reason}")]
    Upstream { reason: String },

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Error::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn upstream(reason: impl Into<String>) -> Self {
        Error::Upstream {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
