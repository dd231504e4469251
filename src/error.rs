use axum::http::StatusCode;
use std::io;

/// Custom error type for code_engine_hook operations
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Repository configuration error: {0}")]
    RepoConfigError(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("No repository configuration for '{0}'")]
    RepositoryNotFound(String),

    #[error("Missing signature header")]
    MissingSignature,

    #[error("Malformed signature header: {0}")]
    MalformedSignature(String),

    #[error("Signature verification failed")]
    SignatureMismatch,

    #[error("Action failed: {0}")]
    ActionFailed(String),

    #[error("Webhook pipeline aborted: {0}")]
    PipelineAborted(String),

    #[error("Code engine upload failed: {0}")]
    UploadFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl HookError {
    /// HTTP status returned to the webhook sender for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            HookError::InvalidPayload(_) | HookError::MalformedSignature(_) => {
                StatusCode::BAD_REQUEST
            }
            HookError::MissingSignature | HookError::SignatureMismatch => StatusCode::FORBIDDEN,
            HookError::RepositoryNotFound(_) => StatusCode::NOT_FOUND,
            HookError::UploadFailed(_) => StatusCode::BAD_GATEWAY,
            HookError::ConfigError(_)
            | HookError::RepoConfigError(_)
            | HookError::ActionFailed(_)
            | HookError::PipelineAborted(_)
            | HookError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Helper type for Results that use HookError
pub type Result<T> = std::result::Result<T, HookError>;
