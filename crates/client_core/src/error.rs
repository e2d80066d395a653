use shared::error::ApiError;
use thiserror::Error;

use crate::validation::ValidationReport;

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("validation failed: {0}")]
    Validation(ValidationReport),
    #[error("session rejected by server, sign in again")]
    Unauthorized,
    /// Rejected with a token that a newer sign-in has already replaced. The
    /// live session is intact and the request can be retried.
    #[error("request used a replaced credential, retry")]
    StaleCredential,
    #[error("network unavailable: {0}")]
    Transport(String),
    #[error("email not verified: {}", .message.as_deref().unwrap_or("check your inbox for the activation link"))]
    EmailNotVerified {
        email: Option<String>,
        message: Option<String>,
    },
    #[error("server returned {status}: {}", .body.summary().unwrap_or("no details"))]
    Remote { status: u16, body: ApiError },
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("failed to encode request body: {0}")]
    Encode(String),
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
    #[error("credential storage failed: {0}")]
    Storage(String),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StaleCredential | Self::Transport(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<ValidationReport> for ClientError {
    fn from(report: ValidationReport) -> Self {
        Self::Validation(report)
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
