use serde::{Deserialize, Serialize};

/// Machine-readable business error codes the API is known to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    EmailNotVerified,
    TokenNotValid,
    Unknown,
}

impl ErrorCode {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "EMAIL_NOT_VERIFIED" => Self::EmailNotVerified,
            "token_not_valid" => Self::TokenNotValid,
            _ => Self::Unknown,
        }
    }
}

/// Error body returned by the remote API. Every field is optional because the
/// server mixes its own `{code, message}` envelope with framework `{detail}`
/// responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn kind(&self) -> ErrorCode {
        self.code
            .as_deref()
            .map(ErrorCode::parse)
            .unwrap_or(ErrorCode::Unknown)
    }

    /// Best human-readable text carried by the body.
    pub fn summary(&self) -> Option<&str> {
        self.message.as_deref().or(self.detail.as_deref())
    }
}
