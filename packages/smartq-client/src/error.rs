//! Error types for the SmartQ client.

use thiserror::Error;

/// Result type for SmartQ client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Message shown when a request exceeds its deadline.
pub const TIMEOUT_MESSAGE: &str = "Request timeout. Please check your connection.";

/// SmartQ client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Deadline exceeded; the in-flight request was aborted
    #[error("Request timeout. Please check your connection.")]
    Timeout,

    /// Transport failure (DNS, connection reset, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response, message taken from the body or synthesized from the status
    #[error("{message}")]
    Request { status: u16, message: String },

    /// Login returned 2xx without both a token and a user
    #[error("{0}")]
    InvalidCredentials(String),

    /// Verification attempted with fewer than six digits
    #[error("Please enter the complete 6-digit code.")]
    IncompleteCode,

    /// Backend rejected the HTTP verb for an endpoint
    #[error("{method} not supported: {message}")]
    VerbUnsupported { method: String, message: String },

    /// Backend answered the verification call with `verified: false`
    #[error("{0}")]
    OtpRejected(String),

    /// 2xx response whose envelope reported `success: false`
    #[error("{0}")]
    Rejected(String),

    /// Resend requested while the countdown is still running
    #[error("You can request a new code in {0}s.")]
    ResendNotReady(u32),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ClientError {
    /// Text a front-end displays as-is.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::VerbUnsupported { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// HTTP status of a failed request, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the failure came from the transport rather than the backend.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Timeout | ClientError::Network(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_is_user_facing() {
        assert_eq!(ClientError::Timeout.user_message(), TIMEOUT_MESSAGE);
    }

    #[test]
    fn test_request_error_displays_backend_message() {
        let err = ClientError::Request {
            status: 400,
            message: "email must be an email".into(),
        };
        assert_eq!(err.user_message(), "email must be an email");
        assert_eq!(err.status(), Some(400));
        assert!(!err.is_transport());
    }

    #[test]
    fn test_verb_unsupported_surfaces_backend_text() {
        let err = ClientError::VerbUnsupported {
            method: "POST".into(),
            message: "Cannot POST /api/customers/change-username".into(),
        };
        assert_eq!(
            err.user_message(),
            "Cannot POST /api/customers/change-username"
        );
    }
}
