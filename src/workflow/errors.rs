use crate::workflow::readiness::{ApiKind, ReadinessError};
use std::time::Duration;
use thiserror::Error;

/// Broad class of a client-side failure, used to decide how it is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rejected locally before any network call
    Validation,
    /// A dependency is not ready yet; retry by re-running initialization
    Initialization,
    /// The gateway or an upstream service failed
    Upstream,
}

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("{0}")]
    InvalidGuestName(&'static str),

    #[error("Empty URL provided")]
    EmptyUrl,

    #[error("URL validation failed: {0}")]
    InvalidUrl(String),

    #[error("URL returned empty content")]
    EmptyContent,

    #[error("URL content exceeds size limit ({}MB > 1MB)", megabytes(.size))]
    ContentTooLarge { size: usize },

    #[error("another submission is already in progress")]
    Busy,

    #[error("No access token available")]
    AuthenticationRequired,

    #[error("{api} API not ready: {reason}")]
    NotReady { api: ApiKind, reason: String },

    #[error("Missing sheet ID")]
    NoActiveSheet,

    #[error("No client ID in config response")]
    MissingClientId,

    #[error("timed out after {0:?} waiting for {1}")]
    Timeout(Duration, &'static str),

    #[error(transparent)]
    Readiness(#[from] ReadinessError),

    #[error("gateway returned {status}: {message}")]
    Gateway { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("{0}")]
    InvalidResponse(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn megabytes(size: &usize) -> String {
    format!("{:.1}", *size as f64 / 1024.0 / 1024.0)
}

impl WorkflowError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidGuestName(_)
            | Self::EmptyUrl
            | Self::InvalidUrl(_)
            | Self::EmptyContent
            | Self::ContentTooLarge { .. }
            | Self::Busy => ErrorCategory::Validation,
            Self::AuthenticationRequired
            | Self::NotReady { .. }
            | Self::NoActiveSheet
            | Self::MissingClientId
            | Self::Timeout(..)
            | Self::Readiness(_) => ErrorCategory::Initialization,
            Self::Gateway { .. }
            | Self::Transport(_)
            | Self::InvalidResponse(_)
            | Self::Serialization(_) => ErrorCategory::Upstream,
        }
    }

    /// User-facing summary when the error carries its own; callers fall
    /// back to a flow-specific message otherwise.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::InvalidGuestName(message) => Some(message.to_string()),
            Self::EmptyUrl => Some("URL is required".to_string()),
            Self::InvalidUrl(_) => Some("Invalid URL format".to_string()),
            Self::AuthenticationRequired => Some("Authentication required".to_string()),
            Self::NotReady { api, .. } => Some(format!("{} API not ready", api)),
            Self::NoActiveSheet => Some("No active sheet found".to_string()),
            Self::Busy => Some("Please wait for the current request to finish".to_string()),
            _ => None,
        }
    }

    /// Content problems are written to the sheet's log before surfacing.
    pub fn is_content_error(&self) -> bool {
        matches!(self, Self::EmptyContent | Self::ContentTooLarge { .. })
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_limit_message() {
        let err = WorkflowError::ContentTooLarge {
            size: 3 * 1024 * 1024 / 2,
        };
        assert_eq!(err.to_string(), "URL content exceeds size limit (1.5MB > 1MB)");
        assert!(err.is_content_error());
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            WorkflowError::NoActiveSheet.category(),
            ErrorCategory::Initialization
        );
        assert_eq!(
            WorkflowError::Transport("refused".into()).category(),
            ErrorCategory::Upstream
        );
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            WorkflowError::InvalidUrl("relative URL".into()).user_message().as_deref(),
            Some("Invalid URL format")
        );
        assert!(WorkflowError::EmptyContent.user_message().is_none());
    }
}
