//! Error kinds for the mutation flows.
//!
//! `ValidationError` never leaves the client: it is raised before any gateway
//! call. `GatewayError` is what a dispatched mutation can resolve to; every
//! variant is recoverable by retrying or navigating away.

use std::time::Duration;

use thiserror::Error;

/// Draft rejected before dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("comment cannot be empty")]
    EmptyBody,
    #[error("comment is too long (max {max} characters)")]
    BodyTooLong { max: usize },
    #[error("rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(i64),
}

/// Failure reported by a Mutation Gateway call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// No session, or the session expired. The UI prompts for sign-in.
    #[error("sign in to continue")]
    Unauthenticated,
    /// The call did not settle within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("{0} not found")]
    NotFound(String),
    /// Network/storage failure; the user may retry.
    #[error("temporary failure: {0}")]
    Transient(String),
}

impl GatewayError {
    /// Whether offering a retry affordance makes sense for this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Timeout(_) | GatewayError::Transient(_))
    }
}

impl From<tokio_rusqlite::Error> for GatewayError {
    fn from(e: tokio_rusqlite::Error) -> Self {
        GatewayError::Transient(e.to_string())
    }
}

/// Email-OTP sign-in failures.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email address")]
    InvalidEmail,
    #[error("invalid verification code")]
    InvalidCode,
    #[error("verification code has expired")]
    CodeExpired,
    #[error("too many wrong codes; request a new one")]
    TooManyAttempts,
    #[error("database error: {0}")]
    Db(#[from] tokio_rusqlite::Error),
    #[error("failed to send email: {0}")]
    Mail(#[from] crate::mail::MailError),
}
