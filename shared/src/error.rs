use serde::{Serialize, Deserialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    #[error("Invalid input provided")]
    InvalidInput,
    #[error("Resource not found")]
    NotFound,
    #[error("Operation not authorized")]
    Unauthorized,
    #[error("Resource conflict")]
    Conflict,
    #[error("Internal system error")]
    SystemError,
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("Voting closed")]
    VotingClosed,
    #[error("Voter not eligible")]
    NotEligible,
    #[error("Request failed integrity checks")]
    IntegrityViolation,
}

/// Outcome of a rejected vote-cast attempt.
///
/// Everything except `Persistence` is a terminal answer for the request and
/// must not be retried blindly.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CastError {
    #[error("Voting is currently closed")]
    VotingClosed,
    #[error("Position does not exist or is not open")]
    PositionUnavailable,
    #[error("Candidate does not stand for this position")]
    CandidateMismatch,
    #[error("Voter is not registered or not verified")]
    VoterNotEligible,
    #[error("A vote has already been cast for this position")]
    DuplicateVote,
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl CastError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CastError::Persistence(_))
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            CastError::VotingClosed => ErrorCode::VotingClosed,
            CastError::PositionUnavailable => ErrorCode::NotFound,
            CastError::CandidateMismatch => ErrorCode::IntegrityViolation,
            CastError::VoterNotEligible => ErrorCode::NotEligible,
            CastError::DuplicateVote => ErrorCode::Conflict,
            CastError::Persistence(_) => ErrorCode::SystemError,
        }
    }
}

#[cfg(feature = "backend")]
impl From<sqlx::Error> for CastError {
    fn from(e: sqlx::Error) -> Self {
        CastError::Persistence(e.to_string())
    }
}

/// Error body returned to HTTP clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default)]
    pub retryable: bool,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(details) = &self.details {
            write!(f, "{}: {} ({})", self.code, self.message, details)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            retryable: false,
        }
    }
}

impl From<&CastError> for Error {
    fn from(e: &CastError) -> Self {
        // Storage details stay in the server log.
        let message = match e {
            CastError::Persistence(_) => "Storage temporarily unavailable, please retry".to_string(),
            other => other.to_string(),
        };
        Self {
            code: e.code(),
            message,
            details: None,
            retryable: e.is_retryable(),
        }
    }
}

