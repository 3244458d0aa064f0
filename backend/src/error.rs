use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::Json;
use thiserror::Error;
use tracing::{error, warn};
use shared::{CastError, ErrorCode, ValidationError};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Cast(#[from] CastError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Invalid identifier")]
    InvalidId,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Inappropriate content: {0}")]
    Inappropriate(String),
    #[error("{0}")]
    RateLimited(String),
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::Cast(e) => match e {
                CastError::VotingClosed => Status::Forbidden,
                CastError::PositionUnavailable => Status::NotFound,
                CastError::CandidateMismatch => Status::BadRequest,
                CastError::VoterNotEligible => Status::Forbidden,
                CastError::DuplicateVote => Status::Conflict,
                CastError::Persistence(_) => Status::ServiceUnavailable,
            },
            ApiError::Validation(_) => Status::BadRequest,
            ApiError::InvalidId => Status::BadRequest,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::Inappropriate(_) => Status::BadRequest,
            ApiError::RateLimited(_) => Status::TooManyRequests,
        }
    }

    fn body(&self) -> shared::Error {
        match self {
            ApiError::Cast(e) => shared::Error::from(e),
            ApiError::Validation(e) => shared::Error::new(ErrorCode::InvalidInput, e.to_string()),
            ApiError::InvalidId => shared::Error::new(ErrorCode::InvalidInput, self.to_string()),
            ApiError::NotFound(_) => shared::Error::new(ErrorCode::NotFound, self.to_string()),
            ApiError::Inappropriate(_) => shared::Error::new(ErrorCode::InvalidInput, self.to_string()),
            ApiError::RateLimited(_) => shared::Error::new(ErrorCode::RateLimited, self.to_string()),
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for ApiError {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        match &self {
            ApiError::Cast(CastError::Persistence(detail)) => error!("Storage failure on {}: {}", req.uri(), detail),
            ApiError::Cast(CastError::CandidateMismatch) => warn!("Integrity check failed on {}", req.uri()),
            _ => {}
        }

        rocket::Response::build_from(Json(self.body()).respond_to(req)?)
            .status(status)
            .ok()
    }
}
