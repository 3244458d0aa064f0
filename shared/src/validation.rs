use std::collections::HashSet;
use crate::models::{
    CastVote, CastVoteRequest, CreateCandidateRequest, CreatePositionRequest, RegisterVoterRequest,
    VoterId,
};

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_DEPARTMENT_LENGTH: usize = 60;
pub const MAX_COHORT_SIZE: usize = 20_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Invalid identifier for {field}: {value}")]
    InvalidId { field: &'static str, value: String },
    #[error("Name must not be empty")]
    EmptyName,
    #[error("Name exceeds maximum length of {MAX_NAME_LENGTH}")]
    NameTooLong,
    #[error("Department must not be empty")]
    EmptyDepartment,
    #[error("Department exceeds maximum length of {MAX_DEPARTMENT_LENGTH}")]
    DepartmentTooLong,
    #[error("Voting window must close after it opens")]
    InvalidWindow,
    #[error("Cohort exceeds maximum size of {MAX_COHORT_SIZE}")]
    CohortTooLarge,
}

fn parse_field<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    value.parse().map_err(|_| ValidationError::InvalidId {
        field,
        value: value.to_string(),
    })
}

pub fn validate_cast_request(request: &CastVoteRequest) -> Result<CastVote, ValidationError> {
    Ok(CastVote {
        voter_id: parse_field("voterId", &request.voter_id)?,
        position_id: parse_field("positionId", &request.position_id)?,
        candidate_id: parse_field("candidateId", &request.candidate_id)?,
    })
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() { return Err(ValidationError::EmptyName); }
    if name.chars().count() > MAX_NAME_LENGTH { return Err(ValidationError::NameTooLong); }
    Ok(())
}

pub fn validate_position_request(request: &CreatePositionRequest) -> Result<(), ValidationError> {
    validate_name(&request.name)?;
    if let (Some(opens), Some(closes)) = (request.opens_at, request.closes_at) {
        if closes <= opens { return Err(ValidationError::InvalidWindow); }
    }
    Ok(())
}

pub fn validate_candidate_request(request: &CreateCandidateRequest) -> Result<(), ValidationError> {
    validate_name(&request.name)
}

pub fn validate_voter_request(request: &RegisterVoterRequest) -> Result<(), ValidationError> {
    let department = request.department.trim();
    if department.is_empty() { return Err(ValidationError::EmptyDepartment); }
    if department.chars().count() > MAX_DEPARTMENT_LENGTH { return Err(ValidationError::DepartmentTooLong); }
    Ok(())
}

/// Parses a cohort listing. Duplicate ids collapse into one member.
pub fn parse_cohort(ids: &[String]) -> Result<HashSet<VoterId>, ValidationError> {
    if ids.len() > MAX_COHORT_SIZE { return Err(ValidationError::CohortTooLarge); }
    ids.iter().map(|id| parse_field("voterId", id)).collect()
}
