//! Read-mostly services the ballot guard consults. The guard only calls the
//! query methods; the write methods back the admin routes.

use std::collections::HashSet;
use shared::{
    CastError, Candidate, CandidateId, CreatePositionRequest, Position, PositionId, Voter, VoterId,
};

#[rocket::async_trait]
pub trait Directory: Send + Sync {
    async fn voter(&self, id: VoterId) -> Result<Option<Voter>, CastError>;

    async fn is_eligible(&self, id: VoterId) -> Result<bool, CastError> {
        Ok(self.voter(id).await?.is_some_and(|v| v.eligible))
    }

    async fn cohort_of(&self, id: VoterId) -> Result<Option<String>, CastError> {
        Ok(self.voter(id).await?.map(|v| v.department))
    }

    async fn cohort_members(&self, department: &str) -> Result<HashSet<VoterId>, CastError>;

    async fn register_voter(&self, department: &str, eligible: bool) -> Result<Voter, CastError>;

    /// Returns `false` if the voter does not exist.
    async fn set_eligibility(&self, id: VoterId, eligible: bool) -> Result<bool, CastError>;
}

#[rocket::async_trait]
pub trait Catalog: Send + Sync {
    async fn position(&self, id: PositionId) -> Result<Option<Position>, CastError>;

    async fn candidate(&self, id: CandidateId) -> Result<Option<Candidate>, CastError>;

    async fn candidates_for(&self, position: PositionId) -> Result<Vec<Candidate>, CastError>;

    async fn candidate_belongs_to_position(
        &self,
        candidate: CandidateId,
        position: PositionId,
    ) -> Result<bool, CastError> {
        Ok(self.candidate(candidate).await?.is_some_and(|c| c.position_id == position))
    }

    async fn create_position(&self, request: &CreatePositionRequest) -> Result<Position, CastError>;

    /// Returns `false` if the position does not exist.
    async fn set_position_open(&self, id: PositionId, open: bool) -> Result<bool, CastError>;

    /// Returns `None` if the position does not exist.
    async fn add_candidate(&self, position: PositionId, name: &str) -> Result<Option<Candidate>, CastError>;
}

#[rocket::async_trait]
pub trait Settings: Send + Sync {
    async fn is_voting_enabled(&self) -> Result<bool, CastError>;

    async fn set_voting_enabled(&self, enabled: bool) -> Result<(), CastError>;
}
