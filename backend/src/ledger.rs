use std::collections::HashSet;
use shared::{CastError, CastVote, Participation, PositionId, TallyEntry, VoteRecord, VoterId};

/// Sole owner of the vote records.
///
/// `cast_vote` must let the insert itself decide uniqueness of
/// `(voter, position)`: of any number of concurrent casts for one pair,
/// exactly one succeeds and the rest get `CastError::DuplicateVote`.
#[rocket::async_trait]
pub trait VoteLedger: Send + Sync {
    async fn cast_vote(&self, vote: CastVote) -> Result<VoteRecord, CastError>;

    async fn has_voted(&self, voter: VoterId, position: PositionId) -> Result<bool, CastError>;

    /// Positions the voter has a vote recorded for.
    async fn votes_of(&self, voter: VoterId) -> Result<Vec<PositionId>, CastError>;

    /// Snapshot of per-candidate counts. Zero-vote candidates may be absent.
    async fn tally(&self, position: PositionId) -> Result<Vec<TallyEntry>, CastError>;

    /// Number of distinct members of `cohort` with at least one vote.
    async fn voters_in(&self, cohort: &HashSet<VoterId>) -> Result<usize, CastError>;

    /// Clears every vote in one atomic step, returning how many were removed.
    async fn reset_all(&self) -> Result<u64, CastError>;

    async fn participation(&self, cohort: &HashSet<VoterId>) -> Result<Participation, CastError> {
        if cohort.is_empty() {
            return Ok(Participation::new(0, 0));
        }
        let voted = self.voters_in(cohort).await?;
        Ok(Participation::new(voted, cohort.len()))
    }
}
