use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, instrument, warn};
use shared::{CastError, CastVote, ChangeEvent, VoteRecord};
use crate::{
    collaborators::{Catalog, Directory, Settings},
    ledger::VoteLedger,
    notify::Notifier,
};

/// Gate in front of the ledger. Holds no state of its own; every decision is
/// made from the injected collaborators.
#[derive(Clone)]
pub struct BallotGuard {
    settings: Arc<dyn Settings>,
    catalog: Arc<dyn Catalog>,
    directory: Arc<dyn Directory>,
    ledger: Arc<dyn VoteLedger>,
    notifier: Notifier,
}

impl BallotGuard {
    pub fn new(
        settings: Arc<dyn Settings>,
        catalog: Arc<dyn Catalog>,
        directory: Arc<dyn Directory>,
        ledger: Arc<dyn VoteLedger>,
        notifier: Notifier,
    ) -> Self {
        Self { settings, catalog, directory, ledger, notifier }
    }

    pub async fn attempt_cast_vote(&self, vote: CastVote) -> Result<VoteRecord, CastError> {
        self.attempt_cast_vote_at(vote, OffsetDateTime::now_utc()).await
    }

    /// Checks run in a fixed order and stop at the first failure.
    #[instrument(skip(self, now), fields(voter = %vote.voter_id, position = %vote.position_id))]
    pub async fn attempt_cast_vote_at(&self, vote: CastVote, now: OffsetDateTime) -> Result<VoteRecord, CastError> {
        if !self.settings.is_voting_enabled().await? {
            return Err(CastError::VotingClosed);
        }

        let position = self.catalog.position(vote.position_id).await?;
        if !position.is_some_and(|p| p.is_accepting_votes(now)) {
            return Err(CastError::PositionUnavailable);
        }

        if !self.catalog.candidate_belongs_to_position(vote.candidate_id, vote.position_id).await? {
            warn!(candidate = %vote.candidate_id, "Candidate does not belong to position, possible tampered request");
            return Err(CastError::CandidateMismatch);
        }

        if !self.directory.is_eligible(vote.voter_id).await? {
            return Err(CastError::VoterNotEligible);
        }

        // Cheap early answer for the common resubmission; the insert below
        // still decides races.
        if self.ledger.has_voted(vote.voter_id, vote.position_id).await? {
            return Err(CastError::DuplicateVote);
        }

        let record = self.ledger.cast_vote(vote).await?;
        debug!(vote_id = %record.id, "Vote recorded");

        self.notifier.publish(ChangeEvent::TallyChanged { position_id: vote.position_id });
        Ok(record)
    }
}
