use std::collections::HashSet;
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::error;
use uuid::Uuid;
use shared::{
    CastError, CastVote, Candidate, CandidateId, CreatePositionRequest, Position, PositionId,
    TallyEntry, VoteRecord, Voter, VoterId,
};
use crate::{
    collaborators::{Catalog, Directory, Settings},
    ledger::VoteLedger,
};

/// Unique index on `votes (voter_id, position_id)`.
pub const VOTE_UNIQUE_CONSTRAINT: &str = "votes_voter_position_key";

/// Postgres-backed ledger and collaborators.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

fn storage_error(context: &str, e: sqlx::Error) -> CastError {
    error!("{}: {}", context, e);
    CastError::from(e)
}

/// The one storage failure that is a domain outcome rather than an outage.
fn map_insert_error(e: sqlx::Error) -> CastError {
    let duplicate = e.as_database_error().is_some_and(|db| {
        db.is_unique_violation() && db.constraint() == Some(VOTE_UNIQUE_CONSTRAINT)
    });
    if duplicate {
        CastError::DuplicateVote
    } else {
        storage_error("Failed to insert vote", e)
    }
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Seeds the voting switch on first start; an existing value wins.
    pub async fn ensure_settings(&self, voting_enabled: bool) -> Result<(), CastError> {
        sqlx::query(
            "INSERT INTO settings (id, voting_enabled) VALUES (1, $1)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(voting_enabled)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to seed settings", e))?;
        Ok(())
    }
}

#[rocket::async_trait]
impl VoteLedger for PgStore {
    async fn cast_vote(&self, vote: CastVote) -> Result<VoteRecord, CastError> {
        sqlx::query_as::<_, VoteRecord>(
            "INSERT INTO votes (id, voter_id, position_id, candidate_id)
             VALUES ($1, $2, $3, $4)
             RETURNING id, voter_id, position_id, candidate_id, cast_at",
        )
        .bind(Uuid::new_v4())
        .bind(vote.voter_id)
        .bind(vote.position_id)
        .bind(vote.candidate_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)
    }

    async fn has_voted(&self, voter: VoterId, position: PositionId) -> Result<bool, CastError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM votes WHERE voter_id = $1 AND position_id = $2)",
        )
        .bind(voter)
        .bind(position)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to check vote", e))
    }

    async fn votes_of(&self, voter: VoterId) -> Result<Vec<PositionId>, CastError> {
        sqlx::query_scalar::<_, PositionId>(
            "SELECT position_id FROM votes WHERE voter_id = $1 ORDER BY position_id",
        )
        .bind(voter)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list votes", e))
    }

    async fn tally(&self, position: PositionId) -> Result<Vec<TallyEntry>, CastError> {
        sqlx::query_as::<_, TallyEntry>(
            "SELECT candidate_id, COUNT(*) AS votes
             FROM votes WHERE position_id = $1
             GROUP BY candidate_id",
        )
        .bind(position)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to tally votes", e))
    }

    async fn voters_in(&self, cohort: &HashSet<VoterId>) -> Result<usize, CastError> {
        let ids: Vec<Uuid> = cohort.iter().map(VoterId::as_uuid).collect();
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT voter_id) FROM votes WHERE voter_id = ANY($1)",
        )
        .bind(ids)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to count participation", e))?;
        Ok(count.max(0) as usize)
    }

    async fn reset_all(&self) -> Result<u64, CastError> {
        let mut tx = self.pool.begin().await
            .map_err(|e| storage_error("Failed to start reset", e))?;

        let result = sqlx::query("DELETE FROM votes")
            .execute(&mut *tx)
            .await
            .map_err(|e| storage_error("Failed to clear votes", e))?;

        tx.commit().await
            .map_err(|e| storage_error("Failed to commit reset", e))?;

        Ok(result.rows_affected())
    }
}

#[rocket::async_trait]
impl Directory for PgStore {
    async fn voter(&self, id: VoterId) -> Result<Option<Voter>, CastError> {
        sqlx::query_as::<_, Voter>(
            "SELECT id, department, eligible, registered_at FROM voters WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to fetch voter", e))
    }

    async fn cohort_members(&self, department: &str) -> Result<HashSet<VoterId>, CastError> {
        let ids = sqlx::query_scalar::<_, VoterId>("SELECT id FROM voters WHERE department = $1")
            .bind(department)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to fetch cohort", e))?;
        Ok(ids.into_iter().collect())
    }

    async fn register_voter(&self, department: &str, eligible: bool) -> Result<Voter, CastError> {
        sqlx::query_as::<_, Voter>(
            "INSERT INTO voters (id, department, eligible) VALUES ($1, $2, $3)
             RETURNING id, department, eligible, registered_at",
        )
        .bind(VoterId::generate())
        .bind(department.trim())
        .bind(eligible)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to register voter", e))
    }

    async fn set_eligibility(&self, id: VoterId, eligible: bool) -> Result<bool, CastError> {
        let result = sqlx::query("UPDATE voters SET eligible = $2 WHERE id = $1")
            .bind(id)
            .bind(eligible)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to update eligibility", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[rocket::async_trait]
impl Catalog for PgStore {
    async fn position(&self, id: PositionId) -> Result<Option<Position>, CastError> {
        sqlx::query_as::<_, Position>(
            "SELECT id, name, is_open, opens_at, closes_at, created_at FROM positions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to fetch position", e))
    }

    async fn candidate(&self, id: CandidateId) -> Result<Option<Candidate>, CastError> {
        sqlx::query_as::<_, Candidate>("SELECT id, position_id, name FROM candidates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to fetch candidate", e))
    }

    async fn candidates_for(&self, position: PositionId) -> Result<Vec<Candidate>, CastError> {
        sqlx::query_as::<_, Candidate>(
            "SELECT id, position_id, name FROM candidates WHERE position_id = $1 ORDER BY name",
        )
        .bind(position)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to fetch candidates", e))
    }

    async fn create_position(&self, request: &CreatePositionRequest) -> Result<Position, CastError> {
        sqlx::query_as::<_, Position>(
            "INSERT INTO positions (id, name, is_open, opens_at, closes_at, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, name, is_open, opens_at, closes_at, created_at",
        )
        .bind(PositionId::generate())
        .bind(request.name.trim())
        .bind(request.is_open)
        .bind(request.opens_at)
        .bind(request.closes_at)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to create position", e))
    }

    async fn set_position_open(&self, id: PositionId, open: bool) -> Result<bool, CastError> {
        let result = sqlx::query("UPDATE positions SET is_open = $2 WHERE id = $1")
            .bind(id)
            .bind(open)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to update position", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_candidate(&self, position: PositionId, name: &str) -> Result<Option<Candidate>, CastError> {
        sqlx::query_as::<_, Candidate>(
            "INSERT INTO candidates (id, position_id, name)
             SELECT $1, p.id, $3 FROM positions p WHERE p.id = $2
             RETURNING id, position_id, name",
        )
        .bind(CandidateId::generate())
        .bind(position)
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to add candidate", e))
    }
}

#[rocket::async_trait]
impl Settings for PgStore {
    async fn is_voting_enabled(&self) -> Result<bool, CastError> {
        let enabled = sqlx::query_scalar::<_, bool>("SELECT voting_enabled FROM settings WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to read settings", e))?;
        Ok(enabled.unwrap_or(false))
    }

    async fn set_voting_enabled(&self, enabled: bool) -> Result<(), CastError> {
        sqlx::query(
            "INSERT INTO settings (id, voting_enabled) VALUES (1, $1)
             ON CONFLICT (id) DO UPDATE SET voting_enabled = EXCLUDED.voting_enabled",
        )
        .bind(enabled)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to update settings", e))?;
        Ok(())
    }
}
