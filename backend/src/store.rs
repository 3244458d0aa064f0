//! In-process implementations of the ledger and its collaborators.

use std::collections::hash_map::{DefaultHasher, Entry};
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, RwLock};
use time::OffsetDateTime;
use tracing::error;
use uuid::Uuid;
use shared::{
    tally_from_votes, CastError, CastVote, Candidate, CandidateId, CreatePositionRequest, Position,
    PositionId, TallyEntry, VoteRecord, Voter, VoterId,
};
use crate::{
    collaborators::{Catalog, Directory, Settings},
    ledger::VoteLedger,
};

const SHARD_COUNT: usize = 16;

type VoteKey = (VoterId, PositionId);
type VoteShard = HashMap<VoteKey, VoteRecord>;

fn poisoned<T>(_: T) -> CastError {
    error!("Ledger lock poisoned");
    CastError::Persistence("ledger lock poisoned".into())
}

/// Vote ledger held in memory.
///
/// Votes are sharded by `(voter, position)` so casts for different pairs do
/// not contend. The shard entry insert is the uniqueness arbiter. Every
/// operation holds `gate` for reading; `reset_all` takes it for writing, so
/// no reader sees a half-cleared ledger.
pub struct MemoryLedger {
    gate: RwLock<()>,
    shards: Vec<Mutex<VoteShard>>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            gate: RwLock::new(()),
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    fn shard(&self, key: &VoteKey) -> Result<MutexGuard<'_, VoteShard>, CastError> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let index = (hasher.finish() as usize) % self.shards.len();
        self.shards[index].lock().map_err(poisoned)
    }

    /// Visits every stored vote while holding the gate.
    fn scan<F: FnMut(&VoteRecord)>(&self, mut visit: F) -> Result<(), CastError> {
        let _gate = self.gate.read().map_err(poisoned)?;
        for shard in &self.shards {
            let shard = shard.lock().map_err(poisoned)?;
            shard.values().for_each(&mut visit);
        }
        Ok(())
    }

    pub fn len(&self) -> Result<usize, CastError> {
        let mut count = 0;
        self.scan(|_| count += 1)?;
        Ok(count)
    }

    pub fn is_empty(&self) -> Result<bool, CastError> {
        Ok(self.len()? == 0)
    }
}

#[rocket::async_trait]
impl VoteLedger for MemoryLedger {
    async fn cast_vote(&self, vote: CastVote) -> Result<VoteRecord, CastError> {
        let _gate = self.gate.read().map_err(poisoned)?;
        let key = (vote.voter_id, vote.position_id);
        let mut shard = self.shard(&key)?;
        match shard.entry(key) {
            Entry::Occupied(_) => Err(CastError::DuplicateVote),
            Entry::Vacant(slot) => {
                let record = VoteRecord {
                    id: Uuid::new_v4(),
                    voter_id: vote.voter_id,
                    position_id: vote.position_id,
                    candidate_id: vote.candidate_id,
                    cast_at: OffsetDateTime::now_utc(),
                };
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn has_voted(&self, voter: VoterId, position: PositionId) -> Result<bool, CastError> {
        let _gate = self.gate.read().map_err(poisoned)?;
        let key = (voter, position);
        Ok(self.shard(&key)?.contains_key(&key))
    }

    async fn votes_of(&self, voter: VoterId) -> Result<Vec<PositionId>, CastError> {
        let mut positions = Vec::new();
        self.scan(|vote| {
            if vote.voter_id == voter {
                positions.push(vote.position_id);
            }
        })?;
        positions.sort();
        Ok(positions)
    }

    async fn tally(&self, position: PositionId) -> Result<Vec<TallyEntry>, CastError> {
        let mut votes = Vec::new();
        self.scan(|vote| {
            if vote.position_id == position {
                votes.push(vote.clone());
            }
        })?;
        Ok(tally_from_votes(&votes))
    }

    async fn voters_in(&self, cohort: &HashSet<VoterId>) -> Result<usize, CastError> {
        let mut voted = HashSet::new();
        self.scan(|vote| {
            if cohort.contains(&vote.voter_id) {
                voted.insert(vote.voter_id);
            }
        })?;
        Ok(voted.len())
    }

    async fn reset_all(&self) -> Result<u64, CastError> {
        let _gate = self.gate.write().map_err(poisoned)?;
        let mut cleared = 0;
        for shard in &self.shards {
            let mut shard = shard.lock().map_err(poisoned)?;
            cleared += shard.len() as u64;
            shard.clear();
        }
        Ok(cleared)
    }
}

/// Directory, catalog and settings held in memory.
#[derive(Default)]
pub struct MemoryRegistry {
    voting_enabled: AtomicBool,
    voters: RwLock<HashMap<VoterId, Voter>>,
    positions: RwLock<HashMap<PositionId, Position>>,
    candidates: RwLock<HashMap<CandidateId, Candidate>>,
}

impl MemoryRegistry {
    pub fn new(voting_enabled: bool) -> Self {
        Self {
            voting_enabled: AtomicBool::new(voting_enabled),
            ..Self::default()
        }
    }
}

#[rocket::async_trait]
impl Directory for MemoryRegistry {
    async fn voter(&self, id: VoterId) -> Result<Option<Voter>, CastError> {
        Ok(self.voters.read().map_err(poisoned)?.get(&id).cloned())
    }

    async fn cohort_members(&self, department: &str) -> Result<HashSet<VoterId>, CastError> {
        Ok(self
            .voters
            .read()
            .map_err(poisoned)?
            .values()
            .filter(|v| v.department == department)
            .map(|v| v.id)
            .collect())
    }

    async fn register_voter(&self, department: &str, eligible: bool) -> Result<Voter, CastError> {
        let voter = Voter {
            id: VoterId::generate(),
            department: department.trim().to_string(),
            eligible,
            registered_at: OffsetDateTime::now_utc(),
        };
        self.voters.write().map_err(poisoned)?.insert(voter.id, voter.clone());
        Ok(voter)
    }

    async fn set_eligibility(&self, id: VoterId, eligible: bool) -> Result<bool, CastError> {
        let mut voters = self.voters.write().map_err(poisoned)?;
        Ok(voters.get_mut(&id).map(|v| v.eligible = eligible).is_some())
    }
}

#[rocket::async_trait]
impl Catalog for MemoryRegistry {
    async fn position(&self, id: PositionId) -> Result<Option<Position>, CastError> {
        Ok(self.positions.read().map_err(poisoned)?.get(&id).cloned())
    }

    async fn candidate(&self, id: CandidateId) -> Result<Option<Candidate>, CastError> {
        Ok(self.candidates.read().map_err(poisoned)?.get(&id).cloned())
    }

    async fn candidates_for(&self, position: PositionId) -> Result<Vec<Candidate>, CastError> {
        let mut candidates: Vec<_> = self
            .candidates
            .read()
            .map_err(poisoned)?
            .values()
            .filter(|c| c.position_id == position)
            .cloned()
            .collect();
        candidates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(candidates)
    }

    async fn create_position(&self, request: &CreatePositionRequest) -> Result<Position, CastError> {
        let position = Position {
            id: PositionId::generate(),
            name: request.name.trim().to_string(),
            is_open: request.is_open,
            opens_at: request.opens_at,
            closes_at: request.closes_at,
            created_at: OffsetDateTime::now_utc(),
        };
        self.positions.write().map_err(poisoned)?.insert(position.id, position.clone());
        Ok(position)
    }

    async fn set_position_open(&self, id: PositionId, open: bool) -> Result<bool, CastError> {
        let mut positions = self.positions.write().map_err(poisoned)?;
        Ok(positions.get_mut(&id).map(|p| p.is_open = open).is_some())
    }

    async fn add_candidate(&self, position: PositionId, name: &str) -> Result<Option<Candidate>, CastError> {
        if !self.positions.read().map_err(poisoned)?.contains_key(&position) {
            return Ok(None);
        }
        let candidate = Candidate {
            id: CandidateId::generate(),
            position_id: position,
            name: name.trim().to_string(),
        };
        self.candidates.write().map_err(poisoned)?.insert(candidate.id, candidate.clone());
        Ok(Some(candidate))
    }
}

#[rocket::async_trait]
impl Settings for MemoryRegistry {
    async fn is_voting_enabled(&self) -> Result<bool, CastError> {
        Ok(self.voting_enabled.load(Ordering::SeqCst))
    }

    async fn set_voting_enabled(&self, enabled: bool) -> Result<(), CastError> {
        self.voting_enabled.store(enabled, Ordering::SeqCst);
        Ok(())
    }
}
