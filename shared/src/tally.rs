//! Pure vote arithmetic shared by the ledger implementations and the results
//! pages.

use std::collections::HashMap;
use crate::models::{
    Candidate, CandidateId, CandidateResult, Position, PositionResults, TallyEntry, VoteRecord,
};

/// `voted / cohort_size` as a whole percentage, rounded half up.
///
/// An empty cohort is 0%, not an error.
pub fn participation_percent(voted: usize, cohort_size: usize) -> u8 {
    if cohort_size == 0 {
        return 0;
    }
    let voted = voted.min(cohort_size) as u64;
    let cohort_size = cohort_size as u64;
    ((voted * 100 + cohort_size / 2) / cohort_size) as u8
}

/// Counts votes per candidate. Candidates without votes are absent.
pub fn tally_from_votes<'a>(votes: impl IntoIterator<Item = &'a VoteRecord>) -> Vec<TallyEntry> {
    let mut counts: HashMap<CandidateId, i64> = HashMap::new();
    for vote in votes {
        *counts.entry(vote.candidate_id).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(candidate_id, votes)| TallyEntry { candidate_id, votes })
        .collect()
}

/// Joins a raw tally with the position's candidate list for display.
///
/// Every candidate appears, zero-vote ones included, ordered by votes
/// descending and then by name. Tally rows for candidates that are not in
/// `candidates` are dropped.
pub fn position_results(
    position: &Position,
    candidates: &[Candidate],
    tally: &[TallyEntry],
) -> PositionResults {
    let counts: HashMap<CandidateId, i64> = tally
        .iter()
        .map(|entry| (entry.candidate_id, entry.votes))
        .collect();

    let total_votes: i64 = candidates
        .iter()
        .filter(|c| c.position_id == position.id)
        .filter_map(|c| counts.get(&c.id))
        .sum();

    let mut rows: Vec<CandidateResult> = candidates
        .iter()
        .filter(|c| c.position_id == position.id)
        .map(|c| {
            let votes = counts.get(&c.id).copied().unwrap_or(0);
            CandidateResult {
                candidate_id: c.id,
                name: c.name.clone(),
                votes,
                share_percent: participation_percent(votes as usize, total_votes as usize),
            }
        })
        .collect();

    rows.sort_by(|a, b| b.votes.cmp(&a.votes).then_with(|| a.name.cmp(&b.name)));

    let leader = match rows.as_slice() {
        [first, second, ..] if first.votes > second.votes => Some(first.candidate_id),
        [only] if only.votes > 0 => Some(only.candidate_id),
        _ => None,
    };

    PositionResults {
        position_id: position.id,
        position_name: position.name.clone(),
        total_votes,
        candidates: rows,
        leader,
    }
}
