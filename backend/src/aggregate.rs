//! Read path for dashboards and result pages. Everything is computed from the
//! ledger at query time; nothing here is cached.

use shared::{CastError, Participation, PositionId, PositionResults, Tally};
use crate::{
    collaborators::{Catalog, Directory},
    ledger::VoteLedger,
};

pub async fn tally(ledger: &dyn VoteLedger, position: PositionId) -> Result<Tally, CastError> {
    Ok(Tally {
        position_id: position,
        entries: ledger.tally(position).await?,
    })
}

/// Tally joined with the catalog's candidate list. `None` if the position
/// does not exist.
pub async fn position_results(
    catalog: &dyn Catalog,
    ledger: &dyn VoteLedger,
    position: PositionId,
) -> Result<Option<PositionResults>, CastError> {
    let Some(position) = catalog.position(position).await? else {
        return Ok(None);
    };
    let candidates = catalog.candidates_for(position.id).await?;
    let entries = ledger.tally(position.id).await?;
    Ok(Some(shared::position_results(&position, &candidates, &entries)))
}

pub async fn department_participation(
    directory: &dyn Directory,
    ledger: &dyn VoteLedger,
    department: &str,
) -> Result<Participation, CastError> {
    let cohort = directory.cohort_members(department).await?;
    ledger.participation(&cohort).await
}
