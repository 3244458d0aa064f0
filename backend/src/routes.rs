use std::sync::Arc;
use rocket::{State, Shutdown, get, post, http::Status, serde::json::Json};
use rocket::response::stream::{Event, EventStream};
use rocket::tokio::select;
use rocket::tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, instrument};
use shared::{
    validate_cast_request, parse_cohort, CastVoteRequest, ClientInfo, Participation, PositionId,
    PositionResults, Tally, VoteRecord, VotedResponse, VoterId,
};
use crate::{
    aggregate,
    collaborators::{Catalog, Directory, Settings},
    config::Config,
    error::ApiError,
    guard::BallotGuard,
    ledger::VoteLedger,
    notify::Notifier,
    rate_limiter::RateLimiter,
    utils::parse_id,
};

pub struct AppState {
    pub guard: BallotGuard,
    pub ledger: Arc<dyn VoteLedger>,
    pub catalog: Arc<dyn Catalog>,
    pub directory: Arc<dyn Directory>,
    pub settings: Arc<dyn Settings>,
    pub notifier: Notifier,
    pub cast_limiter: RateLimiter,
    pub admin_token: Option<String>,
}

impl AppState {
    /// Wires one registry serving as directory, catalog and settings.
    pub fn new<R>(registry: Arc<R>, ledger: Arc<dyn VoteLedger>, config: &Config) -> Self
    where
        R: Directory + Catalog + Settings + 'static,
    {
        let settings: Arc<dyn Settings> = registry.clone();
        let catalog: Arc<dyn Catalog> = registry.clone();
        let directory: Arc<dyn Directory> = registry;
        let notifier = Notifier::new(config.event_buffer());

        Self {
            guard: BallotGuard::new(
                settings.clone(),
                catalog.clone(),
                directory.clone(),
                ledger.clone(),
                notifier.clone(),
            ),
            ledger,
            catalog,
            directory,
            settings,
            notifier,
            cast_limiter: RateLimiter::new(config.cast_rate_limit(), config.cast_rate_window_minutes()),
            admin_token: config.admin_token().map(str::to_string),
        }
    }
}

#[rocket::options("/<_..>")]
pub async fn all_options() -> Status {
    Status::Ok
}

#[instrument(skip(state, request, client))]
#[post("/ballots", format = "json", data = "<request>")]
pub async fn cast_vote(
    state: &State<AppState>,
    request: Json<CastVoteRequest>,
    client: ClientInfo,
) -> Result<Json<VoteRecord>, ApiError> {
    let vote = validate_cast_request(&request)?;

    let rate_limit_key = format!(
        "cast_vote:{}:{}:{}",
        client.fingerprint, vote.voter_id, vote.position_id,
    );
    state.cast_limiter.check(&rate_limit_key).map_err(|minutes| {
        ApiError::RateLimited(format!("Too many attempts. Please try again in {} minutes.", minutes))
    })?;

    let record = state.guard.attempt_cast_vote(vote).await?;
    info!(vote_id = %record.id, position = %record.position_id, "Ballot accepted");
    Ok(Json(record))
}

#[instrument(skip(state))]
#[get("/voters/<voter>/positions/<position>/voted")]
pub async fn has_voted(state: &State<AppState>, voter: &str, position: &str) -> Result<Json<VotedResponse>, ApiError> {
    let voter_id: VoterId = parse_id(voter)?;
    let position_id: PositionId = parse_id(position)?;
    let has_voted = state.ledger.has_voted(voter_id, position_id).await?;
    Ok(Json(VotedResponse { voter_id, position_id, has_voted }))
}

#[instrument(skip(state))]
#[get("/voters/<voter>/votes")]
pub async fn votes_of(state: &State<AppState>, voter: &str) -> Result<Json<Vec<PositionId>>, ApiError> {
    let voter_id: VoterId = parse_id(voter)?;
    Ok(Json(state.ledger.votes_of(voter_id).await?))
}

#[instrument(skip(state))]
#[get("/positions/<position>/tally")]
pub async fn get_tally(state: &State<AppState>, position: &str) -> Result<Json<Tally>, ApiError> {
    let position_id = parse_id(position)?;
    Ok(Json(aggregate::tally(state.ledger.as_ref(), position_id).await?))
}

#[instrument(skip(state))]
#[get("/positions/<position>/results")]
pub async fn get_results(state: &State<AppState>, position: &str) -> Result<Json<PositionResults>, ApiError> {
    let position_id = parse_id(position)?;
    aggregate::position_results(state.catalog.as_ref(), state.ledger.as_ref(), position_id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Position"))
}

#[instrument(skip(state, cohort))]
#[post("/participation", format = "json", data = "<cohort>")]
pub async fn get_participation(state: &State<AppState>, cohort: Json<Vec<String>>) -> Result<Json<Participation>, ApiError> {
    let cohort = parse_cohort(&cohort)?;
    Ok(Json(state.ledger.participation(&cohort).await?))
}

#[instrument(skip(state))]
#[get("/departments/<department>/participation")]
pub async fn department_participation(state: &State<AppState>, department: &str) -> Result<Json<Participation>, ApiError> {
    let participation = aggregate::department_participation(
        state.directory.as_ref(),
        state.ledger.as_ref(),
        department,
    )
    .await?;
    Ok(Json(participation))
}

/// Server-sent change events for live dashboards.
#[instrument(skip(state, shutdown))]
#[get("/events")]
pub fn events(state: &State<AppState>, mut shutdown: Shutdown) -> EventStream<impl rocket::futures::Stream<Item = Event>> {
    let mut receiver = state.notifier.subscribe();
    EventStream! {
        loop {
            let event = select! {
                message = receiver.recv() => match message {
                    Ok(event) => event,
                    Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(skipped)) => {
                        debug!("Event subscriber lagged, skipped {} events", skipped);
                        continue;
                    }
                },
                _ = &mut shutdown => break,
            };
            yield Event::json(&event);
        }
    }
}
