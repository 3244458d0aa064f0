use ring::constant_time::verify_slices_are_equal;
use rocket::{State, post, put, http::Status, serde::json::Json};
use rocket::request::{FromRequest, Outcome, Request};
use rustrict::CensorStr;
use tracing::{debug, info, instrument, warn};
use shared::{
    validate_candidate_request, validate_position_request, validate_voter_request, Candidate,
    ChangeEvent, CreateCandidateRequest, CreatePositionRequest, Position, PositionId,
    RegisterVoterRequest, ResetResponse, ToggleRequest, Voter, VoterId,
};
use crate::{error::ApiError, routes::AppState, utils::parse_id};

pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

/// Request guard for administrator-only routes.
pub struct Admin;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Admin {
    type Error = &'static str;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let Some(state) = req.rocket().state::<AppState>() else {
            return Outcome::Error((Status::InternalServerError, "application state missing"));
        };

        match (state.admin_token.as_deref(), req.headers().get_one(ADMIN_TOKEN_HEADER)) {
            (Some(expected), Some(given))
                if verify_slices_are_equal(expected.as_bytes(), given.as_bytes()).is_ok() =>
            {
                debug!("Admin token validated");
                Outcome::Success(Admin)
            }
            _ => {
                warn!("Rejected admin request to {}", req.uri());
                Outcome::Error((Status::Unauthorized, "invalid admin token"))
            }
        }
    }
}

fn check_profanity(field: &str, value: &str) -> Result<(), ApiError> {
    if value.is_inappropriate() {
        return Err(ApiError::Inappropriate(format!("possible profanity in {}: {}", field, value)));
    }
    Ok(())
}

#[instrument(skip(_admin, state, request))]
#[put("/admin/voting", format = "json", data = "<request>")]
pub async fn set_voting(_admin: Admin, state: &State<AppState>, request: Json<ToggleRequest>) -> Result<Json<ToggleRequest>, ApiError> {
    state.settings.set_voting_enabled(request.enabled).await?;
    info!("Voting {}", if request.enabled { "enabled" } else { "disabled" });
    Ok(Json(request.into_inner()))
}

#[instrument(skip(_admin, state, request))]
#[post("/admin/positions", format = "json", data = "<request>")]
pub async fn create_position(_admin: Admin, state: &State<AppState>, request: Json<CreatePositionRequest>) -> Result<Json<Position>, ApiError> {
    validate_position_request(&request)?;
    check_profanity("position name", &request.name)?;
    let position = state.catalog.create_position(&request).await?;
    info!(position = %position.id, "Created position {}", position.name);
    Ok(Json(position))
}

#[instrument(skip(_admin, state, request))]
#[put("/admin/positions/<position>/open", format = "json", data = "<request>")]
pub async fn set_position_open(_admin: Admin, state: &State<AppState>, position: &str, request: Json<ToggleRequest>) -> Result<Json<ToggleRequest>, ApiError> {
    let position_id: PositionId = parse_id(position)?;
    if !state.catalog.set_position_open(position_id, request.enabled).await? {
        return Err(ApiError::NotFound("Position"));
    }
    info!(position = %position_id, open = request.enabled, "Position state changed");
    Ok(Json(request.into_inner()))
}

#[instrument(skip(_admin, state, request))]
#[post("/admin/positions/<position>/candidates", format = "json", data = "<request>")]
pub async fn add_candidate(_admin: Admin, state: &State<AppState>, position: &str, request: Json<CreateCandidateRequest>) -> Result<Json<Candidate>, ApiError> {
    let position_id: PositionId = parse_id(position)?;
    validate_candidate_request(&request)?;
    check_profanity("candidate name", &request.name)?;
    state.catalog.add_candidate(position_id, &request.name)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Position"))
}

#[instrument(skip(_admin, state, request))]
#[post("/admin/voters", format = "json", data = "<request>")]
pub async fn register_voter(_admin: Admin, state: &State<AppState>, request: Json<RegisterVoterRequest>) -> Result<Json<Voter>, ApiError> {
    validate_voter_request(&request)?;
    let voter = state.directory.register_voter(&request.department, request.eligible).await?;
    debug!(voter = %voter.id, "Registered voter");
    Ok(Json(voter))
}

#[instrument(skip(_admin, state, request))]
#[put("/admin/voters/<voter>/eligibility", format = "json", data = "<request>")]
pub async fn set_eligibility(_admin: Admin, state: &State<AppState>, voter: &str, request: Json<ToggleRequest>) -> Result<Json<ToggleRequest>, ApiError> {
    let voter_id: VoterId = parse_id(voter)?;
    if !state.directory.set_eligibility(voter_id, request.enabled).await? {
        return Err(ApiError::NotFound("Voter"));
    }
    Ok(Json(request.into_inner()))
}

/// Clears the whole ledger. Casts racing with a reset may land on either side
/// of it.
#[instrument(skip(_admin, state))]
#[post("/admin/reset")]
pub async fn reset_votes(_admin: Admin, state: &State<AppState>) -> Result<Json<ResetResponse>, ApiError> {
    let cleared = state.ledger.reset_all().await?;
    warn!("Ledger reset, {} votes cleared", cleared);
    state.notifier.publish(ChangeEvent::LedgerReset);
    Ok(Json(ResetResponse { cleared }))
}
