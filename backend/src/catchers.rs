use rocket::{Request, catch, serde::json::Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorMessage {
    error: String,
    status: u16,
}

fn message(error: &str, status: u16) -> Json<ErrorMessage> {
    Json(ErrorMessage { error: error.into(), status })
}

#[catch(400)]
pub fn bad_request(_req: &Request) -> Json<ErrorMessage> {
    message("Invalid request parameters.", 400)
}

#[catch(401)]
pub fn unauthorized(_req: &Request) -> Json<ErrorMessage> {
    message("Administrator credentials are required.", 401)
}

#[catch(403)]
pub fn forbidden(_req: &Request) -> Json<ErrorMessage> {
    message("Access forbidden.", 403)
}

#[catch(404)]
pub fn not_found(_req: &Request) -> Json<ErrorMessage> {
    message("The requested resource was not found.", 404)
}

#[catch(422)]
pub fn unprocessable(req: &Request) -> Json<ErrorMessage> {
    let error = match req.uri().path().as_str() {
        "/api/ballots" => "Ballot must be a JSON object with voterId, positionId and candidateId.",
        _ => "Request body could not be parsed.",
    };
    message(error, 422)
}

#[catch(429)]
pub fn too_many_requests(_req: &Request) -> Json<ErrorMessage> {
    message("Rate limit exceeded. Please wait before trying again.", 429)
}

#[catch(500)]
pub fn internal_error(_req: &Request) -> Json<ErrorMessage> {
    message("An internal server error occurred.", 500)
}
