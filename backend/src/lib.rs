pub mod admin;
pub mod aggregate;
pub mod catchers;
pub mod collaborators;
pub mod config;
pub mod cors;
pub mod error;
pub mod guard;
pub mod ledger;
pub mod notify;
pub mod queries;
pub mod rate_limiter;
pub mod routes;
pub mod store;
pub mod utils;

use rocket::{Build, Rocket};
use crate::{config::Config, cors::CORS, routes::AppState};

/// Assembles the HTTP service around an already wired state.
pub fn build(state: AppState, config: &Config) -> Rocket<Build> {
    let figment = match config.trusted_ip_header() {
        Some(header) => rocket::Config::figment().merge(("ip_header", header)),
        None => rocket::Config::figment().merge(("ip_header", false)),
    };

    rocket::custom(figment)
        .attach(CORS::new(config.allowed_origin()))
        .manage(state)
        .mount(
            "/api",
            rocket::routes![
                routes::cast_vote,
                routes::has_voted,
                routes::votes_of,
                routes::get_tally,
                routes::get_results,
                routes::get_participation,
                routes::department_participation,
                routes::events,
                routes::all_options,
                admin::set_voting,
                admin::create_position,
                admin::set_position_open,
                admin::add_candidate,
                admin::register_voter,
                admin::set_eligibility,
                admin::reset_votes,
            ],
        )
        .register(
            "/",
            rocket::catchers![
                catchers::bad_request,
                catchers::unauthorized,
                catchers::forbidden,
                catchers::not_found,
                catchers::unprocessable,
                catchers::too_many_requests,
                catchers::internal_error,
            ],
        )
}


#[cfg(test)]
mod pg_tests;
