use std::sync::Arc;
use ballot_backend::{config::Config, queries::PgStore, routes::AppState};
use shuttle_runtime::CustomError;
use sqlx::PgPool;
use tracing::info;

#[shuttle_runtime::main]
async fn rocket(
    #[shuttle_shared_db::Postgres] pool: PgPool,
    #[shuttle_runtime::Secrets] secret_store: shuttle_runtime::SecretStore,
) -> shuttle_rocket::ShuttleRocket {
    info!("🗳️ Starting campus election server");

    let config = Config::from_secrets(&secret_store);

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(CustomError::new)?;

    info!("📋 Migrations complete");

    let store = Arc::new(PgStore::new(pool));
    store
        .ensure_settings(config.voting_enabled())
        .await
        .map_err(CustomError::new)?;

    let state = AppState::new(store.clone(), store, &config);
    let rocket = ballot_backend::build(state, &config);

    Ok(rocket.into())
}
