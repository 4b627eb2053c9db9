mod config;

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use gramalisis_api::auth::{self, AppState, AppStateInner};
use gramalisis_api::feed::EntryFeed;
use gramalisis_api::middleware::require_auth;
use gramalisis_api::{entries, profile, progress, stream};
use gramalisis_db::Database;
use gramalisis_progress::Catalog;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gramalisis=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.uses_default_secret() {
        warn!("GRAMALISIS_JWT_SECRET is not set; using the development secret");
    }

    let stages = match &config.stages_path {
        Some(path) => Catalog::load(path)?,
        None => Catalog::learning_stages(),
    };

    // Init database
    let db = Database::open(&config.db_path)?;

    let state: AppState = Arc::new(AppStateInner {
        db: Arc::new(db),
        jwt_secret: config.jwt_secret.clone(),
        feed: EntryFeed::new(),
        stages,
        levels: Catalog::achievement_levels(),
    });

    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Gramálisis server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/auth/password", put(auth::change_password))
        .route("/entries", get(entries::list_entries).post(entries::create_entry))
        .route("/entries/stream", get(stream::entry_stream))
        .route("/profile", get(profile::get_profile).put(profile::update_profile))
        .route("/progress", get(progress::get_progress))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
