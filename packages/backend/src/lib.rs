pub mod config;
pub mod game;
pub mod logging;
pub mod response;
pub mod routes;
pub mod state;

use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::game::{GameConfig, GlobalStats, SessionStore};
use crate::state::AppState;

/// Router with the HTTP layers applied.
pub fn build_router(state: AppState) -> axum::Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// App wired from the environment: `RPS_DATA_DIR` selects the store and
/// persisted global stats are restored from it.
pub async fn create_app() -> axum::Router {
    let config = config::Config::from_env();
    let state = create_state(&config, GameConfig::from_env()).await;
    build_router(state)
}

pub async fn create_state(config: &config::Config, game_config: GameConfig) -> AppState {
    let store = SessionStore::from_data_dir(config.data_dir.clone());
    let stats = match store.load_global().await {
        Some(snapshot) => {
            tracing::info!(
                total_games = snapshot.total_games,
                training_cycles = snapshot.training_cycles,
                "global stats restored"
            );
            GlobalStats::from_snapshot(snapshot)
        }
        None => GlobalStats::new(),
    };

    let engine = AppState::create_engine(game_config, store, Arc::new(stats));
    AppState::new(engine)
}
