use std::sync::Arc;

use rps_backend::config::Config;
use rps_backend::game::{GameConfig, GameEngine};
use rps_backend::logging::init_tracing;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = init_tracing(&config.log_level);

    let game_config = GameConfig::from_env();
    tracing::info!(
        window_size = game_config.window_size,
        retrain_interval = game_config.retrain_interval,
        exploration_rate = game_config.exploration_rate,
        durable = config.data_dir.is_some(),
        "game configuration loaded"
    );

    let state = rps_backend::create_state(&config, game_config).await;
    let engine = state.engine();
    let cleanup = tokio::spawn(cleanup_loop(Arc::clone(&engine), config.clone()));

    let app = rps_backend::build_router(state);
    let addr = config.bind_addr();

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind listener");
            return;
        }
    };
    tracing::info!(%addr, "rps-backend listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!("HTTP server stopped, initiating graceful shutdown sequence");
    cleanup.abort();
    let saved = engine.flush().await;
    tracing::info!(saved, "Graceful shutdown complete");
}

async fn cleanup_loop(engine: Arc<GameEngine>, config: Config) {
    let max_idle_ms = i64::try_from(config.session_idle_ttl.as_millis()).unwrap_or(i64::MAX);
    let mut interval = tokio::time::interval(config.cleanup_interval);
    // first tick completes immediately
    interval.tick().await;
    loop {
        interval.tick().await;
        let evicted = engine.evict_idle_sessions(max_idle_ms).await;
        if evicted > 0 {
            let remaining = engine.session_count().await;
            tracing::debug!(evicted, remaining, "idle session sweep");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
