use std::sync::Arc;
use std::time::{Instant, SystemTime};

use rps_algo::MlpBackend;

use crate::game::{GameConfig, GameEngine, GlobalStats, SessionStore};

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    engine: Arc<GameEngine>,
}

impl AppState {
    pub fn new(engine: Arc<GameEngine>) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            engine,
        }
    }

    /// Engine backed by the MLP classifier.
    pub fn create_engine(
        config: GameConfig,
        store: SessionStore,
        stats: Arc<GlobalStats>,
    ) -> Arc<GameEngine> {
        let backend = Arc::new(MlpBackend::new(config.rng_seed));
        Arc::new(GameEngine::new(config, backend, store, stats))
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn engine(&self) -> Arc<GameEngine> {
        Arc::clone(&self.engine)
    }
}
