use std::collections::HashMap;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::{Mutex, RwLock};

use rps_algo::{
    encode_window, judge, random_move, select_ai_move, ClassifierBackend, ClassifierBlob,
    Exploration, Move, MoveClassifier, Prediction, Round,
};

use crate::game::config::{ExplorationPolicy, GameConfig};
use crate::game::persistence::SessionStore;
use crate::game::stats::{GlobalStats, GlobalStatsSnapshot};
use crate::game::training::retrain_session;
use crate::game::types::*;

pub type SessionHandle = Arc<Mutex<Session>>;

pub struct GameEngine {
    config: Arc<GameConfig>,
    backend: Arc<dyn ClassifierBackend>,
    store: Arc<SessionStore>,
    stats: Arc<GlobalStats>,
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
    /// Serializes snapshot+write of the global stats file
    global_writer: Arc<Mutex<()>>,
    rng: parking_lot::Mutex<ChaCha8Rng>,
}

impl GameEngine {
    pub fn new(
        config: GameConfig,
        backend: Arc<dyn ClassifierBackend>,
        store: SessionStore,
        stats: Arc<GlobalStats>,
    ) -> Self {
        let config = config.sanitized();
        let rng = match config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Self {
            config: Arc::new(config),
            backend,
            store: Arc::new(store),
            stats,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            global_writer: Arc::new(Mutex::new(())),
            rng: parking_lot::Mutex::new(rng),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    // ==================== Operations ====================

    /// Get-or-create. Returns the view and whether a new session was created.
    pub async fn create_session(
        &self,
        requested_id: Option<String>,
    ) -> Result<(SessionView, bool), EngineError> {
        let id = requested_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        if let Some(handle) = self.lookup(&id).await? {
            let session = handle.lock().await;
            return Ok((session.view(), false));
        }

        let classifier = self.backend.construct(&self.config.architecture());
        let session = Session::new(id.clone(), classifier, now_ms());
        let (handle, inserted) = self.insert_if_absent(id.clone(), session).await;
        if inserted {
            self.stats.session_created();
            tracing::info!(session_id = %id, "session created");
        }

        let (view, persisted) = {
            let session = handle.lock().await;
            let durable = inserted && self.store.is_durable();
            (session.view(), durable.then(|| session.to_persisted()))
        };
        if let Some(persisted) = persisted {
            self.persist(persisted).await;
        }
        Ok((view, inserted))
    }

    pub async fn play_round(
        &self,
        session_id: &str,
        request: PlayRequest,
    ) -> Result<PlayOutcome, EngineError> {
        let handle = self
            .lookup(session_id)
            .await?
            .ok_or_else(|| EngineError::UnknownSession(session_id.to_string()))?;
        let mut session = handle.lock_owned().await;

        if let Some(entries) = request.history {
            self.seed_history(&mut session, &entries);
        }

        let (prediction, ai_move) = self.choose_ai_move(&session);
        let outcome = judge(request.human_move, ai_move);
        let now = now_ms();
        let sequence_number = session.history.len() as u64 + 1;

        session.history.push(Round {
            human_move: request.human_move,
            ai_move,
            outcome,
            sequence_number,
            timestamp: now,
        });
        session.stats.record(outcome);
        session.last_updated = now;
        self.stats.record_round(outcome);

        let retraining = self.config.should_retrain(session.history.len());
        let training_cycles = session.training_cycles;

        // The guard moves into the task: later calls on this session queue
        // until retraining and persistence are done.
        let config = Arc::clone(&self.config);
        let writer = self.writer();
        tokio::spawn(async move {
            if retraining {
                match retrain_session(&config, &mut session).await {
                    Ok(report) => {
                        writer.stats.record_training_cycle();
                        tracing::info!(
                            session_id = %session.id,
                            training_cycles = session.training_cycles,
                            samples = report.samples,
                            final_loss = report.final_loss,
                            "classifier retrained"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            session_id = %session.id,
                            "retraining failed, keeping previous classifier"
                        );
                    }
                }
            }
            if writer.store.is_durable() {
                let persisted = session.to_persisted();
                writer.save(persisted).await;
            }
        });

        Ok(PlayOutcome {
            ai_move,
            outcome,
            prediction,
            sequence_number,
            retraining,
            training_cycles,
        })
    }

    pub async fn session_view(&self, session_id: &str) -> Result<SessionView, EngineError> {
        let handle = self.require(session_id).await?;
        let session = handle.lock().await;
        Ok(session.view())
    }

    pub async fn classifier_blob(&self, session_id: &str) -> Result<ClassifierBlob, EngineError> {
        let handle = self.require(session_id).await?;
        let session = handle.lock().await;
        Ok(session.classifier.to_blob()?)
    }

    pub fn global_stats(&self) -> GlobalStatsSnapshot {
        self.stats.snapshot()
    }

    /// Persist and drop sessions idle for longer than `max_idle_ms`. Sessions
    /// are only evicted when the store can bring them back.
    pub async fn evict_idle_sessions(&self, max_idle_ms: i64) -> usize {
        if !self.store.is_durable() {
            return 0;
        }

        let now = now_ms();
        let mut evicted = 0;
        for (id, handle) in self.handles().await {
            let session = handle.lock().await;
            if now - session.last_updated <= max_idle_ms {
                continue;
            }
            let persisted = session.to_persisted();
            if let Err(e) = self.store.save_session(&persisted).await {
                tracing::warn!(error = %e, session_id = %id, "failed to persist idle session, keeping it");
                continue;
            }

            let mut sessions = self.sessions.write().await;
            if sessions.get(&id).is_some_and(|current| Arc::ptr_eq(current, &handle)) {
                sessions.remove(&id);
                evicted += 1;
            }
        }

        if evicted > 0 {
            self.writer().save_global().await;
            tracing::info!(evicted, "evicted idle sessions");
        }
        evicted
    }

    /// Persist every in-memory session and the global stats.
    pub async fn flush(&self) -> usize {
        if !self.store.is_durable() {
            return 0;
        }

        let mut saved = 0;
        for (id, handle) in self.handles().await {
            let persisted = handle.lock().await.to_persisted();
            match self.store.save_session(&persisted).await {
                Ok(()) => saved += 1,
                Err(e) => tracing::warn!(error = %e, session_id = %id, "failed to persist session"),
            }
        }
        self.writer().save_global().await;
        saved
    }

    // ==================== Internals ====================

    fn writer(&self) -> StoreWriter {
        StoreWriter {
            store: Arc::clone(&self.store),
            stats: Arc::clone(&self.stats),
            global_lock: Arc::clone(&self.global_writer),
        }
    }

    async fn persist(&self, persisted: PersistedSession) {
        if self.store.is_durable() {
            self.writer().save(persisted).await;
        }
    }

    async fn handles(&self) -> Vec<(String, SessionHandle)> {
        self.sessions
            .read()
            .await
            .iter()
            .map(|(id, handle)| (id.clone(), Arc::clone(handle)))
            .collect()
    }

    async fn require(&self, session_id: &str) -> Result<SessionHandle, EngineError> {
        self.lookup(session_id)
            .await?
            .ok_or_else(|| EngineError::UnknownSession(session_id.to_string()))
    }

    /// In-memory session, else one restored from the store.
    async fn lookup(&self, session_id: &str) -> Result<Option<SessionHandle>, EngineError> {
        validate_session_id(session_id)?;

        if let Some(handle) = self.sessions.read().await.get(session_id) {
            return Ok(Some(Arc::clone(handle)));
        }

        let Some(persisted) = self.store.load_session(session_id).await else {
            return Ok(None);
        };
        let classifier = match self.restore_classifier(persisted.classifier.as_ref()) {
            Ok(classifier) => classifier,
            Err(failure) => {
                tracing::warn!(
                    error = %failure,
                    session_id = %session_id,
                    "classifier load failed, starting from a fresh classifier"
                );
                self.backend.construct(&self.config.architecture())
            }
        };

        let (handle, _) = self
            .insert_if_absent(session_id.to_string(), Session::restore(persisted, classifier))
            .await;
        tracing::debug!(session_id = %session_id, "session restored from store");
        Ok(Some(handle))
    }

    async fn insert_if_absent(&self, id: String, session: Session) -> (SessionHandle, bool) {
        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(&id) {
            return (Arc::clone(existing), false);
        }
        let handle = Arc::new(Mutex::new(session));
        sessions.insert(id, Arc::clone(&handle));
        (handle, true)
    }

    fn restore_classifier(
        &self,
        blob: Option<&ClassifierBlob>,
    ) -> Result<Box<dyn MoveClassifier>, ClassifierLoadFailure> {
        let blob = blob.ok_or(ClassifierLoadFailure::Missing)?;
        let classifier = self.backend.deserialize(blob)?;
        let expected = self.config.architecture().input_dim;
        if classifier.input_dim() != expected {
            return Err(ClassifierLoadFailure::WrongInputWidth {
                expected,
                actual: classifier.input_dim(),
            });
        }
        Ok(classifier)
    }

    fn seed_history(&self, session: &mut Session, entries: &[HistoryEntry]) {
        if entries.is_empty() {
            return;
        }
        if session.history.is_empty() && session.seed_moves.is_empty() {
            let skip = entries.len().saturating_sub(self.config.max_training_history);
            session.seed_moves = entries[skip..].iter().map(HistoryEntry::human_move).collect();
            tracing::debug!(
                session_id = %session.id,
                seed_moves = session.seed_moves.len(),
                "seeded session from client history"
            );
        } else {
            tracing::debug!(session_id = %session.id, "ignoring client history for a session with moves");
        }
    }

    fn predict_next(&self, session: &Session) -> Option<Prediction> {
        let window = self.config.window_size;
        let context = session.human_moves(window);
        // cold start
        let input = encode_window(&context, window).ok()?;

        match session.classifier.predict(&input) {
            Ok(prediction) => Some(prediction),
            Err(e) => {
                tracing::warn!(error = %e, session_id = %session.id, "prediction failed, playing randomly");
                None
            }
        }
    }

    fn choose_ai_move(&self, session: &Session) -> (Prediction, Move) {
        let prediction = self.predict_next(session);
        let mut rng = self.rng.lock();
        match prediction {
            Some(prediction) => {
                let exploration = match self.config.exploration_policy {
                    ExplorationPolicy::Uniform => Exploration::Uniform,
                    ExplorationPolicy::Frequency => {
                        Exploration::CounterFrequency(session.human_move_counts())
                    }
                };
                let ai_move = select_ai_move(
                    &prediction,
                    self.config.exploration_rate,
                    &exploration,
                    &mut *rng,
                );
                (prediction, ai_move)
            }
            None => (Prediction::uniform(), random_move(&mut *rng)),
        }
    }
}

/// Owned handles for writing from spawned tasks.
struct StoreWriter {
    store: Arc<SessionStore>,
    stats: Arc<GlobalStats>,
    global_lock: Arc<Mutex<()>>,
}

impl StoreWriter {
    async fn save(&self, persisted: PersistedSession) {
        if let Err(e) = self.store.save_session(&persisted).await {
            tracing::warn!(error = %e, session_id = %persisted.session_id, "failed to persist session");
        }
        self.save_global().await;
    }

    /// The snapshot is taken under the lock, so the file only moves forward.
    async fn save_global(&self) {
        let _guard = self.global_lock.lock().await;
        let snapshot = self.stats.snapshot();
        if let Err(e) = self.store.save_global(&snapshot).await {
            tracing::warn!(error = %e, "failed to persist global stats");
        }
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
