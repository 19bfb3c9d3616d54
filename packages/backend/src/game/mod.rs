//! Session and retraining controller.
//!
//! One [`GameEngine`] per process owns every live session, the shared
//! [`GlobalStats`] and the [`SessionStore`]. Rounds on the same session are
//! serialized through the session's async mutex; different sessions proceed
//! in parallel.

pub mod config;
pub mod engine;
pub mod persistence;
pub mod stats;
pub mod training;
pub mod types;

pub use config::{ExplorationPolicy, GameConfig};
pub use engine::{GameEngine, SessionHandle};
pub use persistence::{SessionStore, StoreError};
pub use stats::{GlobalStats, GlobalStatsSnapshot};
pub use training::TrainingFailure;
pub use types::{
    validate_session_id, ClassifierLoadFailure, ClientRound, EngineError, HistoryEntry,
    PersistedSession, PlayOutcome, PlayRequest, Session, SessionStats, SessionView,
};
