use serde::{Deserialize, Serialize};
use thiserror::Error;

use rps_algo::{ClassifierBlob, ClassifierError, Move, MoveClassifier, MoveCounts, Outcome, Prediction, Round};

use crate::game::persistence::StoreError;

pub const MAX_SESSION_ID_LEN: usize = 64;

/// Rounds included in a [`SessionView`]
pub const RECENT_ROUNDS_LIMIT: usize = 10;

// ==================== Errors ====================

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown session: {0}")]
    UnknownSession(String),
    #[error("invalid session id: {0}")]
    InvalidSessionId(String),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Why a persisted classifier could not be used.
#[derive(Debug, Error)]
pub enum ClassifierLoadFailure {
    #[error("no classifier stored")]
    Missing,
    #[error("stored classifier unreadable: {0}")]
    Corrupt(#[from] ClassifierError),
    #[error("stored classifier expects {actual} inputs, window needs {expected}")]
    WrongInputWidth { expected: usize, actual: usize },
}

/// Ids are 1-64 characters of `[A-Za-z0-9_-]`.
pub fn validate_session_id(id: &str) -> Result<(), EngineError> {
    let valid = !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(EngineError::InvalidSessionId(id.to_string()))
    }
}

// ==================== Session ====================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionStats {
    pub played: u64,
    pub ai_wins: u64,
    pub human_wins: u64,
    pub ties: u64,
}

impl SessionStats {
    pub fn record(&mut self, outcome: Outcome) {
        self.played += 1;
        match outcome {
            Outcome::Ai => self.ai_wins += 1,
            Outcome::Human => self.human_wins += 1,
            Outcome::Tie => self.ties += 1,
        }
    }
}

pub struct Session {
    pub id: String,
    pub classifier: Box<dyn MoveClassifier>,
    /// Append-only
    pub history: Vec<Round>,
    /// Client-supplied moves preceding the first round; context only
    pub seed_moves: Vec<Move>,
    pub stats: SessionStats,
    pub training_cycles: u64,
    pub created_at: i64,
    pub last_updated: i64,
}

impl Session {
    pub fn new(id: String, classifier: Box<dyn MoveClassifier>, now: i64) -> Self {
        Self {
            id,
            classifier,
            history: Vec::new(),
            seed_moves: Vec::new(),
            stats: SessionStats::default(),
            training_cycles: 0,
            created_at: now,
            last_updated: now,
        }
    }

    pub fn restore(persisted: PersistedSession, classifier: Box<dyn MoveClassifier>) -> Self {
        Self {
            id: persisted.session_id,
            classifier,
            history: persisted.history,
            seed_moves: persisted.seed_moves,
            stats: persisted.stats,
            training_cycles: persisted.training_cycles,
            created_at: persisted.created_at,
            last_updated: persisted.last_updated,
        }
    }

    /// Seed moves followed by the human move of every round, keeping only
    /// the trailing `limit`.
    pub fn human_moves(&self, limit: usize) -> Vec<Move> {
        let rounds = rps_algo::recent(&self.history, limit);
        let seeds_wanted = limit.saturating_sub(rounds.len());
        let seeds = &self.seed_moves[self.seed_moves.len().saturating_sub(seeds_wanted)..];
        seeds
            .iter()
            .copied()
            .chain(rounds.iter().map(|r| r.human_move))
            .collect()
    }

    pub fn human_move_counts(&self) -> MoveCounts {
        MoveCounts::from_moves(self.history.iter().map(|r| r.human_move))
    }

    pub fn to_persisted(&self) -> PersistedSession {
        let classifier = match self.classifier.to_blob() {
            Ok(blob) => Some(blob),
            Err(e) => {
                tracing::warn!(error = %e, session_id = %self.id, "failed to serialize classifier");
                None
            }
        };
        PersistedSession {
            session_id: self.id.clone(),
            classifier,
            history: self.history.clone(),
            seed_moves: self.seed_moves.clone(),
            stats: self.stats,
            training_cycles: self.training_cycles,
            created_at: self.created_at,
            last_updated: self.last_updated,
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id.clone(),
            stats: self.stats,
            training_cycles: self.training_cycles,
            history_length: self.history.len(),
            recent_rounds: rps_algo::recent(&self.history, RECENT_ROUNDS_LIMIT).to_vec(),
            human_move_counts: self.human_move_counts(),
            created_at: self.created_at,
            last_updated: self.last_updated,
        }
    }
}

// ==================== Persisted / API shapes ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub session_id: String,
    pub classifier: Option<ClassifierBlob>,
    #[serde(default)]
    pub history: Vec<Round>,
    #[serde(default)]
    pub seed_moves: Vec<Move>,
    #[serde(default)]
    pub stats: SessionStats,
    #[serde(default)]
    pub training_cycles: u64,
    pub created_at: i64,
    pub last_updated: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: String,
    pub stats: SessionStats,
    pub training_cycles: u64,
    pub history_length: usize,
    pub recent_rounds: Vec<Round>,
    pub human_move_counts: MoveCounts,
    pub created_at: i64,
    pub last_updated: i64,
}

/// A client-held round record. Only `humanMove` is required.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRound {
    pub human_move: Move,
    #[serde(default)]
    pub ai_move: Option<Move>,
    #[serde(default)]
    pub outcome: Option<Outcome>,
    #[serde(default)]
    pub sequence_number: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// Entry of a client-supplied history: a full round record or a bare move.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum HistoryEntry {
    Move(Move),
    Round(ClientRound),
}

impl HistoryEntry {
    pub fn human_move(&self) -> Move {
        match self {
            HistoryEntry::Move(mv) => *mv,
            HistoryEntry::Round(round) => round.human_move,
        }
    }
}

impl From<Move> for HistoryEntry {
    fn from(mv: Move) -> Self {
        HistoryEntry::Move(mv)
    }
}

impl From<&Round> for HistoryEntry {
    fn from(round: &Round) -> Self {
        HistoryEntry::Round(ClientRound {
            human_move: round.human_move,
            ai_move: Some(round.ai_move),
            outcome: Some(round.outcome),
            sequence_number: Some(round.sequence_number),
            timestamp: Some(round.timestamp),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayRequest {
    pub human_move: Move,
    /// Prior rounds held by the client, oldest first
    #[serde(default)]
    pub history: Option<Vec<HistoryEntry>>,
}

impl PlayRequest {
    pub fn new(human_move: Move) -> Self {
        Self {
            human_move,
            history: None,
        }
    }

    pub fn with_history(human_move: Move, history: impl IntoIterator<Item = HistoryEntry>) -> Self {
        Self {
            human_move,
            history: Some(history.into_iter().collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayOutcome {
    pub ai_move: Move,
    pub outcome: Outcome,
    pub prediction: Prediction,
    pub sequence_number: u64,
    /// Whether this round scheduled a retraining cycle
    pub retraining: bool,
    /// Completed cycles, not counting the one this round schedules
    pub training_cycles: u64,
}
