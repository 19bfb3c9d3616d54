use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use rps_algo::Outcome;

/// Point-in-time copy of the process-wide counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GlobalStatsSnapshot {
    pub total_games: u64,
    pub ai_wins: u64,
    pub human_wins: u64,
    pub ties: u64,
    pub active_sessions: u64,
    pub training_cycles: u64,
}

impl GlobalStatsSnapshot {
    pub fn is_consistent(&self) -> bool {
        self.total_games == self.ai_wins + self.human_wins + self.ties
    }
}

/// Additive-only counters shared by every session. All updates of one round
/// happen under a single lock, so no snapshot ever sees a half-applied round.
#[derive(Debug, Default)]
pub struct GlobalStats {
    inner: Mutex<GlobalStatsSnapshot>,
}

impl GlobalStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(mut snapshot: GlobalStatsSnapshot) -> Self {
        if !snapshot.is_consistent() {
            let total = snapshot.ai_wins + snapshot.human_wins + snapshot.ties;
            tracing::warn!(
                stored_total = snapshot.total_games,
                outcome_sum = total,
                "restored global stats inconsistent, using outcome sum"
            );
            snapshot.total_games = total;
        }
        Self {
            inner: Mutex::new(snapshot),
        }
    }

    pub fn record_round(&self, outcome: Outcome) {
        let mut stats = self.inner.lock();
        stats.total_games += 1;
        match outcome {
            Outcome::Ai => stats.ai_wins += 1,
            Outcome::Human => stats.human_wins += 1,
            Outcome::Tie => stats.ties += 1,
        }
    }

    pub fn session_created(&self) {
        self.inner.lock().active_sessions += 1;
    }

    pub fn record_training_cycle(&self) {
        self.inner.lock().training_cycles += 1;
    }

    pub fn snapshot(&self) -> GlobalStatsSnapshot {
        *self.inner.lock()
    }
}
