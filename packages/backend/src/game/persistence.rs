use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::game::stats::GlobalStatsSnapshot;
use crate::game::types::PersistedSession;

const SESSIONS_DIR: &str = "sessions";
const GLOBAL_FILE: &str = "global.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Where sessions and global stats outlive the process.
#[derive(Debug, Clone, Default)]
pub enum SessionStore {
    /// Nothing outlives the process
    #[default]
    Memory,
    /// `<dir>/sessions/<id>.json` plus `<dir>/global.json`
    File { dir: PathBuf },
}

impl SessionStore {
    pub fn from_data_dir(dir: Option<PathBuf>) -> Self {
        match dir {
            Some(dir) => Self::File { dir },
            None => Self::Memory,
        }
    }

    pub fn is_durable(&self) -> bool {
        matches!(self, Self::File { .. })
    }

    /// Missing or unreadable records are logged and reported as `None`.
    pub async fn load_session(&self, session_id: &str) -> Option<PersistedSession> {
        let Self::File { dir } = self else {
            return None;
        };
        let path = session_path(dir, session_id);
        let record: PersistedSession = read_json(&path).await?;
        if record.session_id != session_id {
            tracing::warn!(
                session_id = %session_id,
                stored_id = %record.session_id,
                "session file id mismatch, ignoring"
            );
            return None;
        }
        Some(record)
    }

    pub async fn save_session(&self, session: &PersistedSession) -> Result<(), StoreError> {
        let Self::File { dir } = self else {
            return Ok(());
        };
        let bytes = serde_json::to_vec(session)?;
        write_atomic(&session_path(dir, &session.session_id), &bytes).await
    }

    pub async fn load_global(&self) -> Option<GlobalStatsSnapshot> {
        let Self::File { dir } = self else {
            return None;
        };
        read_json(&dir.join(GLOBAL_FILE)).await
    }

    pub async fn save_global(&self, snapshot: &GlobalStatsSnapshot) -> Result<(), StoreError> {
        let Self::File { dir } = self else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        write_atomic(&dir.join(GLOBAL_FILE), &bytes).await
    }
}

fn session_path(dir: &Path, session_id: &str) -> PathBuf {
    dir.join(SESSIONS_DIR).join(format!("{session_id}.json"))
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "failed to read record");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "failed to parse record");
            None
        }
    }
}

/// Write to a uniquely named sibling, then rename over the target.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4().simple()));

    if let Err(e) = tokio::fs::write(&tmp, bytes).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::SessionStats;
    use rps_algo::{ClassifierBlob, Move, Outcome, Round};

    fn sample_record(id: &str) -> PersistedSession {
        PersistedSession {
            session_id: id.to_string(),
            classifier: Some(ClassifierBlob {
                format: "test".to_string(),
                data: serde_json::json!({ "k": 1 }),
            }),
            history: vec![Round {
                human_move: Move::Rock,
                ai_move: Move::Paper,
                outcome: Outcome::Ai,
                sequence_number: 1,
                timestamp: 1_700_000_000_000,
            }],
            seed_moves: vec![],
            stats: SessionStats {
                played: 1,
                ai_wins: 1,
                human_wins: 0,
                ties: 0,
            },
            training_cycles: 0,
            created_at: 1_700_000_000_000,
            last_updated: 1_700_000_000_000,
        }
    }

    #[tokio::test]
    async fn test_memory_store_keeps_nothing() {
        let store = SessionStore::Memory;
        store.save_session(&sample_record("a")).await.unwrap();
        assert!(store.load_session("a").await.is_none());
        assert!(store.load_global().await.is_none());
        assert!(!store.is_durable());
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::from_data_dir(Some(dir.path().to_path_buf()));
        assert!(store.is_durable());

        let record = sample_record("player-1");
        store.save_session(&record).await.unwrap();
        assert_eq!(store.load_session("player-1").await, Some(record));
        assert!(store.load_session("player-2").await.is_none());

        let snapshot = GlobalStatsSnapshot {
            total_games: 3,
            ai_wins: 1,
            human_wins: 1,
            ties: 1,
            active_sessions: 1,
            training_cycles: 0,
        };
        store.save_global(&snapshot).await.unwrap();
        assert_eq!(store.load_global().await, Some(snapshot));

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join(SESSIONS_DIR))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_record_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::from_data_dir(Some(dir.path().to_path_buf()));
        std::fs::create_dir_all(dir.path().join(SESSIONS_DIR)).unwrap();
        std::fs::write(session_path(dir.path(), "broken"), b"{not json").unwrap();
        assert!(store.load_session("broken").await.is_none());
    }
}
