use std::time::Duration;

use thiserror::Error;

use rps_algo::{build_training_set_from_moves, ClassifierError, FitReport, MoveClassifier};

use crate::game::config::GameConfig;
use crate::game::types::Session;

#[derive(Debug, Error)]
pub enum TrainingFailure {
    #[error("history yields no training samples")]
    EmptyTrainingSet,
    #[error(transparent)]
    Fit(#[from] ClassifierError),
    #[error("training task aborted: {0}")]
    Aborted(String),
    #[error("training exceeded {0:?}")]
    TimedOut(Duration),
}

/// Fit a copy of the session classifier on its recent history and swap it in
/// on success. On failure the session keeps its previous classifier.
pub async fn retrain_session(
    config: &GameConfig,
    session: &mut Session,
) -> Result<FitReport, TrainingFailure> {
    let moves = session.human_moves(config.max_training_history);
    let samples = build_training_set_from_moves(&moves, config.window_size);
    if samples.is_empty() {
        return Err(TrainingFailure::EmptyTrainingSet);
    }

    let mut candidate: Box<dyn MoveClassifier> = session.classifier.clone_boxed();
    let options = config.fit_options();
    let task = tokio::task::spawn_blocking(move || {
        let report = candidate.fit(&samples, &options);
        (candidate, report)
    });

    let (candidate, report) = match tokio::time::timeout(config.training_timeout(), task).await {
        Ok(Ok(done)) => done,
        Ok(Err(join_err)) => return Err(TrainingFailure::Aborted(join_err.to_string())),
        Err(_) => return Err(TrainingFailure::TimedOut(config.training_timeout())),
    };
    let report = report?;

    session.classifier = candidate;
    session.training_cycles += 1;
    Ok(report)
}
