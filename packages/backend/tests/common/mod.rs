#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use serde::{Deserialize, Serialize};

use rps_algo::classifier::validate_samples;
use rps_algo::{
    Architecture, ClassifierBackend, ClassifierBlob, ClassifierError, FeatureVector, FitOptions,
    FitReport, MoveClassifier, Prediction, TrainingSample,
};
use rps_backend::game::{GameConfig, GameEngine, GlobalStats, SessionStore};
use rps_backend::state::AppState;

pub const STUB_FORMAT: &str = "stub-v1";

// ============================================================================
// Deterministic classifier backend
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FitBehavior {
    Succeed,
    /// Scrambles its own parameters, then errors
    Fail,
    Panic,
    /// Blocks for the given time, then succeeds
    Hang(Duration),
}

#[derive(Debug, Default)]
pub struct Counters {
    pub predicts: AtomicUsize,
    pub fits: AtomicUsize,
    pub constructed: AtomicUsize,
}

impl Counters {
    pub fn predicts(&self) -> usize {
        self.predicts.load(Ordering::SeqCst)
    }

    pub fn fits(&self) -> usize {
        self.fits.load(Ordering::SeqCst)
    }

    pub fn constructed(&self) -> usize {
        self.constructed.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StubState {
    pub id: usize,
    pub input_dim: usize,
    pub fitted: u64,
}

pub struct StubClassifier {
    state: StubState,
    prediction: Prediction,
    behavior: FitBehavior,
    counters: Arc<Counters>,
}

impl MoveClassifier for StubClassifier {
    fn input_dim(&self) -> usize {
        self.state.input_dim
    }

    fn predict(&self, input: &FeatureVector) -> Result<Prediction, ClassifierError> {
        self.counters.predicts.fetch_add(1, Ordering::SeqCst);
        if input.len() != self.state.input_dim {
            return Err(ClassifierError::DimensionMismatch {
                expected: self.state.input_dim,
                actual: input.len(),
            });
        }
        Ok(self.prediction)
    }

    fn fit(
        &mut self,
        samples: &[TrainingSample],
        options: &FitOptions,
    ) -> Result<FitReport, ClassifierError> {
        self.counters.fits.fetch_add(1, Ordering::SeqCst);
        validate_samples(samples, self.state.input_dim)?;
        match self.behavior {
            FitBehavior::Succeed => {
                self.state.fitted += 1;
                Ok(FitReport {
                    epochs: options.epochs,
                    samples: samples.len(),
                    final_loss: 0.5,
                })
            }
            FitBehavior::Fail => {
                self.state.fitted += 1000;
                Err(ClassifierError::Fit("stub failure".to_string()))
            }
            FitBehavior::Panic => panic!("stub classifier panicked during fit"),
            FitBehavior::Hang(delay) => {
                std::thread::sleep(delay);
                self.state.fitted += 1;
                Ok(FitReport {
                    epochs: options.epochs,
                    samples: samples.len(),
                    final_loss: 0.5,
                })
            }
        }
    }

    fn to_blob(&self) -> Result<ClassifierBlob, ClassifierError> {
        let data = serde_json::to_value(self.state)
            .map_err(|e| ClassifierError::Corrupt(e.to_string()))?;
        Ok(ClassifierBlob {
            format: STUB_FORMAT.to_string(),
            data,
        })
    }

    fn clone_boxed(&self) -> Box<dyn MoveClassifier> {
        Box::new(StubClassifier {
            state: self.state,
            prediction: self.prediction,
            behavior: self.behavior,
            counters: Arc::clone(&self.counters),
        })
    }
}

pub struct StubBackend {
    pub prediction: Prediction,
    pub behavior: FitBehavior,
    pub counters: Arc<Counters>,
}

impl StubBackend {
    pub fn new(weights: [f64; 3], behavior: FitBehavior) -> Self {
        Self {
            prediction: Prediction::from_weights(weights).unwrap(),
            behavior,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Always certain the human plays rock
    pub fn certain_rock() -> Self {
        Self::new([1.0, 0.0, 0.0], FitBehavior::Succeed)
    }

    fn classifier(&self, state: StubState) -> Box<dyn MoveClassifier> {
        Box::new(StubClassifier {
            state,
            prediction: self.prediction,
            behavior: self.behavior,
            counters: Arc::clone(&self.counters),
        })
    }
}

impl ClassifierBackend for StubBackend {
    fn construct(&self, architecture: &Architecture) -> Box<dyn MoveClassifier> {
        let id = self.counters.constructed.fetch_add(1, Ordering::SeqCst);
        self.classifier(StubState {
            id,
            input_dim: architecture.input_dim,
            fitted: 0,
        })
    }

    fn deserialize(&self, blob: &ClassifierBlob) -> Result<Box<dyn MoveClassifier>, ClassifierError> {
        if blob.format != STUB_FORMAT {
            return Err(ClassifierError::UnsupportedFormat(blob.format.clone()));
        }
        let state: StubState = serde_json::from_value(blob.data.clone())
            .map_err(|e| ClassifierError::Corrupt(e.to_string()))?;
        Ok(self.classifier(state))
    }
}

pub fn stub_state(blob: &ClassifierBlob) -> StubState {
    assert_eq!(blob.format, STUB_FORMAT);
    serde_json::from_value(blob.data.clone()).unwrap()
}

// ============================================================================
// Engine / app builders
// ============================================================================

/// Exploration disabled, seeded RNG
pub fn test_config() -> GameConfig {
    GameConfig {
        exploration_rate: 0.0,
        rng_seed: Some(42),
        ..GameConfig::default()
    }
}

pub fn stub_engine(backend: StubBackend, config: GameConfig, store: SessionStore) -> Arc<GameEngine> {
    Arc::new(GameEngine::new(
        config,
        Arc::new(backend),
        store,
        Arc::new(GlobalStats::new()),
    ))
}

pub fn create_test_app() -> Router {
    let engine = AppState::create_engine(
        GameConfig {
            rng_seed: Some(7),
            ..GameConfig::default()
        },
        SessionStore::Memory,
        Arc::new(GlobalStats::new()),
    );
    rps_backend::build_router(AppState::new(engine))
}
