//! Move Classifier capability
//!
//! The prediction engine is hidden behind two traits so the numeric backend
//! can be swapped (and stubbed in tests):
//! - [`ClassifierBackend`] constructs fresh classifiers and restores them
//!   from a [`ClassifierBlob`]
//! - [`MoveClassifier`] predicts the next-move distribution and learns from
//!   (window, next move) samples

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::feature_dim;
use crate::types::{FeatureVector, Prediction, TrainingSample, DEFAULT_WINDOW_SIZE, MOVE_COUNT};

// ==================== Errors ====================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("empty training set")]
    EmptyTrainingSet,
    #[error("training produced non-finite parameters")]
    NonFiniteParameters,
    #[error("classifier produced an invalid distribution")]
    InvalidOutput,
    #[error("unsupported classifier format: {0}")]
    UnsupportedFormat(String),
    #[error("corrupt classifier parameters: {0}")]
    Corrupt(String),
    #[error("fit failed: {0}")]
    Fit(String),
}

// ==================== Configuration ====================

/// Layer widths of the feed-forward network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Architecture {
    pub input_dim: usize,
    pub hidden_layers: Vec<usize>,
    pub output_dim: usize,
}

impl Architecture {
    pub fn for_window(window_size: usize, hidden_layers: Vec<usize>) -> Self {
        Self {
            input_dim: feature_dim(window_size),
            hidden_layers,
            output_dim: MOVE_COUNT,
        }
    }

    /// Input width followed by every layer's output width.
    pub fn widths(&self) -> Vec<usize> {
        let mut widths = Vec::with_capacity(self.hidden_layers.len() + 2);
        widths.push(self.input_dim);
        widths.extend(self.hidden_layers.iter().copied());
        widths.push(self.output_dim);
        widths
    }
}

impl Default for Architecture {
    fn default() -> Self {
        Self::for_window(DEFAULT_WINDOW_SIZE, vec![32, 16])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub shuffle: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 8,
            learning_rate: 0.001,
            shuffle: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub epochs: usize,
    pub samples: usize,
    /// Mean cross-entropy over the last epoch
    pub final_loss: f64,
}

// ==================== Blob ====================

/// Serialized classifier parameters. Opaque to storage; `format` names the
/// backend that wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierBlob {
    pub format: String,
    pub data: serde_json::Value,
}

// ==================== Traits ====================

pub trait MoveClassifier: Send + Sync {
    /// Width of the feature vector this classifier accepts.
    fn input_dim(&self) -> usize;

    /// Distribution over the human's next move. Never mutates parameters.
    fn predict(&self, input: &FeatureVector) -> Result<Prediction, ClassifierError>;

    /// Incremental supervised training; continues from the current parameters.
    ///
    /// On error the parameters are unspecified, so callers that must keep a
    /// working model fit a [`MoveClassifier::clone_boxed`] copy.
    fn fit(
        &mut self,
        samples: &[TrainingSample],
        options: &FitOptions,
    ) -> Result<FitReport, ClassifierError>;

    fn to_blob(&self) -> Result<ClassifierBlob, ClassifierError>;

    fn clone_boxed(&self) -> Box<dyn MoveClassifier>;
}

pub trait ClassifierBackend: Send + Sync {
    fn construct(&self, architecture: &Architecture) -> Box<dyn MoveClassifier>;

    fn deserialize(&self, blob: &ClassifierBlob) -> Result<Box<dyn MoveClassifier>, ClassifierError>;
}

/// Validate sample shapes against the classifier input width.
pub fn validate_samples(samples: &[TrainingSample], input_dim: usize) -> Result<(), ClassifierError> {
    if samples.is_empty() {
        return Err(ClassifierError::EmptyTrainingSet);
    }
    for sample in samples {
        if sample.input.len() != input_dim {
            return Err(ClassifierError::DimensionMismatch {
                expected: input_dim,
                actual: sample.input.len(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Move;

    #[test]
    fn test_architecture_widths() {
        let arch = Architecture::for_window(3, vec![16, 8]);
        assert_eq!(arch.input_dim, 9);
        assert_eq!(arch.widths(), vec![9, 16, 8, 3]);
        assert_eq!(Architecture::default().widths(), vec![9, 32, 16, 3]);
    }

    #[test]
    fn test_validate_samples() {
        assert_eq!(validate_samples(&[], 9), Err(ClassifierError::EmptyTrainingSet));

        let sample = TrainingSample {
            input: FeatureVector::new(vec![0.0; 6]),
            label: [1.0, 0.0, 0.0],
            target: Move::Rock,
        };
        assert_eq!(
            validate_samples(std::slice::from_ref(&sample), 9),
            Err(ClassifierError::DimensionMismatch {
                expected: 9,
                actual: 6
            })
        );
        assert!(validate_samples(&[sample], 6).is_ok());
    }
}
