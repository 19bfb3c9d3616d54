//! Feed-forward Move Classifier
//!
//! Small multi-layer perceptron trained with minibatch Adam on categorical
//! cross-entropy.
//!
//! Layout:
//! - Dense layers, ReLU on hidden layers, softmax on the output layer
//! - Glorot-uniform initialization from a seeded ChaCha8 generator
//! - Adam moment estimates live next to the weights and are serialized with
//!   them, so training resumes where it stopped after a restart

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::classifier::{
    validate_samples, Architecture, ClassifierBackend, ClassifierBlob, ClassifierError, FitOptions,
    FitReport, MoveClassifier,
};
use crate::sanitize::{cross_entropy, has_invalid_values, softmax};
use crate::types::{FeatureVector, Prediction, TrainingSample, MOVE_COUNT};

// ==================== Constants ====================

/// Blob format tag written by this backend
pub const MLP_FORMAT: &str = "mlp-v1";

const ADAM_BETA1: f64 = 0.9;
const ADAM_BETA2: f64 = 0.999;
const ADAM_EPSILON: f64 = 1e-7;

/// Mixes the optimizer step into the shuffle seed
const SHUFFLE_SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

// ==================== Layers ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DenseLayer {
    input_dim: usize,
    output_dim: usize,
    /// `[output_dim, input_dim]`, row-major
    weights: Vec<f64>,
    biases: Vec<f64>,
    m_weights: Vec<f64>,
    v_weights: Vec<f64>,
    m_biases: Vec<f64>,
    v_biases: Vec<f64>,
}

impl DenseLayer {
    fn new(input_dim: usize, output_dim: usize, rng: &mut ChaCha8Rng) -> Self {
        let limit = (6.0 / (input_dim + output_dim).max(1) as f64).sqrt();
        let n = input_dim * output_dim;
        let weights = (0..n).map(|_| rng.gen_range(-limit..=limit)).collect();
        Self {
            input_dim,
            output_dim,
            weights,
            biases: vec![0.0; output_dim],
            m_weights: vec![0.0; n],
            v_weights: vec![0.0; n],
            m_biases: vec![0.0; output_dim],
            v_biases: vec![0.0; output_dim],
        }
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        (0..self.output_dim)
            .map(|o| {
                let row = &self.weights[o * self.input_dim..(o + 1) * self.input_dim];
                row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + self.biases[o]
            })
            .collect()
    }

    fn is_consistent(&self) -> bool {
        let n = self.input_dim * self.output_dim;
        self.weights.len() == n
            && self.m_weights.len() == n
            && self.v_weights.len() == n
            && self.biases.len() == self.output_dim
            && self.m_biases.len() == self.output_dim
            && self.v_biases.len() == self.output_dim
    }

    fn parameters_finite(&self) -> bool {
        !has_invalid_values(&self.weights)
            && !has_invalid_values(&self.biases)
            && !has_invalid_values(&self.m_weights)
            && !has_invalid_values(&self.v_weights)
            && !has_invalid_values(&self.m_biases)
            && !has_invalid_values(&self.v_biases)
    }
}

struct Gradients {
    weights: Vec<Vec<f64>>,
    biases: Vec<Vec<f64>>,
}

impl Gradients {
    fn zeros(layers: &[DenseLayer]) -> Self {
        Self {
            weights: layers.iter().map(|l| vec![0.0; l.weights.len()]).collect(),
            biases: layers.iter().map(|l| vec![0.0; l.biases.len()]).collect(),
        }
    }
}

struct AdamStep {
    scale: f64,
    learning_rate: f64,
    bias_correction1: f64,
    bias_correction2: f64,
}

impl AdamStep {
    fn apply(&self, params: &mut [f64], m: &mut [f64], v: &mut [f64], grads: &[f64]) {
        for i in 0..params.len() {
            let g = grads[i] * self.scale;
            m[i] = ADAM_BETA1 * m[i] + (1.0 - ADAM_BETA1) * g;
            v[i] = ADAM_BETA2 * v[i] + (1.0 - ADAM_BETA2) * g * g;
            let m_hat = m[i] / self.bias_correction1;
            let v_hat = v[i] / self.bias_correction2;
            params[i] -= self.learning_rate * m_hat / (v_hat.sqrt() + ADAM_EPSILON);
        }
    }
}

fn relu(x: f64) -> f64 {
    x.max(0.0)
}

// ==================== Classifier ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpClassifier {
    architecture: Architecture,
    layers: Vec<DenseLayer>,
    seed: u64,
    /// Adam step count
    step: u64,
}

impl MlpClassifier {
    pub fn new(architecture: Architecture, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let layers = architecture
            .widths()
            .windows(2)
            .map(|w| DenseLayer::new(w[0], w[1], &mut rng))
            .collect();
        Self {
            architecture,
            layers,
            seed,
            step: 0,
        }
    }

    pub fn architecture(&self) -> &Architecture {
        &self.architecture
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.weights.len() + l.biases.len())
            .sum()
    }

    pub fn from_blob(blob: &ClassifierBlob) -> Result<Self, ClassifierError> {
        if blob.format != MLP_FORMAT {
            return Err(ClassifierError::UnsupportedFormat(blob.format.clone()));
        }
        let model: Self = serde_json::from_value(blob.data.clone())
            .map_err(|e| ClassifierError::Corrupt(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), ClassifierError> {
        if self.architecture.output_dim != MOVE_COUNT {
            return Err(ClassifierError::Corrupt(format!(
                "output_dim {} != {}",
                self.architecture.output_dim, MOVE_COUNT
            )));
        }
        let widths = self.architecture.widths();
        if self.layers.len() + 1 != widths.len() {
            return Err(ClassifierError::Corrupt(format!(
                "expected {} layers, found {}",
                widths.len() - 1,
                self.layers.len()
            )));
        }
        for (i, (layer, pair)) in self.layers.iter().zip(widths.windows(2)).enumerate() {
            if layer.input_dim != pair[0] || layer.output_dim != pair[1] || !layer.is_consistent() {
                return Err(ClassifierError::Corrupt(format!("layer {i} shape mismatch")));
            }
        }
        if !self.parameters_finite() {
            return Err(ClassifierError::NonFiniteParameters);
        }
        Ok(())
    }

    fn parameters_finite(&self) -> bool {
        self.layers.iter().all(DenseLayer::parameters_finite)
    }

    /// Index 0 is the input; the last entry is the softmax output.
    fn forward_trace(&self, input: &[f64]) -> Vec<Vec<f64>> {
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        activations.push(input.to_vec());
        let last = self.layers.len().saturating_sub(1);
        for (l, layer) in self.layers.iter().enumerate() {
            let z = layer.forward(&activations[l]);
            let a = if l == last {
                softmax(&z)
            } else {
                z.into_iter().map(relu).collect()
            };
            activations.push(a);
        }
        activations
    }

    fn accumulate(&self, activations: &[Vec<f64>], label: &[f64], grads: &mut Gradients) {
        // softmax + cross-entropy: dL/dz = p - y
        let output = &activations[activations.len() - 1];
        let mut delta: Vec<f64> = output.iter().zip(label).map(|(p, y)| p - y).collect();

        for l in (0..self.layers.len()).rev() {
            let layer = &self.layers[l];
            let input = &activations[l];
            let in_dim = layer.input_dim;

            for (o, &d) in delta.iter().enumerate() {
                grads.biases[l][o] += d;
                let row = &mut grads.weights[l][o * in_dim..(o + 1) * in_dim];
                for (g, x) in row.iter_mut().zip(input) {
                    *g += d * x;
                }
            }

            if l > 0 {
                let mut prev = vec![0.0; in_dim];
                for (i, p) in prev.iter_mut().enumerate() {
                    // ReLU derivative: input is the previous layer's activation
                    if input[i] <= 0.0 {
                        continue;
                    }
                    *p = delta
                        .iter()
                        .enumerate()
                        .map(|(o, d)| layer.weights[o * in_dim + i] * d)
                        .sum();
                }
                delta = prev;
            }
        }
    }

    fn apply_gradients(&mut self, grads: &Gradients, batch_len: usize, learning_rate: f64) {
        self.step += 1;
        let t = self.step as f64;
        let step = AdamStep {
            scale: 1.0 / batch_len.max(1) as f64,
            learning_rate,
            bias_correction1: 1.0 - ADAM_BETA1.powf(t),
            bias_correction2: 1.0 - ADAM_BETA2.powf(t),
        };
        for (layer, (gw, gb)) in self
            .layers
            .iter_mut()
            .zip(grads.weights.iter().zip(&grads.biases))
        {
            step.apply(&mut layer.weights, &mut layer.m_weights, &mut layer.v_weights, gw);
            step.apply(&mut layer.biases, &mut layer.m_biases, &mut layer.v_biases, gb);
        }
    }

    fn sample_loss(output: &[f64], label: &[f64]) -> f64 {
        label
            .iter()
            .zip(output)
            .filter(|(y, _)| **y > 0.0)
            .map(|(y, p)| y * cross_entropy(*p))
            .sum()
    }
}

impl MoveClassifier for MlpClassifier {
    fn input_dim(&self) -> usize {
        self.architecture.input_dim
    }

    fn predict(&self, input: &FeatureVector) -> Result<Prediction, ClassifierError> {
        if input.len() != self.input_dim() {
            return Err(ClassifierError::DimensionMismatch {
                expected: self.input_dim(),
                actual: input.len(),
            });
        }
        let activations = self.forward_trace(input.as_slice());
        let output = &activations[activations.len() - 1];
        if output.len() != MOVE_COUNT {
            return Err(ClassifierError::InvalidOutput);
        }
        Prediction::from_weights([output[0], output[1], output[2]])
            .ok_or(ClassifierError::InvalidOutput)
    }

    fn fit(
        &mut self,
        samples: &[TrainingSample],
        options: &FitOptions,
    ) -> Result<FitReport, ClassifierError> {
        validate_samples(samples, self.input_dim())?;
        if !options.learning_rate.is_finite() || options.learning_rate <= 0.0 {
            return Err(ClassifierError::Fit(format!(
                "learning rate must be positive, got {}",
                options.learning_rate
            )));
        }

        let batch_size = options.batch_size.max(1);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed ^ self.step.wrapping_mul(SHUFFLE_SEED_MIX));
        let mut order: Vec<usize> = (0..samples.len()).collect();
        let mut final_loss = f64::NAN;

        for _ in 0..options.epochs {
            if options.shuffle {
                order.shuffle(&mut rng);
            }
            let mut epoch_loss = 0.0;
            for chunk in order.chunks(batch_size) {
                let mut grads = Gradients::zeros(&self.layers);
                for &idx in chunk {
                    let sample = &samples[idx];
                    let activations = self.forward_trace(sample.input.as_slice());
                    epoch_loss += Self::sample_loss(&activations[activations.len() - 1], &sample.label);
                    self.accumulate(&activations, &sample.label, &mut grads);
                }
                self.apply_gradients(&grads, chunk.len(), options.learning_rate);
            }
            final_loss = epoch_loss / samples.len() as f64;
            if !final_loss.is_finite() {
                return Err(ClassifierError::NonFiniteParameters);
            }
        }

        if !self.parameters_finite() {
            return Err(ClassifierError::NonFiniteParameters);
        }

        if options.epochs == 0 {
            final_loss = samples
                .iter()
                .map(|s| {
                    let activations = self.forward_trace(s.input.as_slice());
                    Self::sample_loss(&activations[activations.len() - 1], &s.label)
                })
                .sum::<f64>()
                / samples.len() as f64;
        }

        Ok(FitReport {
            epochs: options.epochs,
            samples: samples.len(),
            final_loss,
        })
    }

    fn to_blob(&self) -> Result<ClassifierBlob, ClassifierError> {
        let data = serde_json::to_value(self).map_err(|e| ClassifierError::Corrupt(e.to_string()))?;
        Ok(ClassifierBlob {
            format: MLP_FORMAT.to_string(),
            data,
        })
    }

    fn clone_boxed(&self) -> Box<dyn MoveClassifier> {
        Box::new(self.clone())
    }
}

// ==================== Backend ====================

/// Constructs [`MlpClassifier`]s. With a base seed, the n-th constructed
/// classifier is seeded `base + n`; without one, seeds come from the thread RNG.
#[derive(Debug, Default)]
pub struct MlpBackend {
    base_seed: Option<u64>,
    constructed: AtomicU64,
}

impl MlpBackend {
    pub fn new(base_seed: Option<u64>) -> Self {
        Self {
            base_seed,
            constructed: AtomicU64::new(0),
        }
    }

    fn next_seed(&self) -> u64 {
        match self.base_seed {
            Some(base) => base.wrapping_add(self.constructed.fetch_add(1, Ordering::Relaxed)),
            None => rand::random(),
        }
    }
}

impl ClassifierBackend for MlpBackend {
    fn construct(&self, architecture: &Architecture) -> Box<dyn MoveClassifier> {
        Box::new(MlpClassifier::new(architecture.clone(), self.next_seed()))
    }

    fn deserialize(&self, blob: &ClassifierBlob) -> Result<Box<dyn MoveClassifier>, ClassifierError> {
        Ok(Box::new(MlpClassifier::from_blob(blob)?))
    }
}
