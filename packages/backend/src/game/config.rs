use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use rps_algo::sanitize::clamp_probability;
use rps_algo::{Architecture, FitOptions, DEFAULT_WINDOW_SIZE};

const MAX_WINDOW_SIZE: usize = 16;
const MAX_EPOCHS: usize = 1000;
const MAX_LAYER_WIDTH: usize = 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplorationPolicy {
    /// Uniformly random move on exploration rounds
    #[default]
    Uniform,
    /// Counter of a human move drawn from the session's move frequencies
    Frequency,
}

impl FromStr for ExplorationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uniform" | "random" => Ok(Self::Uniform),
            "frequency" | "weighted" => Ok(Self::Frequency),
            other => Err(format!("unknown exploration policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub window_size: usize,
    pub retrain_interval: usize,
    pub min_training_history: usize,
    pub exploration_rate: f64,
    pub exploration_policy: ExplorationPolicy,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Trailing rounds used to build a training set
    pub max_training_history: usize,
    pub hidden_layers: Vec<usize>,
    pub training_timeout_ms: u64,
    /// Seeds the move RNG and classifier initialization; unset means entropy
    pub rng_seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        let fit = FitOptions::default();
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            retrain_interval: 10,
            min_training_history: 10,
            exploration_rate: 0.15,
            exploration_policy: ExplorationPolicy::Uniform,
            epochs: fit.epochs,
            batch_size: fit.batch_size,
            learning_rate: fit.learning_rate,
            max_training_history: 50,
            hidden_layers: vec![32, 16],
            training_timeout_ms: 5000,
            rng_seed: None,
        }
    }
}

impl GameConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = env_parse("RPS_WINDOW_SIZE") {
            config.window_size = v;
        }
        if let Some(v) = env_parse("RPS_RETRAIN_INTERVAL") {
            config.retrain_interval = v;
        }
        if let Some(v) = env_parse("RPS_MIN_TRAINING_HISTORY") {
            config.min_training_history = v;
        }
        if let Some(v) = env_parse("RPS_EXPLORATION_RATE") {
            config.exploration_rate = v;
        }
        if let Some(v) = env_parse("RPS_EXPLORATION_POLICY") {
            config.exploration_policy = v;
        }
        if let Some(v) = env_parse("RPS_EPOCHS") {
            config.epochs = v;
        }
        if let Some(v) = env_parse("RPS_BATCH_SIZE") {
            config.batch_size = v;
        }
        if let Some(v) = env_parse("RPS_LEARNING_RATE") {
            config.learning_rate = v;
        }
        if let Some(v) = env_parse("RPS_MAX_TRAINING_HISTORY") {
            config.max_training_history = v;
        }
        if let Ok(raw) = std::env::var("RPS_HIDDEN_LAYERS") {
            match parse_layers(&raw) {
                Some(layers) => config.hidden_layers = layers,
                None => tracing::warn!(value = %raw, "ignoring malformed RPS_HIDDEN_LAYERS"),
            }
        }
        if let Some(v) = env_parse("RPS_TRAINING_TIMEOUT_MS") {
            config.training_timeout_ms = v;
        }
        if let Some(v) = env_parse("RPS_RNG_SEED") {
            config.rng_seed = Some(v);
        }

        config.sanitized()
    }

    /// Clamp every field into its usable range.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        self.window_size = self.window_size.clamp(1, MAX_WINDOW_SIZE);
        self.retrain_interval = self.retrain_interval.max(1);
        // at least one (window, next move) pair
        self.min_training_history = self.min_training_history.max(self.window_size + 1);
        self.max_training_history = self.max_training_history.max(self.window_size + 1);
        self.exploration_rate = clamp_probability(self.exploration_rate);
        self.epochs = self.epochs.clamp(1, MAX_EPOCHS);
        self.batch_size = self.batch_size.max(1);
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            self.learning_rate = defaults.learning_rate;
        }
        self.hidden_layers.retain(|&w| w > 0);
        for width in &mut self.hidden_layers {
            *width = (*width).min(MAX_LAYER_WIDTH);
        }
        self.training_timeout_ms = self.training_timeout_ms.max(1);
        self
    }

    pub fn architecture(&self) -> Architecture {
        Architecture::for_window(self.window_size, self.hidden_layers.clone())
    }

    pub fn fit_options(&self) -> FitOptions {
        FitOptions {
            epochs: self.epochs,
            batch_size: self.batch_size,
            learning_rate: self.learning_rate,
            shuffle: true,
        }
    }

    pub fn training_timeout(&self) -> Duration {
        Duration::from_millis(self.training_timeout_ms)
    }

    /// Whether the round that brought the history to `history_len` triggers retraining.
    pub fn should_retrain(&self, history_len: usize) -> bool {
        history_len > 0
            && history_len % self.retrain_interval == 0
            && history_len >= self.min_training_history
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable environment value");
            None
        }
    }
}

fn parse_layers(raw: &str) -> Option<Vec<usize>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(Vec::new());
    }
    trimmed
        .split(',')
        .map(|part| part.trim().parse::<usize>().ok())
        .collect()
}
