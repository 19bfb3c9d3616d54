//! Common Types and Constants
//!
//! Shared data structures used across all algorithm modules.

use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Number of distinct moves (one-hot width per move)
pub const MOVE_COUNT: usize = 3;

/// Default length of the move window fed to the classifier
pub const DEFAULT_WINDOW_SIZE: usize = 3;

/// Tolerance used when checking that a distribution sums to 1
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Numerical stability epsilon
pub const EPSILON: f64 = 1e-12;

// ==================== Move / Outcome ====================

/// One of the three playable moves, in canonical index order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Rock,
    Paper,
    Scissors,
}

impl Move {
    /// All moves in canonical order `[rock, paper, scissors]`
    pub const ALL: [Move; MOVE_COUNT] = [Move::Rock, Move::Paper, Move::Scissors];

    pub fn index(self) -> usize {
        match self {
            Move::Rock => 0,
            Move::Paper => 1,
            Move::Scissors => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Move::Rock => "rock",
            Move::Paper => "paper",
            Move::Scissors => "scissors",
        }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Move {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rock" => Ok(Move::Rock),
            "paper" => Ok(Move::Paper),
            "scissors" => Ok(Move::Scissors),
            other => Err(format!("unknown move: {other}")),
        }
    }
}

/// Verdict of a round, from the human's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Human,
    Ai,
    Tie,
}

// ==================== Round ====================

/// One resolved round. Created once, never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub human_move: Move,
    pub ai_move: Move,
    pub outcome: Outcome,
    /// 1-based position in the session history
    pub sequence_number: u64,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
}

// ==================== Feature Vector ====================

/// Concatenated one-hot encodings of a move window, oldest move first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

// ==================== Prediction ====================

/// Probability distribution over the human's next move,
/// indexed `[rock, paper, scissors]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prediction([f64; MOVE_COUNT]);

impl Prediction {
    pub fn uniform() -> Self {
        Self([1.0 / MOVE_COUNT as f64; MOVE_COUNT])
    }

    /// Build a distribution from raw non-negative weights, normalizing them.
    ///
    /// Returns `None` for negative, non-finite or all-zero input.
    pub fn from_weights(weights: [f64; MOVE_COUNT]) -> Option<Self> {
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return None;
        }
        let sum: f64 = weights.iter().sum();
        if sum <= EPSILON {
            return None;
        }
        Some(Self([weights[0] / sum, weights[1] / sum, weights[2] / sum]))
    }

    pub fn probabilities(&self) -> [f64; MOVE_COUNT] {
        self.0
    }

    pub fn probability(&self, mv: Move) -> f64 {
        self.0[mv.index()]
    }

    /// Most likely move; ties resolve to the earlier move in canonical order.
    pub fn most_likely(&self) -> Move {
        let mut best = 0;
        for i in 1..MOVE_COUNT {
            if self.0[i] > self.0[best] {
                best = i;
            }
        }
        Move::ALL[best]
    }

    pub fn is_normalized(&self) -> bool {
        let sum: f64 = self.0.iter().sum();
        self.0.iter().all(|p| p.is_finite() && *p >= 0.0) && (sum - 1.0).abs() <= PROBABILITY_TOLERANCE
    }
}

impl Default for Prediction {
    fn default() -> Self {
        Self::uniform()
    }
}

// ==================== Training Types ====================

/// One supervised example: a move window and the move that followed it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub input: FeatureVector,
    pub label: [f64; MOVE_COUNT],
    pub target: Move,
}

/// Observed move frequencies
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCounts {
    pub rock: u64,
    pub paper: u64,
    pub scissors: u64,
}

impl MoveCounts {
    pub fn from_moves<I: IntoIterator<Item = Move>>(moves: I) -> Self {
        let mut counts = Self::default();
        for mv in moves {
            counts.record(mv);
        }
        counts
    }

    pub fn record(&mut self, mv: Move) {
        match mv {
            Move::Rock => self.rock += 1,
            Move::Paper => self.paper += 1,
            Move::Scissors => self.scissors += 1,
        }
    }

    pub fn get(&self, mv: Move) -> u64 {
        match mv {
            Move::Rock => self.rock,
            Move::Paper => self.paper,
            Move::Scissors => self.scissors,
        }
    }

    pub fn total(&self) -> u64 {
        self.rock + self.paper + self.scissors
    }

    /// Relative frequencies, or `None` when nothing was observed.
    pub fn distribution(&self) -> Option<Prediction> {
        Prediction::from_weights([self.rock as f64, self.paper as f64, self.scissors as f64])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_index_round_trip() {
        for mv in Move::ALL {
            assert_eq!(Move::from_index(mv.index()), Some(mv));
        }
        assert_eq!(Move::from_index(3), None);
    }

    #[test]
    fn test_move_parse_and_serde() {
        assert_eq!("Rock".parse::<Move>().unwrap(), Move::Rock);
        assert_eq!(" scissors ".parse::<Move>().unwrap(), Move::Scissors);
        assert!("lizard".parse::<Move>().is_err());

        let json = serde_json::to_string(&Move::Paper).unwrap();
        assert_eq!(json, "\"paper\"");
        let outcome: Outcome = serde_json::from_str("\"ai\"").unwrap();
        assert_eq!(outcome, Outcome::Ai);
    }

    #[test]
    fn test_prediction_most_likely_breaks_ties_in_canonical_order() {
        let p = Prediction::from_weights([0.4, 0.4, 0.2]).unwrap();
        assert_eq!(p.most_likely(), Move::Rock);
        let p = Prediction::from_weights([0.1, 0.45, 0.45]).unwrap();
        assert_eq!(p.most_likely(), Move::Paper);
        assert_eq!(Prediction::uniform().most_likely(), Move::Rock);
    }

    #[test]
    fn test_prediction_from_weights_rejects_invalid() {
        assert!(Prediction::from_weights([0.0, 0.0, 0.0]).is_none());
        assert!(Prediction::from_weights([-1.0, 1.0, 1.0]).is_none());
        assert!(Prediction::from_weights([f64::NAN, 1.0, 1.0]).is_none());
        let p = Prediction::from_weights([2.0, 1.0, 1.0]).unwrap();
        assert!(p.is_normalized());
        assert!((p.probability(Move::Rock) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_round_serializes_camel_case() {
        let round = Round {
            human_move: Move::Rock,
            ai_move: Move::Paper,
            outcome: Outcome::Ai,
            sequence_number: 1,
            timestamp: 1_700_000_000_000,
        };
        let value = serde_json::to_value(&round).unwrap();
        assert_eq!(value["humanMove"], "rock");
        assert_eq!(value["aiMove"], "paper");
        assert_eq!(value["sequenceNumber"], 1);
    }

    #[test]
    fn test_move_counts_distribution() {
        let counts = MoveCounts::from_moves([Move::Rock, Move::Rock, Move::Scissors, Move::Paper]);
        assert_eq!(counts.total(), 4);
        assert_eq!(counts.get(Move::Rock), 2);
        let dist = counts.distribution().unwrap();
        assert!((dist.probability(Move::Rock) - 0.5).abs() < 1e-12);
        assert!(MoveCounts::default().distribution().is_none());
    }
}
