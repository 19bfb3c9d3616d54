//! Move Selector
//!
//! Turns a prediction of the human's next move into the AI's move: play the
//! counter of the most likely human move, except on exploration rounds.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sanitize::clamp_probability;
use crate::types::{Move, MoveCounts, Prediction};

/// What to do on an exploration round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Exploration {
    /// Uniformly random move
    #[default]
    Uniform,
    /// Counter of a human move drawn from the observed frequencies
    CounterFrequency(MoveCounts),
}

/// Uniformly random move.
pub fn random_move<R: Rng + ?Sized>(rng: &mut R) -> Move {
    Move::ALL[rng.gen_range(0..Move::ALL.len())]
}

/// Draw a move with probability proportional to `counts`.
/// Returns `None` when nothing was observed.
pub fn weighted_move<R: Rng + ?Sized>(counts: &MoveCounts, rng: &mut R) -> Option<Move> {
    let total = counts.total();
    if total == 0 {
        return None;
    }
    let mut ticket = rng.gen_range(0..total);
    for mv in Move::ALL {
        let weight = counts.get(mv);
        if ticket < weight {
            return Some(mv);
        }
        ticket -= weight;
    }
    None
}

pub fn select_ai_move<R: Rng + ?Sized>(
    prediction: &Prediction,
    exploration_rate: f64,
    exploration: &Exploration,
    rng: &mut R,
) -> Move {
    let rate = clamp_probability(exploration_rate);
    if rate > 0.0 && rng.gen::<f64>() < rate {
        return match exploration {
            Exploration::Uniform => random_move(rng),
            Exploration::CounterFrequency(counts) => weighted_move(counts, rng)
                .map(Move::counter)
                .unwrap_or_else(|| random_move(rng)),
        };
    }
    prediction.most_likely().counter()
}
