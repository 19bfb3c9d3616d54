//! Outcome Judge
//!
//! The single beats-relation of the game. Every other component derives
//! winners and counters from [`OUTCOME_TABLE`].

use crate::types::{Move, Outcome, MOVE_COUNT};

/// `OUTCOME_TABLE[human][ai]`, indexed in canonical move order.
pub const OUTCOME_TABLE: [[Outcome; MOVE_COUNT]; MOVE_COUNT] = [
    // human = rock
    [Outcome::Tie, Outcome::Ai, Outcome::Human],
    // human = paper
    [Outcome::Human, Outcome::Tie, Outcome::Ai],
    // human = scissors
    [Outcome::Ai, Outcome::Human, Outcome::Tie],
];

pub fn judge(human: Move, ai: Move) -> Outcome {
    OUTCOME_TABLE[human.index()][ai.index()]
}

impl Move {
    /// Whether `self` wins against `other`.
    pub fn beats(self, other: Move) -> bool {
        judge(self, other) == Outcome::Human
    }

    /// The move that beats `self`.
    pub fn counter(self) -> Move {
        Move::ALL
            .into_iter()
            .find(|candidate| candidate.beats(self))
            .unwrap_or(self)
    }
}
