//! Training Data Builder
//!
//! Converts a move history into supervised (window, next move) samples.

use crate::codec::{encode_one_hot, encode_window};
use crate::types::{Move, Round, TrainingSample};

/// Samples from the human moves of `rounds`, in chronological order.
pub fn build_training_set(rounds: &[Round], window_size: usize) -> Vec<TrainingSample> {
    let moves: Vec<Move> = rounds.iter().map(|r| r.human_move).collect();
    build_training_set_from_moves(&moves, window_size)
}

/// One sample per position `i` in `0..len - window_size`: the window
/// `moves[i..i + window_size]` labelled with `moves[i + window_size]`.
/// Empty when `len <= window_size`.
pub fn build_training_set_from_moves(moves: &[Move], window_size: usize) -> Vec<TrainingSample> {
    if window_size == 0 || moves.len() <= window_size {
        return Vec::new();
    }

    moves
        .windows(window_size + 1)
        .filter_map(|slice| {
            let target = slice[window_size];
            let input = encode_window(&slice[..window_size], window_size).ok()?;
            Some(TrainingSample {
                input,
                label: encode_one_hot(target),
                target,
            })
        })
        .collect()
}

/// The trailing `cap` rounds.
pub fn recent(rounds: &[Round], cap: usize) -> &[Round] {
    &rounds[rounds.len().saturating_sub(cap)..]
}
