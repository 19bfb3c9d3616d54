//! Move Codec
//!
//! One-hot encoding of moves and flattening of move windows into
//! classifier input.

use thiserror::Error;

use crate::types::{FeatureVector, Move, MOVE_COUNT};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("insufficient history: need {required} moves, have {available}")]
    InsufficientHistory { required: usize, available: usize },
    #[error("window size must be at least 1")]
    InvalidWindow,
    #[error("not a one-hot vector")]
    NotOneHot,
}

/// `[1,0,0]` rock, `[0,1,0]` paper, `[0,0,1]` scissors
pub fn encode_one_hot(mv: Move) -> [f64; MOVE_COUNT] {
    let mut encoded = [0.0; MOVE_COUNT];
    encoded[mv.index()] = 1.0;
    encoded
}

pub fn decode_one_hot(vector: &[f64]) -> Result<Move, CodecError> {
    if vector.len() != MOVE_COUNT {
        return Err(CodecError::NotOneHot);
    }
    let mut hot = None;
    for (i, &v) in vector.iter().enumerate() {
        if v == 1.0 {
            if hot.is_some() {
                return Err(CodecError::NotOneHot);
            }
            hot = Some(i);
        } else if v != 0.0 {
            return Err(CodecError::NotOneHot);
        }
    }
    hot.and_then(Move::from_index).ok_or(CodecError::NotOneHot)
}

/// Class index of a classifier output back to a move.
pub fn decode_index(index: usize) -> Option<Move> {
    Move::from_index(index)
}

/// Encode the trailing `window_size` moves of `moves`, oldest first.
pub fn encode_window(moves: &[Move], window_size: usize) -> Result<FeatureVector, CodecError> {
    if window_size == 0 {
        return Err(CodecError::InvalidWindow);
    }
    if moves.len() < window_size {
        return Err(CodecError::InsufficientHistory {
            required: window_size,
            available: moves.len(),
        });
    }

    let window = &moves[moves.len() - window_size..];
    let mut values = Vec::with_capacity(window_size * MOVE_COUNT);
    for &mv in window {
        values.extend_from_slice(&encode_one_hot(mv));
    }
    Ok(FeatureVector::new(values))
}

/// Width of the feature vector for a given window.
pub fn feature_dim(window_size: usize) -> usize {
    window_size * MOVE_COUNT
}
