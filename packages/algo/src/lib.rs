//! # rps-algo - rock-paper-scissors prediction core
//!
//! Pure Rust building blocks of the adaptive opponent:
//!
//! - **Move Codec** - one-hot encoding of moves and move windows
//! - **Outcome Judge** - the canonical beats-relation
//! - **Move Classifier** - trait-based prediction capability with an MLP backend
//! - **Move Selector** - counter-the-prediction with exploration
//! - **Training Data Builder** - (window, next move) samples from history
//!
//! ## Modules
//!
//! - [`codec`] - encode/decode moves and windows
//! - [`judge`] - outcome table, `Move::beats`, `Move::counter`
//! - [`classifier`] - `MoveClassifier` / `ClassifierBackend` traits and options
//! - [`mlp`] - feed-forward classifier trained with Adam
//! - [`selector`] - AI move selection
//! - [`training`] - training set construction
//! - [`sanitize`] - numerical stability helpers
//! - [`types`] - shared types and constants
//!
//! ## Example
//!
//! ```rust
//! use rps_algo::{encode_window, judge, select_ai_move, Exploration, Move, Outcome, Prediction};
//! use rand::SeedableRng;
//!
//! let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
//! let window = encode_window(&[Move::Rock, Move::Rock, Move::Rock], 3).unwrap();
//! assert_eq!(window.len(), 9);
//!
//! let prediction = Prediction::from_weights([0.9, 0.05, 0.05]).unwrap();
//! let ai = select_ai_move(&prediction, 0.0, &Exploration::Uniform, &mut rng);
//! assert_eq!(ai, Move::Paper);
//! assert_eq!(judge(Move::Rock, ai), Outcome::Ai);
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod sanitize;
pub mod types;
pub mod codec;
pub mod judge;
pub mod classifier;
pub mod mlp;
pub mod selector;
pub mod training;

// ============================================================================
// Re-exports
// ============================================================================

pub use types::*;

pub use codec::{decode_index, decode_one_hot, encode_one_hot, encode_window, feature_dim, CodecError};

pub use judge::{judge, OUTCOME_TABLE};

pub use classifier::{
    Architecture, ClassifierBackend, ClassifierBlob, ClassifierError, FitOptions, FitReport,
    MoveClassifier,
};

pub use mlp::{MlpBackend, MlpClassifier, MLP_FORMAT};

pub use selector::{random_move, select_ai_move, weighted_move, Exploration};

pub use training::{build_training_set, build_training_set_from_moves, recent};
