//! Data Sanitization
//!
//! Numerical stability utilities.
//!
//! Functions:
//! - Non-finite value detection
//! - Stable softmax
//! - Probability clamping for the cross-entropy loss

use crate::types::EPSILON;

/// Check whether a slice contains invalid values (NaN or Inf)
pub fn has_invalid_values(arr: &[f64]) -> bool {
    arr.iter().any(|&x| x.is_nan() || x.is_infinite())
}

/// Softmax with the max-logit shift. Falls back to uniform when the
/// exponentials degenerate.
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    if logits.is_empty() {
        return Vec::new();
    }
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|&z| (z - max).exp()).collect();
    let sum: f64 = exps.iter().sum();

    if sum == 0.0 || !sum.is_finite() {
        return vec![1.0 / logits.len() as f64; logits.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}

/// `-ln(p)` with `p` clamped away from zero
pub fn cross_entropy(p: f64) -> f64 {
    -p.max(EPSILON).ln()
}

/// Clamp an exploration-style probability into `[0, 1]`; NaN becomes 0.
pub fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}
