//! Classifier Module
//!
//! The forwarding classifier is a black box behind [`ForwardClassifier`].
//! The decision engine only reads the index-1 ("forward") probability, so a
//! model can be swapped or stubbed without touching the policy.
//!
//! ## Structure
//! - `vectorizer`: Event → TF-IDF vector over a fixed vocabulary
//! - `model`: JSON token model with checksum and layout checks

pub mod vectorizer;
pub mod model;

use serde::{Deserialize, Serialize};

use crate::logic::event::LogEvent;

pub use model::{ModelFile, TokenModel};
pub use vectorizer::{event_text, tokenize, vocabulary_hash, Vectorizer};

/// Class index meaning "must forward"
pub const FORWARD_CLASS: usize = 1;

/// Output for one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_class: usize,
    /// One probability per class, index 1 = forward
    pub probabilities: Vec<f32>,
}

impl Prediction {
    /// Two-class prediction from the forward probability
    pub fn binary(p_forward: f32) -> Self {
        let p = p_forward.clamp(0.0, 1.0);
        Self {
            predicted_class: if p >= 0.5 { FORWARD_CLASS } else { 0 },
            probabilities: vec![1.0 - p, p],
        }
    }

    /// Probability of the forward class, 0 when the model reports fewer classes
    pub fn forward_confidence(&self) -> f32 {
        self.probabilities
            .get(FORWARD_CLASS)
            .copied()
            .unwrap_or(0.0)
            .clamp(0.0, 1.0)
    }
}

/// Trained classifier capability injected into the forwarding policy
pub trait ForwardClassifier: Send + Sync {
    fn name(&self) -> &str;
    /// One prediction per input event, in order
    fn predict(&self, events: &[LogEvent]) -> Vec<Prediction>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_prediction() {
        let p = Prediction::binary(0.8);
        assert_eq!(p.predicted_class, FORWARD_CLASS);
        assert!((p.probabilities[0] - 0.2).abs() < 1e-6);
        assert_eq!(p.forward_confidence(), 0.8);
    }

    #[test]
    fn test_single_class_output_has_no_forward_confidence() {
        let p = Prediction {
            predicted_class: 0,
            probabilities: vec![1.0],
        };
        assert_eq!(p.forward_confidence(), 0.0);
    }
}
