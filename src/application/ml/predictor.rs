use crate::domain::ml::feature_registry::FeatureVector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("Insufficient training samples: {got} < {required}")]
    InsufficientSamples { got: usize, required: usize },

    #[error("Inconsistent features: expected {expected}, got {got}")]
    InconsistentFeatures { expected: usize, got: usize },

    #[error("Predictor has not been trained")]
    Untrained,

    #[error("Model error: {0}")]
    Model(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Up-move probability and the classifier's confidence in its call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictorOutput {
    /// Probability of an up move, in [0, 1]
    pub probability: f64,
    /// `max(probability, 1 - probability)`
    pub confidence: f64,
}

impl PredictorOutput {
    pub fn from_probability(probability: f64) -> Self {
        let probability = if probability.is_finite() {
            probability.clamp(0.0, 1.0)
        } else {
            0.5
        };
        Self {
            probability,
            confidence: probability.max(1.0 - probability),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnavailableReason {
    Untrained,
    IncompleteFeatures,
    Model(String),
}

/// A missing prediction is a normal outcome, not an error
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    Available(PredictorOutput),
    Unavailable(UnavailableReason),
}

impl Prediction {
    pub fn output(&self) -> Option<PredictorOutput> {
        match self {
            Prediction::Available(output) => Some(*output),
            Prediction::Unavailable(_) => None,
        }
    }
}

/// Interface for learned up/down classifiers.
/// Inference takes `&self`; implementations must not mutate during a scan.
pub trait Predictor: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Prediction;

    /// Get model name/type
    fn name(&self) -> &str;

    /// Get model version/id
    fn version(&self) -> String;
}
