pub mod predictor;
pub mod scaler;
pub mod smartcore_predictor;

pub use predictor::{Prediction, Predictor, PredictorError, PredictorOutput, UnavailableReason};
pub use smartcore_predictor::{PredictorArtifact, SmartcorePredictor, TrainingReport};
