use super::predictor::{
    Prediction, Predictor, PredictorError, PredictorOutput, UnavailableReason,
};
use super::scaler::FeatureScaler;
use crate::config::PredictorParams;
use crate::domain::ml::feature_registry::{FEATURE_COUNT, FEATURE_NAMES, FeatureVector, LabeledSample};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_classifier::{
    DecisionTreeClassifier, DecisionTreeClassifierParameters,
};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

type Tree = DecisionTreeClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>;

/// Accuracy figures produced by a training run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub version: u32,
    pub train_samples: usize,
    pub test_samples: usize,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
}

/// Immutable fitted model: bagged decision trees plus the scaler they were
/// trained behind. Shared read-only across scan workers.
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictorArtifact {
    pub version: u32,
    pub trained_at: DateTime<Utc>,
    pub feature_names: Vec<String>,
    pub report: TrainingReport,
    scaler: FeatureScaler,
    trees: Vec<Tree>,
}

impl PredictorArtifact {
    /// Fraction of trees voting for an up move
    fn up_probability(&self, row: &[f64]) -> Result<f64, PredictorError> {
        let scaled = self.scaler.transform(row)?;
        let matrix = DenseMatrix::from_2d_vec(&vec![scaled])
            .map_err(|e| PredictorError::Model(format!("Matrix creation failed: {}", e)))?;

        let mut up_votes = 0usize;
        for tree in &self.trees {
            let labels = tree
                .predict(&matrix)
                .map_err(|e| PredictorError::Model(format!("Prediction failed: {}", e)))?;
            if labels.first().copied() == Some(1) {
                up_votes += 1;
            }
        }
        if self.trees.is_empty() {
            return Err(PredictorError::Model("Ensemble has no trees".to_string()));
        }
        Ok(up_votes as f64 / self.trees.len() as f64)
    }

    fn classify(&self, row: &[f64]) -> Result<i32, PredictorError> {
        Ok(if self.up_probability(row)? > 0.5 { 1 } else { 0 })
    }

    /// Share of samples whose label the ensemble reproduces
    pub fn accuracy(&self, samples: &[LabeledSample]) -> Result<f64, PredictorError> {
        if samples.is_empty() {
            return Ok(0.0);
        }
        let mut correct = 0usize;
        for sample in samples {
            if self.classify(&sample.features)? == sample.label() {
                correct += 1;
            }
        }
        Ok(correct as f64 / samples.len() as f64)
    }

    fn check_layout(&self) -> Result<(), PredictorError> {
        let matches = self.feature_names.len() == FEATURE_COUNT
            && self
                .feature_names
                .iter()
                .zip(FEATURE_NAMES.iter())
                .all(|(a, b)| a == b);
        if !matches || self.scaler.width() != FEATURE_COUNT {
            return Err(PredictorError::InconsistentFeatures {
                expected: FEATURE_COUNT,
                got: self.feature_names.len(),
            });
        }
        Ok(())
    }
}

impl Predictor for PredictorArtifact {
    fn predict(&self, features: &FeatureVector) -> Prediction {
        let Some(row) = features.to_dense() else {
            return Prediction::Unavailable(UnavailableReason::IncompleteFeatures);
        };
        match self.up_probability(&row) {
            Ok(p) => Prediction::Available(PredictorOutput::from_probability(p)),
            Err(e) => Prediction::Unavailable(UnavailableReason::Model(e.to_string())),
        }
    }

    fn name(&self) -> &str {
        "SmartCore Bagged Trees"
    }

    fn version(&self) -> String {
        format!("v{}", self.version)
    }
}

#[derive(Debug, Clone)]
pub enum PredictorState {
    Untrained,
    Trained(Arc<PredictorArtifact>),
}

/// Owns the train -> evaluate -> predict lifecycle.
///
/// Training needs `&mut self` and swaps in a brand new artifact; inference
/// only ever reads the current one.
pub struct SmartcorePredictor {
    params: PredictorParams,
    state: PredictorState,
}

impl SmartcorePredictor {
    pub fn new(params: PredictorParams) -> Self {
        Self {
            params,
            state: PredictorState::Untrained,
        }
    }

    pub fn from_artifact(params: PredictorParams, artifact: PredictorArtifact) -> Self {
        Self {
            params,
            state: PredictorState::Trained(Arc::new(artifact)),
        }
    }

    pub fn state(&self) -> &PredictorState {
        &self.state
    }

    pub fn is_trained(&self) -> bool {
        matches!(self.state, PredictorState::Trained(_))
    }

    /// Current artifact, for sharing with scan workers
    pub fn artifact(&self) -> Option<Arc<PredictorArtifact>> {
        match &self.state {
            PredictorState::Trained(artifact) => Some(Arc::clone(artifact)),
            PredictorState::Untrained => None,
        }
    }

    pub fn train(&mut self, samples: &[LabeledSample]) -> Result<TrainingReport, PredictorError> {
        let required = self.params.min_training_samples;
        if samples.len() < required {
            warn!(
                "Not enough data to train predictor: {} samples, {} required",
                samples.len(),
                required
            );
            return Err(PredictorError::InsufficientSamples {
                got: samples.len(),
                required,
            });
        }

        let mut rng = StdRng::seed_from_u64(self.params.seed);

        // Seeded shuffle, then hold out the test fraction
        let mut order: Vec<usize> = (0..samples.len()).collect();
        order.shuffle(&mut rng);
        let test_len = ((samples.len() as f64) * self.params.test_fraction).ceil() as usize;
        let test_len = test_len.min(samples.len() - 1);
        let (test_idx, train_idx) = order.split_at(test_len);
        let train: Vec<LabeledSample> = train_idx.iter().map(|i| samples[*i]).collect();
        let test: Vec<LabeledSample> = test_idx.iter().map(|i| samples[*i]).collect();

        let train_rows: Vec<Vec<f64>> = train.iter().map(|s| s.features.to_vec()).collect();
        let train_labels: Vec<i32> = train.iter().map(LabeledSample::label).collect();
        let scaler = FeatureScaler::fit(&train_rows)?;
        let scaled = scaler.transform_all(&train_rows)?;

        let tree_params = DecisionTreeClassifierParameters::default()
            .with_max_depth(self.params.max_depth)
            .with_min_samples_split(self.params.min_samples_split);

        let mut trees = Vec::with_capacity(self.params.n_trees);
        for _ in 0..self.params.n_trees {
            // Bootstrap sample with replacement
            let picks: Vec<usize> = (0..scaled.len())
                .map(|_| rng.random_range(0..scaled.len()))
                .collect();
            let x: Vec<Vec<f64>> = picks.iter().map(|i| scaled[*i].clone()).collect();
            let y: Vec<i32> = picks.iter().map(|i| train_labels[*i]).collect();

            let matrix = DenseMatrix::from_2d_vec(&x)
                .map_err(|e| PredictorError::Model(format!("Matrix creation failed: {}", e)))?;
            let tree = DecisionTreeClassifier::fit(&matrix, &y, tree_params.clone())
                .map_err(|e| PredictorError::Model(format!("Tree fit failed: {}", e)))?;
            trees.push(tree);
        }

        let version = match &self.state {
            PredictorState::Trained(previous) => previous.version + 1,
            PredictorState::Untrained => 1,
        };

        let mut artifact = PredictorArtifact {
            version,
            trained_at: Utc::now(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            report: TrainingReport {
                version,
                train_samples: train.len(),
                test_samples: test.len(),
                train_accuracy: 0.0,
                test_accuracy: 0.0,
            },
            scaler,
            trees,
        };
        artifact.report.train_accuracy = artifact.accuracy(&train)?;
        artifact.report.test_accuracy = artifact.accuracy(&test)?;

        let report = artifact.report;
        info!(
            "Predictor v{} trained on {} samples - Train accuracy: {:.3}, Test accuracy: {:.3}",
            version, report.train_samples, report.train_accuracy, report.test_accuracy
        );

        self.state = PredictorState::Trained(Arc::new(artifact));
        Ok(report)
    }

    /// Accuracy of the current artifact on labeled samples
    pub fn evaluate(&self, samples: &[LabeledSample]) -> Result<f64, PredictorError> {
        match &self.state {
            PredictorState::Trained(artifact) => artifact.accuracy(samples),
            PredictorState::Untrained => Err(PredictorError::Untrained),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PredictorError> {
        let PredictorState::Trained(artifact) = &self.state else {
            return Err(PredictorError::Untrained);
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, artifact.as_ref())?;
        info!("Saved predictor v{} to {:?}", artifact.version, path);
        Ok(())
    }

    pub fn load(path: &Path, params: PredictorParams) -> Result<Self, PredictorError> {
        let reader = BufReader::new(File::open(path)?);
        let artifact: PredictorArtifact = serde_json::from_reader(reader)?;
        artifact.check_layout()?;
        info!(
            "Successfully loaded predictor v{} from {:?}",
            artifact.version, path
        );
        Ok(Self::from_artifact(params, artifact))
    }
}

impl Predictor for SmartcorePredictor {
    fn predict(&self, features: &FeatureVector) -> Prediction {
        match &self.state {
            PredictorState::Trained(artifact) => artifact.predict(features),
            PredictorState::Untrained => Prediction::Unavailable(UnavailableReason::Untrained),
        }
    }

    fn name(&self) -> &str {
        "SmartCore Bagged Trees"
    }

    fn version(&self) -> String {
        match &self.state {
            PredictorState::Trained(artifact) => format!("v{}", artifact.version),
            PredictorState::Untrained => "untrained".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    /// Label depends on the sign of the first feature
    fn separable_samples(n: usize, seed: u64) -> Vec<LabeledSample> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                let mut features = [0.0; FEATURE_COUNT];
                for f in features.iter_mut() {
                    *f = rng.random_range(-1.0..1.0);
                }
                let next_return = if features[0] > 0.0 { 0.01 } else { -0.01 };
                LabeledSample {
                    features,
                    next_return,
                }
            })
            .collect()
    }

    fn small_params() -> PredictorParams {
        PredictorParams {
            n_trees: 15,
            max_depth: 4,
            ..PredictorParams::default()
        }
    }

    #[test]
    fn test_untrained_predictor_is_unavailable() {
        let predictor = SmartcorePredictor::new(small_params());
        let features = FeatureVector::new([Some(0.0); FEATURE_COUNT]);
        assert_eq!(
            predictor.predict(&features),
            Prediction::Unavailable(UnavailableReason::Untrained)
        );
        assert!(matches!(
            predictor.evaluate(&[]),
            Err(PredictorError::Untrained)
        ));
    }

    #[test]
    fn test_refuses_to_train_below_minimum() {
        let mut predictor = SmartcorePredictor::new(small_params());
        let result = predictor.train(&separable_samples(99, 1));
        assert!(matches!(
            result,
            Err(PredictorError::InsufficientSamples {
                got: 99,
                required: 100
            })
        ));
        assert!(!predictor.is_trained());
    }

    #[test]
    fn test_train_evaluate_predict() {
        let mut predictor = SmartcorePredictor::new(small_params());
        let report = predictor.train(&separable_samples(300, 2)).unwrap();

        assert_eq!(report.version, 1);
        assert_eq!(report.test_samples, 60);
        assert_eq!(report.train_samples, 240);
        assert!(report.train_accuracy > 0.9);

        let accuracy = predictor.evaluate(&separable_samples(200, 3)).unwrap();
        assert!(accuracy > 0.8, "accuracy {}", accuracy);

        let mut up = [Some(0.0); FEATURE_COUNT];
        up[0] = Some(0.9);
        let output = predictor
            .predict(&FeatureVector::new(up))
            .output()
            .unwrap();
        assert!(output.probability > 0.5);
        assert!((0.5..=1.0).contains(&output.confidence));
    }

    #[test]
    fn test_incomplete_features_are_unavailable() {
        let mut predictor = SmartcorePredictor::new(small_params());
        predictor.train(&separable_samples(150, 4)).unwrap();

        let mut values = [Some(0.1); FEATURE_COUNT];
        values[5] = None;
        assert_eq!(
            predictor.predict(&FeatureVector::new(values)),
            Prediction::Unavailable(UnavailableReason::IncompleteFeatures)
        );
    }

    #[test]
    fn test_retraining_bumps_version_and_keeps_old_artifact_intact() {
        let mut predictor = SmartcorePredictor::new(small_params());
        predictor.train(&separable_samples(150, 5)).unwrap();
        let first = predictor.artifact().unwrap();

        predictor.train(&separable_samples(150, 6)).unwrap();
        let second = predictor.artifact().unwrap();

        assert_eq!(first.version, 1);
        assert_eq!(second.version, 2);
        assert_eq!(predictor.version(), "v2");
    }

    #[test]
    fn test_training_is_deterministic() {
        let samples = separable_samples(150, 7);
        let mut a = SmartcorePredictor::new(small_params());
        let mut b = SmartcorePredictor::new(small_params());
        let ra = a.train(&samples).unwrap();
        let rb = b.train(&samples).unwrap();
        assert_eq!(ra, rb);

        let probe = FeatureVector::new([Some(0.3); FEATURE_COUNT]);
        assert_eq!(a.predict(&probe), b.predict(&probe));
    }

    #[test]
    fn test_save_and_load_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("predictor.json");

        let mut predictor = SmartcorePredictor::new(small_params());
        predictor.train(&separable_samples(150, 8)).unwrap();
        predictor.save(&path).unwrap();

        let loaded = SmartcorePredictor::load(&path, small_params()).unwrap();
        let probe = FeatureVector::new([Some(-0.4); FEATURE_COUNT]);
        assert_eq!(loaded.predict(&probe), predictor.predict(&probe));
        assert_eq!(loaded.version(), "v1");
    }

    #[test]
    fn test_saving_untrained_fails() {
        let dir = tempfile::tempdir().unwrap();
        let predictor = SmartcorePredictor::new(small_params());
        assert!(matches!(
            predictor.save(&dir.path().join("x.json")),
            Err(PredictorError::Untrained)
        ));
    }
}
