use std::path::Path;

use serde::Deserialize;

use super::{FeatureVector, PredictionError};

/// Pre-trained classifier abstraction.
///
/// Implementations must be safe to call from many request threads; those
/// backed by a runtime that needs exclusive access serialize internally.
pub trait Classifier: Send + Sync {
    /// Predict one label index for one encoded vector.
    fn predict(&self, features: &FeatureVector) -> Result<usize, PredictionError>;
    /// Expected feature count, when the artifact declares it.
    fn input_dim(&self) -> Option<usize>;
    /// Number of distinct labels the artifact can emit, when known.
    fn label_count(&self) -> Option<usize>;
}

// ═══════════════════════════════════════════════════════════
// Inference engine: loaded once, read-only afterwards
// ═══════════════════════════════════════════════════════════

pub struct InferenceEngine {
    classifier: Box<dyn Classifier>,
    source: String,
}

impl InferenceEngine {
    pub fn new(classifier: Box<dyn Classifier>, source: impl Into<String>) -> Self {
        Self {
            classifier,
            source: source.into(),
        }
    }

    /// Load the artifact at `path`. `.onnx` files need the `onnx-model`
    /// feature; anything else is read as a JSON linear model.
    pub fn load(path: &Path) -> Result<Self, PredictionError> {
        tracing::info!(model = %path.display(), "Loading inference model");
        if !path.is_file() {
            return Err(PredictionError::ModelUnavailable(format!(
                "Model file not found at {}",
                path.display()
            )));
        }

        let is_onnx = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("onnx"));

        let classifier: Box<dyn Classifier> = if is_onnx {
            load_onnx(path)?
        } else {
            Box::new(LinearClassifier::from_file(path)?)
        };

        tracing::info!(
            model = %path.display(),
            input_dim = ?classifier.input_dim(),
            labels = ?classifier.label_count(),
            "Model loaded successfully"
        );
        Ok(Self::new(classifier, path.display().to_string()))
    }

    /// Run the classifier after checking the vector against the declared
    /// input dimension.
    pub fn predict(&self, features: &FeatureVector) -> Result<usize, PredictionError> {
        if let Some(expected) = self.classifier.input_dim() {
            if expected != features.len() {
                return Err(PredictionError::DimensionMismatch {
                    expected,
                    actual: features.len(),
                });
            }
        }
        self.classifier.predict(features)
    }

    pub fn input_dim(&self) -> Option<usize> {
        self.classifier.input_dim()
    }

    pub fn label_count(&self) -> Option<usize> {
        self.classifier.label_count()
    }

    /// Where the artifact came from, for diagnostics.
    pub fn source(&self) -> &str {
        &self.source
    }
}

#[cfg(feature = "onnx-model")]
fn load_onnx(path: &Path) -> Result<Box<dyn Classifier>, PredictionError> {
    Ok(Box::new(OnnxClassifier::load(path)?))
}

#[cfg(not(feature = "onnx-model"))]
fn load_onnx(path: &Path) -> Result<Box<dyn Classifier>, PredictionError> {
    Err(PredictionError::ModelUnavailable(format!(
        "{} is an ONNX model but this build lacks the `onnx-model` feature",
        path.display()
    )))
}

// ═══════════════════════════════════════════════════════════
// Linear model artifact (JSON)
// ═══════════════════════════════════════════════════════════

/// How per-row decision values combine into one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStrategy {
    /// One row per class; highest score wins.
    OneVsRest,
    /// One row per class pair `(i, j)`, `i < j`, in lexicographic order.
    /// A positive decision votes for `i`, otherwise for `j`.
    OneVsOne,
}

/// Serialized form of a linear classifier exported by the offline trainer.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearModelArtifact {
    pub strategy: DecisionStrategy,
    pub n_features: usize,
    /// Label index emitted for each class position.
    pub classes: Vec<usize>,
    pub coefficients: Vec<Vec<f32>>,
    pub intercepts: Vec<f32>,
}

/// Linear decision-function classifier (linear-kernel SVM or logistic
/// regression hyper-planes).
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    strategy: DecisionStrategy,
    n_features: usize,
    classes: Vec<usize>,
    coefficients: Vec<Vec<f32>>,
    intercepts: Vec<f32>,
}

impl LinearClassifier {
    pub fn from_file(path: &Path) -> Result<Self, PredictionError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PredictionError::ModelUnavailable(format!("Failed to read {}: {e}", path.display()))
        })?;
        let artifact: LinearModelArtifact = serde_json::from_str(&raw).map_err(|e| {
            PredictionError::ModelUnavailable(format!("Failed to parse {}: {e}", path.display()))
        })?;
        Self::from_artifact(artifact)
    }

    /// Validate shapes and build the classifier.
    pub fn from_artifact(artifact: LinearModelArtifact) -> Result<Self, PredictionError> {
        let k = artifact.classes.len();
        let expected_rows = match artifact.strategy {
            DecisionStrategy::OneVsRest => k,
            DecisionStrategy::OneVsOne => k * k.saturating_sub(1) / 2,
        };
        let min_classes = match artifact.strategy {
            DecisionStrategy::OneVsRest => 1,
            DecisionStrategy::OneVsOne => 2,
        };

        if k < min_classes {
            return Err(invalid(format!(
                "{:?} needs at least {min_classes} classes, artifact has {k}",
                artifact.strategy
            )));
        }
        if artifact.coefficients.len() != expected_rows {
            return Err(invalid(format!(
                "expected {expected_rows} coefficient rows, found {}",
                artifact.coefficients.len()
            )));
        }
        if artifact.intercepts.len() != expected_rows {
            return Err(invalid(format!(
                "expected {expected_rows} intercepts, found {}",
                artifact.intercepts.len()
            )));
        }
        if let Some((row, coef)) = artifact
            .coefficients
            .iter()
            .enumerate()
            .find(|(_, c)| c.len() != artifact.n_features)
        {
            return Err(invalid(format!(
                "coefficient row {row} has {} entries, n_features is {}",
                coef.len(),
                artifact.n_features
            )));
        }

        Ok(Self {
            strategy: artifact.strategy,
            n_features: artifact.n_features,
            classes: artifact.classes,
            coefficients: artifact.coefficients,
            intercepts: artifact.intercepts,
        })
    }

    fn decision(&self, row: usize, x: &[f32]) -> f32 {
        let dot: f32 = self.coefficients[row]
            .iter()
            .zip(x)
            .map(|(w, v)| w * v)
            .sum();
        dot + self.intercepts[row]
    }

    /// Winning class position; ties go to the lowest position.
    fn winning_position(&self, x: &[f32]) -> usize {
        match self.strategy {
            DecisionStrategy::OneVsRest => {
                let mut best = 0;
                let mut best_score = f32::NEG_INFINITY;
                for row in 0..self.classes.len() {
                    let score = self.decision(row, x);
                    if score > best_score {
                        best = row;
                        best_score = score;
                    }
                }
                best
            }
            DecisionStrategy::OneVsOne => {
                let k = self.classes.len();
                let mut votes = vec![0u32; k];
                let mut row = 0;
                for i in 0..k {
                    for j in (i + 1)..k {
                        if self.decision(row, x) > 0.0 {
                            votes[i] += 1;
                        } else {
                            votes[j] += 1;
                        }
                        row += 1;
                    }
                }
                let mut best = 0;
                for (position, &count) in votes.iter().enumerate() {
                    if count > votes[best] {
                        best = position;
                    }
                }
                best
            }
        }
    }
}

impl Classifier for LinearClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<usize, PredictionError> {
        if features.len() != self.n_features {
            return Err(PredictionError::DimensionMismatch {
                expected: self.n_features,
                actual: features.len(),
            });
        }
        let position = self.winning_position(features.as_slice());
        Ok(self.classes[position])
    }

    fn input_dim(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn label_count(&self) -> Option<usize> {
        Some(self.classes.len())
    }
}

fn invalid(detail: String) -> PredictionError {
    PredictionError::ModelUnavailable(format!("Invalid linear model artifact: {detail}"))
}

// ═══════════════════════════════════════════════════════════
// ONNX classifier: behind `onnx-model` feature
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx-model")]
mod onnx {
    use super::{Classifier, FeatureVector, PredictionError};
    use ort::session::Session;
    use std::path::Path;
    use std::sync::Mutex;

    /// Classifier exported to ONNX (float input `[1, n_features]`, first
    /// output an `int64` label tensor).
    ///
    /// `Session::run` needs `&mut self`, so the session sits behind a Mutex
    /// and inference calls are serialized.
    pub struct OnnxClassifier {
        session: Mutex<Session>,
    }

    impl OnnxClassifier {
        pub fn load(path: &Path) -> Result<Self, PredictionError> {
            let session = Session::builder()
                .map_err(|e: ort::Error| PredictionError::ModelUnavailable(e.to_string()))?
                .with_intra_threads(1)
                .map_err(|e: ort::Error| PredictionError::ModelUnavailable(e.to_string()))?
                .commit_from_file(path)
                .map_err(|e: ort::Error| {
                    PredictionError::ModelUnavailable(format!("ONNX load failed: {e}"))
                })?;

            tracing::info!("ONNX classifier loaded from {}", path.display());

            Ok(Self {
                session: Mutex::new(session),
            })
        }
    }

    impl Classifier for OnnxClassifier {
        fn predict(&self, features: &FeatureVector) -> Result<usize, PredictionError> {
            use ort::value::TensorRef;

            let input =
                ndarray::Array2::from_shape_vec((1, features.len()), features.as_slice().to_vec())
                    .map_err(|e| PredictionError::Inference(e.to_string()))?;
            let tensor = TensorRef::from_array_view(&input)
                .map_err(|e| PredictionError::Inference(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| PredictionError::Inference("Session lock poisoned".to_string()))?;

            let outputs = session
                .run(ort::inputs![tensor])
                .map_err(|e| PredictionError::Inference(format!("ONNX inference failed: {e}")))?;

            let (_shape, labels) = outputs[0]
                .try_extract_tensor::<i64>()
                .map_err(|e| PredictionError::Inference(format!("Output extraction: {e}")))?;

            let label = labels
                .first()
                .copied()
                .ok_or_else(|| PredictionError::Inference("Empty label output".to_string()))?;
            usize::try_from(label)
                .map_err(|_| PredictionError::Inference(format!("Negative label {label}")))
        }

        // The graph's declared shapes are not read back; the startup
        // integrity check is skipped for ONNX artifacts.
        fn input_dim(&self) -> Option<usize> {
            None
        }

        fn label_count(&self) -> Option<usize> {
            None
        }
    }
}

#[cfg(feature = "onnx-model")]
pub use onnx::OnnxClassifier;

// ═══════════════════════════════════════════════════════════
// Stub classifiers for tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
pub(crate) mod stubs {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::{Classifier, FeatureVector, PredictionError};

    type LabelFn = Box<dyn Fn(&FeatureVector) -> usize + Send + Sync>;

    /// Classifier driven by a closure, counting every call.
    pub struct StubClassifier {
        label: LabelFn,
        dims: Option<(usize, usize)>,
        calls: Arc<AtomicUsize>,
    }

    impl StubClassifier {
        pub fn from_fn(label: impl Fn(&FeatureVector) -> usize + Send + Sync + 'static) -> Self {
            Self {
                label: Box::new(label),
                dims: None,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn constant(label: usize) -> Self {
            Self::from_fn(move |_| label)
        }

        pub fn with_dims(mut self, input_dim: usize, label_count: usize) -> Self {
            self.dims = Some((input_dim, label_count));
            self
        }

        /// Shared call counter, readable after the stub is boxed away.
        pub fn calls(&self) -> Arc<AtomicUsize> {
            Arc::clone(&self.calls)
        }
    }

    impl Classifier for StubClassifier {
        fn predict(&self, features: &FeatureVector) -> Result<usize, PredictionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((self.label)(features))
        }

        fn input_dim(&self) -> Option<usize> {
            self.dims.map(|(input, _)| input)
        }

        fn label_count(&self) -> Option<usize> {
            self.dims.map(|(_, labels)| labels)
        }
    }
}
