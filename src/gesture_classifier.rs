use std::path::Path;

use thiserror::Error;

use crate::model::{Model, ModelError};
use crate::trainer::{normalize_with, stable_softmax};
use crate::types::PredictionResult;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("model has no labels, cannot classify")]
    EmptyModel,

    #[error("invalid feature size: expected {expected}, got {actual}")]
    InvalidFeatureSize { expected: usize, actual: usize },
}

/// Predictor softmax sobre un modelo entrenado.
/// Aplica la misma normalización congelada y el mismo softmax estable que el
/// entrenador.
pub struct GestureClassifier {
    model: Model,
}

impl GestureClassifier {
    pub fn new(model: Model) -> Result<Self, ClassifierError> {
        if model.labels.is_empty() {
            return Err(ClassifierError::EmptyModel);
        }
        Ok(Self { model })
    }

    /// Carga y valida un modelo desde un fichero JSON
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let model = Model::from_file(path)?;
        Self::new(model)
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn labels(&self) -> &[String] {
        &self.model.labels
    }

    /// Clasifica un vector de características crudo (sin normalizar).
    /// Devuelve la distribución completa ordenada de mayor a menor confianza.
    pub fn predict(&self, raw_features: &[f32]) -> Result<PredictionResult, ClassifierError> {
        let expected = self.model.num_features();
        if raw_features.len() != expected {
            return Err(ClassifierError::InvalidFeatureSize {
                expected,
                actual: raw_features.len(),
            });
        }

        let x = normalize_with(
            raw_features,
            &self.model.feature_means,
            &self.model.feature_std,
        );

        let logits: Vec<f32> = self
            .model
            .weights
            .iter()
            .zip(self.model.biases.iter())
            .map(|(row, &b)| row.iter().zip(x.iter()).map(|(w, v)| w * v).sum::<f32>() + b)
            .collect();
        let probs = stable_softmax(&logits);

        let scores: Vec<(String, f32)> = self
            .model
            .labels
            .iter()
            .cloned()
            .zip(probs.into_iter())
            .collect();

        PredictionResult::from_scores(scores).ok_or(ClassifierError::EmptyModel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;

    fn two_label_model() -> Model {
        Model {
            labels: vec!["maps".to_string(), "whatsapp".to_string()],
            feature_names: vec!["f0".to_string(), "f1".to_string()],
            feature_means: vec![0.0, 0.0],
            feature_std: vec![1.0, 1.0],
            // "maps" responde a f0, "whatsapp" a f1
            weights: vec![vec![2.0, 0.0], vec![0.0, 2.0]],
            biases: vec![0.0, 0.0],
            trained_at: 0,
            training_samples: 4,
            loss_history: vec![],
        }
    }

    #[test]
    fn test_predict_picks_dominant_feature() {
        let classifier = GestureClassifier::new(two_label_model()).unwrap();

        let result = classifier.predict(&[3.0, 0.0]).unwrap();
        assert_eq!(result.label, "maps");
        assert!(result.confidence > 0.5);

        let result = classifier.predict(&[0.0, 3.0]).unwrap();
        assert_eq!(result.label, "whatsapp");
    }

    #[test]
    fn test_distribution_sums_to_one_and_descends() {
        let classifier = GestureClassifier::new(two_label_model()).unwrap();
        let result = classifier.predict(&[1.0, 0.5]).unwrap();

        let sum: f32 = result.distribution.iter().map(|(_, c)| c).sum();
        assert!((sum - 1.0).abs() < 1e-5);
        for pair in result.distribution.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn test_feature_size_mismatch() {
        let classifier = GestureClassifier::new(two_label_model()).unwrap();
        let err = classifier.predict(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::InvalidFeatureSize {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_empty_model_rejected() {
        let mut model = two_label_model();
        model.labels.clear();
        model.weights.clear();
        model.biases.clear();
        assert!(matches!(
            GestureClassifier::new(model),
            Err(ClassifierError::EmptyModel)
        ));
    }

    #[test]
    fn test_normalization_applied() {
        let mut model = two_label_model();
        // Con media 10 en f0, un valor crudo de 10 queda en 0 tras normalizar
        model.feature_means = vec![10.0, 0.0];
        let classifier = GestureClassifier::new(model).unwrap();

        let result = classifier.predict(&[10.0, 0.0]).unwrap();
        // Ambos logits en 0: distribución uniforme
        assert!((result.confidence - 0.5).abs() < 1e-5);
    }
}
