use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model has no labels")]
    NoLabels,

    #[error("model label '{0}' is duplicated")]
    DuplicateLabel(String),

    #[error("model normalization vectors must have {expected} values, got {actual}")]
    NormalizationShape { expected: usize, actual: usize },

    #[error("model stores a standard deviation of exactly 0 for feature '{0}'")]
    ZeroStd(String),

    #[error("weight matrix must be {labels}x{features}, got {rows}x{cols}")]
    WeightShape {
        labels: usize,
        features: usize,
        rows: usize,
        cols: usize,
    },

    #[error("bias vector must have {expected} values, got {actual}")]
    BiasShape { expected: usize, actual: usize },

    #[error("model JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Modelo softmax entrenado. Snapshot completo e inmutable: un entrenamiento
/// o una importación lo reemplazan entero, nunca se muta de forma
/// incremental.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Etiquetas en el orden derivado del dataset al entrenar
    pub labels: Vec<String>,
    pub feature_names: Vec<String>,
    /// Parámetros de normalización congelados al entrenar
    pub feature_means: Vec<f32>,
    /// Nunca contiene un 0 exacto (un std de 0 se sustituye por 1)
    pub feature_std: Vec<f32>,
    /// Matriz de pesos [etiquetas x características]
    pub weights: Vec<Vec<f32>>,
    pub biases: Vec<f32>,
    /// Epoch ms del momento de entrenamiento
    pub trained_at: u64,
    pub training_samples: usize,
    /// Pérdida media por época, una entrada por época entrenada
    pub loss_history: Vec<f32>,
}

impl Model {
    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }

    pub fn num_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Valida los invariantes estructurales del modelo
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.labels.is_empty() {
            return Err(ModelError::NoLabels);
        }
        for (i, label) in self.labels.iter().enumerate() {
            if self.labels[..i].contains(label) {
                return Err(ModelError::DuplicateLabel(label.clone()));
            }
        }

        let features = self.feature_names.len();
        for vector in [&self.feature_means, &self.feature_std] {
            if vector.len() != features {
                return Err(ModelError::NormalizationShape {
                    expected: features,
                    actual: vector.len(),
                });
            }
        }
        for (name, std) in self.feature_names.iter().zip(self.feature_std.iter()) {
            if *std == 0.0 {
                return Err(ModelError::ZeroStd(name.clone()));
            }
        }

        let rows = self.weights.len();
        let cols = self.weights.first().map(|r| r.len()).unwrap_or(0);
        if rows != self.labels.len() || self.weights.iter().any(|r| r.len() != features) {
            return Err(ModelError::WeightShape {
                labels: self.labels.len(),
                features,
                rows,
                cols,
            });
        }

        if self.biases.len() != self.labels.len() {
            return Err(ModelError::BiasShape {
                expected: self.labels.len(),
                actual: self.biases.len(),
            });
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let model: Model = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
