use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::dataset::GestureDataset;
use crate::gesture_classifier::{ClassifierError, GestureClassifier};
use crate::model::Model;
use crate::trainer::{self, TrainingError, TrainingParams};

pub const DEFAULT_TEST_FRACTION: f32 = 0.2;
pub const DEFAULT_EVAL_EPOCHS: usize = 250;
pub const DEFAULT_EVAL_LEARNING_RATE: f32 = 0.08;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("dataset is empty, nothing to evaluate")]
    EmptyDataset,

    #[error("test fraction must be strictly between 0 and 1, got {0}")]
    InvalidTestFraction(f32),

    #[error("only {remaining} training entries remain after the test split, need at least 2")]
    NotEnoughTrainingEntries { remaining: usize },

    #[error(transparent)]
    Training(#[from] TrainingError),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

/// Aciertos por etiqueta sobre el conjunto de test
#[derive(Debug, Clone)]
pub struct LabelAccuracy {
    pub label: String,
    pub correct: usize,
    pub total: usize,
}

impl LabelAccuracy {
    pub fn accuracy(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f32 / self.total as f32
    }
}

/// Resultado de una evaluación con hold-out
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    pub overall_accuracy: f32,
    pub correct: usize,
    pub total_test_samples: usize,
    pub per_label: Vec<LabelAccuracy>,
}

/// Evalúa el clasificador softmax con una partición hold-out aleatoria.
///
/// Baraja los índices (Fisher–Yates), reserva `max(1, floor(N * fraction))`
/// entradas como test, entrena un modelo nuevo con el resto y mide aciertos
/// por etiqueta y globales. No determinista entre ejecuciones; usar
/// `evaluate_with_rng` con un RNG sembrado para reproducibilidad.
pub fn evaluate(
    dataset: &GestureDataset,
    test_fraction: f32,
    params: TrainingParams,
) -> Result<(EvaluationResult, Model), EvalError> {
    evaluate_with_rng(dataset, test_fraction, params, &mut rand::thread_rng())
}

pub fn evaluate_with_rng<R: Rng>(
    dataset: &GestureDataset,
    test_fraction: f32,
    params: TrainingParams,
    rng: &mut R,
) -> Result<(EvaluationResult, Model), EvalError> {
    if dataset.is_empty() {
        return Err(EvalError::EmptyDataset);
    }
    if !test_fraction.is_finite() || test_fraction <= 0.0 || test_fraction >= 1.0 {
        return Err(EvalError::InvalidTestFraction(test_fraction));
    }

    let n = dataset.len();
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);

    let test_count = ((n as f32 * test_fraction).floor() as usize).max(1);
    let (test_idx, train_idx) = indices.split_at(test_count);

    if train_idx.len() < 2 {
        return Err(EvalError::NotEnoughTrainingEntries {
            remaining: train_idx.len(),
        });
    }

    let mut train_set = GestureDataset::with_schema(dataset.feature_names.clone());
    for &i in train_idx {
        train_set.entries.push(dataset.entries[i].clone());
    }

    let model = trainer::train(&train_set, params)?;
    let classifier = GestureClassifier::new(model)?;

    // Contadores por etiqueta en orden de primera aparición en el dataset
    let mut per_label: Vec<LabelAccuracy> = dataset
        .labels()
        .into_iter()
        .map(|label| LabelAccuracy {
            label,
            correct: 0,
            total: 0,
        })
        .collect();
    let mut correct = 0usize;

    for &i in test_idx {
        let entry = &dataset.entries[i];
        let prediction = classifier.predict(&entry.values)?;

        if let Some(slot) = per_label.iter_mut().find(|a| a.label == entry.label) {
            slot.total += 1;
            if prediction.label == entry.label {
                slot.correct += 1;
                correct += 1;
            }
        }
    }

    let result = EvaluationResult {
        overall_accuracy: correct as f32 / test_count as f32,
        correct,
        total_test_samples: test_count,
        per_label,
    };

    let model = classifier.model().clone();
    Ok((result, model))
}
