use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::dataset::GestureDataset;
use crate::model::Model;

pub const DEFAULT_EPOCHS: usize = 400;
pub const DEFAULT_LEARNING_RATE: f32 = 0.06;

/// Suelo para la probabilidad de la clase correcta antes del logaritmo
const LOSS_PROBABILITY_FLOOR: f32 = 1e-9;

#[derive(Error, Debug)]
pub enum TrainingError {
    #[error("dataset is empty, nothing to train on")]
    EmptyDataset,

    #[error("need at least two labels to train, found {found}")]
    NotEnoughLabels { found: usize },
}

/// Parámetros de un entrenamiento
#[derive(Debug, Clone, Copy)]
pub struct TrainingParams {
    pub epochs: usize,
    pub learning_rate: f32,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            epochs: DEFAULT_EPOCHS,
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }
}

/// Softmax numéricamente estable: resta el logit máximo antes de exponenciar
/// y sustituye la suma por 1 si es exactamente cero.
pub fn stable_softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return Vec::new();
    }

    let max_logit = logits.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max_logit).exp()).collect();
    let mut sum: f32 = exps.iter().sum();
    if sum == 0.0 {
        sum = 1.0;
    }
    exps.into_iter().map(|e| e / sum).collect()
}

/// Normalización z-score con parámetros congelados (media y std por
/// característica calculadas sobre el dataset completo)
pub fn normalize_with(values: &[f32], means: &[f32], stds: &[f32]) -> Vec<f32> {
    values
        .iter()
        .zip(means.iter().zip(stds.iter()))
        .map(|(&v, (&m, &s))| (v - m) / s)
        .collect()
}

/// Media y desviación estándar poblacional por columna; un std de 0 se
/// sustituye por 1 para que la normalización quede bien definida
fn dataset_normalization(dataset: &GestureDataset) -> (Vec<f32>, Vec<f32>) {
    let n = dataset.entries.len() as f32;
    let features = dataset.feature_names.len();

    let mut means = vec![0.0f32; features];
    for entry in &dataset.entries {
        for (m, v) in means.iter_mut().zip(entry.values.iter()) {
            *m += v;
        }
    }
    for m in means.iter_mut() {
        *m /= n;
    }

    let mut stds = vec![0.0f32; features];
    for entry in &dataset.entries {
        for (s, (v, m)) in stds.iter_mut().zip(entry.values.iter().zip(means.iter())) {
            *s += (v - m).powi(2);
        }
    }
    for s in stds.iter_mut() {
        *s = (*s / n).sqrt();
        if *s == 0.0 {
            *s = 1.0;
        }
    }

    (means, stds)
}

/// Entrena un clasificador softmax multinomial por descenso de gradiente en
/// batch completo.
///
/// Cada época hace una pasada entera: logits → softmax estable → pérdida de
/// entropía cruzada acumulada → gradientes `(p - indicador) * x` por clase y
/// característica. El paso aplicado es `learning_rate / n`. Sin mini-batch,
/// sin momentum, sin regularización. Devuelve un snapshot completo del
/// modelo; nunca se publica una época parcial.
pub fn train(dataset: &GestureDataset, params: TrainingParams) -> Result<Model, TrainingError> {
    if dataset.is_empty() {
        return Err(TrainingError::EmptyDataset);
    }

    let labels = dataset.labels();
    if labels.len() < 2 {
        return Err(TrainingError::NotEnoughLabels {
            found: labels.len(),
        });
    }

    let num_labels = labels.len();
    let num_features = dataset.feature_names.len();
    let n = dataset.entries.len();

    let (means, stds) = dataset_normalization(dataset);

    // Entradas normalizadas una sola vez con los parámetros congelados
    let normalized: Vec<Vec<f32>> = dataset
        .entries
        .iter()
        .map(|e| normalize_with(&e.values, &means, &stds))
        .collect();
    let targets: Vec<usize> = dataset
        .entries
        .iter()
        .map(|e| {
            labels
                .iter()
                .position(|l| *l == e.label)
                .unwrap_or_default()
        })
        .collect();

    let mut weights = vec![vec![0.0f32; num_features]; num_labels];
    let mut biases = vec![0.0f32; num_labels];
    let mut loss_history = Vec::with_capacity(params.epochs);

    for _epoch in 0..params.epochs {
        let mut weight_grads = vec![vec![0.0f32; num_features]; num_labels];
        let mut bias_grads = vec![0.0f32; num_labels];
        let mut epoch_loss = 0.0f32;

        for (x, &target) in normalized.iter().zip(targets.iter()) {
            let logits: Vec<f32> = weights
                .iter()
                .zip(biases.iter())
                .map(|(row, &b)| row.iter().zip(x.iter()).map(|(w, v)| w * v).sum::<f32>() + b)
                .collect();
            let probs = stable_softmax(&logits);

            epoch_loss += -(probs[target].max(LOSS_PROBABILITY_FLOOR)).ln();

            for class in 0..num_labels {
                let indicator = if class == target { 1.0 } else { 0.0 };
                let g = probs[class] - indicator;
                bias_grads[class] += g;
                for (slot, v) in weight_grads[class].iter_mut().zip(x.iter()) {
                    *slot += g * v;
                }
            }
        }

        let step = params.learning_rate / n as f32;
        for (row, grad_row) in weights.iter_mut().zip(weight_grads.iter()) {
            for (w, g) in row.iter_mut().zip(grad_row.iter()) {
                *w -= step * g;
            }
        }
        for (b, g) in biases.iter_mut().zip(bias_grads.iter()) {
            *b -= step * g;
        }

        loss_history.push(epoch_loss / n as f32);
    }

    Ok(Model {
        labels,
        feature_names: dataset.feature_names.clone(),
        feature_means: means,
        feature_std: stds,
        weights,
        biases,
        trained_at: epoch_ms_now(),
        training_samples: n,
        loss_history,
    })
}

fn epoch_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
