use thiserror::Error;

use crate::dataset::GestureDataset;
use crate::types::PredictionResult;

#[derive(Error, Debug)]
pub enum NearestNeighborError {
    #[error("dataset is empty, nothing to compare against")]
    EmptyDataset,

    #[error("invalid feature size: expected {expected}, got {actual}")]
    InvalidFeatureSize { expected: usize, actual: usize },
}

/// Clasificador por vecinos con pesado exponencial.
///
/// Sin fase de entrenamiento: para cada entrada del dataset calcula la
/// distancia euclídea cruda (sin normalizar) a la consulta, la convierte en
/// peso `exp(-distancia)` y acumula pesos por etiqueta. Las confianzas son la
/// fracción del peso total de cada etiqueta (pseudo-probabilidad, no
/// calibrada). Coste O(entradas x características) por consulta.
pub fn predict_nn(
    dataset: &GestureDataset,
    raw_features: &[f32],
) -> Result<PredictionResult, NearestNeighborError> {
    if dataset.is_empty() {
        return Err(NearestNeighborError::EmptyDataset);
    }
    let expected = dataset.feature_names.len();
    if raw_features.len() != expected {
        return Err(NearestNeighborError::InvalidFeatureSize {
            expected,
            actual: raw_features.len(),
        });
    }

    // Pesos acumulados por etiqueta, en orden de primera aparición
    let mut label_weights: Vec<(String, f32)> = Vec::new();
    for entry in &dataset.entries {
        let distance = euclidean(&entry.values, raw_features);
        let weight = (-distance).exp();

        match label_weights.iter_mut().find(|(l, _)| *l == entry.label) {
            Some((_, w)) => *w += weight,
            None => label_weights.push((entry.label.clone(), weight)),
        }
    }

    let total: f32 = label_weights.iter().map(|(_, w)| w).sum();
    let scores: Vec<(String, f32)> = if total > 0.0 {
        label_weights
            .into_iter()
            .map(|(l, w)| (l, w / total))
            .collect()
    } else {
        // Todas las distancias desbordaron exp(): distribución uniforme
        let uniform = 1.0 / label_weights.len() as f32;
        label_weights
            .into_iter()
            .map(|(l, _)| (l, uniform))
            .collect()
    };

    PredictionResult::from_scores(scores).ok_or(NearestNeighborError::EmptyDataset)
}

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
