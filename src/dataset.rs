use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::feature_extractor::FeatureVector;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("dataset feature schema mismatch: expected {expected} features, got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    #[error("dataset feature schema mismatch: feature '{expected}' at position {position}, got '{actual}'")]
    SchemaNameMismatch {
        position: usize,
        expected: String,
        actual: String,
    },

    #[error("entry '{id}' has {actual} values but the dataset declares {expected} features")]
    EntryLengthMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },

    #[error("dataset JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Una entrada del dataset: el vector de características extraído de una
/// captura, con metadatos de la secuencia original
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetEntry {
    pub id: String,
    pub label: String,
    pub values: Vec<f32>,
    pub sample_count: usize,
    pub duration_ms: f32,
}

/// Dataset de gestos: un esquema de nombres compartido + entradas en orden
/// de inserción. Invariante: la longitud de `values` de cada entrada es igual
/// a la de `feature_names`; un desajuste de esquema es un error duro, nunca
/// un reshape silencioso.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureDataset {
    pub feature_names: Vec<String>,
    pub entries: Vec<DatasetEntry>,
}

impl GestureDataset {
    /// Dataset vacío con el esquema dado
    pub fn with_schema(feature_names: Vec<String>) -> Self {
        Self {
            feature_names,
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Etiquetas únicas en orden de primera aparición
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for entry in &self.entries {
            if !labels.contains(&entry.label) {
                labels.push(entry.label.clone());
            }
        }
        labels
    }

    /// Conteo de entradas por etiqueta, en orden de primera aparición
    pub fn label_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for entry in &self.entries {
            match counts.iter_mut().find(|(l, _)| *l == entry.label) {
                Some((_, c)) => *c += 1,
                None => counts.push((entry.label.clone(), 1)),
            }
        }
        counts
    }

    /// Valida que el esquema del vector coincida exactamente (contenido y
    /// orden) con el del dataset
    fn check_schema(&self, features: &FeatureVector) -> Result<(), DatasetError> {
        if features.names.len() != self.feature_names.len() {
            return Err(DatasetError::SchemaMismatch {
                expected: self.feature_names.len(),
                actual: features.names.len(),
            });
        }
        for (position, (expected, actual)) in self
            .feature_names
            .iter()
            .zip(features.names.iter())
            .enumerate()
        {
            if expected != actual {
                return Err(DatasetError::SchemaNameMismatch {
                    position,
                    expected: expected.clone(),
                    actual: actual.clone(),
                });
            }
        }
        Ok(())
    }

    /// Añade una entrada construida desde un vector de características.
    /// Si el dataset aún no tiene esquema adopta el del vector; si lo tiene,
    /// cualquier diferencia es un error duro.
    pub fn append(
        &mut self,
        id: String,
        label: String,
        features: &FeatureVector,
        sample_count: usize,
        duration_ms: f32,
    ) -> Result<(), DatasetError> {
        if self.feature_names.is_empty() && self.entries.is_empty() {
            self.feature_names = features.names.clone();
        } else {
            self.check_schema(features)?;
        }

        self.entries.push(DatasetEntry {
            id,
            label,
            values: features.values.clone(),
            sample_count,
            duration_ms,
        });
        Ok(())
    }

    /// Limpieza total de entradas; el esquema se conserva
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Valida los invariantes estructurales tras una importación
    fn validate(&self) -> Result<(), DatasetError> {
        for entry in &self.entries {
            if entry.values.len() != self.feature_names.len() {
                return Err(DatasetError::EntryLengthMismatch {
                    id: entry.id.clone(),
                    expected: self.feature_names.len(),
                    actual: entry.values.len(),
                });
            }
        }
        Ok(())
    }

    /// Importa un dataset desde JSON con validación estricta: campos
    /// requeridos presentes y longitudes de valores consistentes. Rechaza en
    /// la primera violación estructural.
    pub fn from_json(json: &str) -> Result<Self, DatasetError> {
        let dataset: GestureDataset = serde_json::from_str(json)?;
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn to_json(&self) -> Result<String, DatasetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), DatasetError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_extractor;
    use crate::types::SensorSample;

    fn sample_features(value: f32) -> FeatureVector {
        let seq = vec![
            SensorSample::new(0, value, 0.0, 0.0, 0.0, 0.0, 0.0),
            SensorSample::new(50, -value, 0.0, 0.0, 0.0, 0.0, 0.0),
        ];
        feature_extractor::extract(&seq)
    }

    #[test]
    fn test_append_adopts_schema() {
        let mut dataset = GestureDataset::default();
        let fv = sample_features(1.0);
        dataset
            .append("g-0".to_string(), "maps".to_string(), &fv, 2, 50.0)
            .unwrap();

        assert_eq!(dataset.feature_names, fv.names);
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_append_rejects_schema_mismatch() {
        let mut dataset = GestureDataset::default();
        dataset
            .append("g-0".to_string(), "maps".to_string(), &sample_features(1.0), 2, 50.0)
            .unwrap();

        // Un vector con esquema recortado debe rechazarse sin modificar nada
        let mut truncated = sample_features(2.0);
        truncated.names.truncate(10);
        truncated.values.truncate(10);

        let err = dataset
            .append("g-1".to_string(), "maps".to_string(), &truncated, 2, 50.0)
            .unwrap_err();
        assert!(matches!(err, DatasetError::SchemaMismatch { .. }));
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_append_rejects_renamed_feature() {
        let mut dataset = GestureDataset::default();
        dataset
            .append("g-0".to_string(), "maps".to_string(), &sample_features(1.0), 2, 50.0)
            .unwrap();

        let mut renamed = sample_features(2.0);
        renamed.names[3] = "otra_cosa".to_string();

        let err = dataset
            .append("g-1".to_string(), "maps".to_string(), &renamed, 2, 50.0)
            .unwrap_err();
        assert!(matches!(err, DatasetError::SchemaNameMismatch { .. }));
    }

    #[test]
    fn test_labels_in_first_appearance_order() {
        let mut dataset = GestureDataset::default();
        for (i, label) in ["whatsapp", "maps", "whatsapp", "camera"].iter().enumerate() {
            dataset
                .append(
                    format!("g-{}", i),
                    label.to_string(),
                    &sample_features(i as f32),
                    2,
                    50.0,
                )
                .unwrap();
        }

        assert_eq!(dataset.labels(), vec!["whatsapp", "maps", "camera"]);
        assert_eq!(
            dataset.label_counts(),
            vec![
                ("whatsapp".to_string(), 2),
                ("maps".to_string(), 1),
                ("camera".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_json_round_trip() {
        let mut dataset = GestureDataset::default();
        dataset
            .append("g-0".to_string(), "maps".to_string(), &sample_features(1.0), 2, 50.0)
            .unwrap();
        dataset
            .append("g-1".to_string(), "whatsapp".to_string(), &sample_features(2.0), 2, 50.0)
            .unwrap();

        let json = dataset.to_json().unwrap();
        let restored = GestureDataset::from_json(&json).unwrap();

        assert_eq!(restored.feature_names, dataset.feature_names);
        assert_eq!(restored.len(), dataset.len());
        for (a, b) in restored.entries.iter().zip(dataset.entries.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.label, b.label);
            assert_eq!(a.values, b.values);
            assert_eq!(a.sample_count, b.sample_count);
        }
    }

    #[test]
    fn test_import_requires_feature_names() {
        let err = GestureDataset::from_json(r#"{ "entries": [] }"#).unwrap_err();
        assert!(matches!(err, DatasetError::Json(_)));
    }

    #[test]
    fn test_import_requires_entries_list() {
        let err =
            GestureDataset::from_json(r#"{ "featureNames": [], "entries": 42 }"#).unwrap_err();
        assert!(matches!(err, DatasetError::Json(_)));
    }

    #[test]
    fn test_import_rejects_inconsistent_entry() {
        let json = r#"{
            "featureNames": ["a", "b"],
            "entries": [
                { "id": "g-0", "label": "maps", "values": [1.0], "sampleCount": 4, "durationMs": 80.0 }
            ]
        }"#;
        let err = GestureDataset::from_json(json).unwrap_err();
        assert!(matches!(err, DatasetError::EntryLengthMismatch { .. }));
    }

    #[test]
    fn test_clear_keeps_schema() {
        let mut dataset = GestureDataset::default();
        dataset
            .append("g-0".to_string(), "maps".to_string(), &sample_features(1.0), 2, 50.0)
            .unwrap();
        dataset.clear();
        assert!(dataset.is_empty());
        assert!(!dataset.feature_names.is_empty());
    }
}
