use thiserror::Error;

use crate::dtw::dtw_distance;
use crate::types::{GestureSequence, PredictionResult, SensorSample};

/// Umbral mínimo del modo adaptativo
const MIN_ADAPTIVE_THRESHOLD: f32 = 0.3;
/// Margen sobre la distancia intra-etiqueta media
const ADAPTIVE_MARGIN: f32 = 1.5;
/// Umbral estático cuando la etiqueta tiene un solo ejemplar
const STATIC_FALLBACK_THRESHOLD: f32 = 0.6;

#[derive(Error, Debug)]
pub enum MatcherError {
    #[error("template store is empty, nothing to match against")]
    NoTemplates,

    #[error("query sequence is empty")]
    EmptyQuery,

    #[error("exemplar sequence for label '{label}' is empty")]
    EmptyExemplar { label: String },
}

/// Plantilla de un gesto: etiqueta + ejemplares crudos en orden de inserción
#[derive(Debug, Clone)]
pub struct GestureTemplate {
    pub label: String,
    pub exemplars: Vec<GestureSequence>,
}

/// Estadísticos de salud por etiqueta: distancias DTW entre los propios
/// ejemplares de la etiqueta. Alimentan el umbral de aceptación adaptativo.
#[derive(Debug, Clone)]
pub struct TemplateStats {
    pub label: String,
    pub exemplar_count: usize,
    pub mean_intra_distance: f32,
    pub max_intra_distance: f32,
}

/// Resultado de una clasificación DTW
#[derive(Debug, Clone)]
pub struct DtwMatch {
    pub prediction: PredictionResult,
    /// Distancia media de la consulta a los ejemplares de la etiqueta ganadora
    pub mean_distance: f32,
    /// Distancia mínima de la consulta a los ejemplares de la etiqueta ganadora
    pub min_distance: f32,
    /// Umbral de aceptación aplicado
    pub threshold: f32,
    /// false = resultado de baja confianza, no debe disparar acciones
    pub accepted: bool,
}

/// Almacén de plantillas por etiqueta.
/// Crece solo por append; se limpia de forma total, nunca parcial.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    templates: Vec<GestureTemplate>,
    stats: Vec<TemplateStats>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn templates(&self) -> &[GestureTemplate] {
        &self.templates
    }

    pub fn stats(&self) -> &[TemplateStats] {
        &self.stats
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn exemplar_count(&self) -> usize {
        self.templates.iter().map(|t| t.exemplars.len()).sum()
    }

    /// Añade un ejemplar a la etiqueta (la crea si es la primera vez) y
    /// recalcula los estadísticos de salud de esa etiqueta.
    pub fn add_exemplar(
        &mut self,
        label: &str,
        sequence: GestureSequence,
    ) -> Result<(), MatcherError> {
        if sequence.is_empty() {
            return Err(MatcherError::EmptyExemplar {
                label: label.to_string(),
            });
        }

        let idx = match self.templates.iter().position(|t| t.label == label) {
            Some(idx) => {
                self.templates[idx].exemplars.push(sequence);
                idx
            }
            None => {
                self.templates.push(GestureTemplate {
                    label: label.to_string(),
                    exemplars: vec![sequence],
                });
                self.templates.len() - 1
            }
        };

        self.refresh_stats(idx);
        Ok(())
    }

    /// Limpieza total del almacén
    pub fn clear(&mut self) {
        self.templates.clear();
        self.stats.clear();
    }

    /// Recalcula los estadísticos intra-etiqueta de la plantilla `idx`
    fn refresh_stats(&mut self, idx: usize) {
        let template = &self.templates[idx];
        let exemplars = &template.exemplars;

        let mut sum = 0.0f32;
        let mut max = 0.0f32;
        let mut pairs = 0usize;

        for i in 0..exemplars.len() {
            for j in (i + 1)..exemplars.len() {
                let d = dtw_distance(&exemplars[i], &exemplars[j]);
                sum += d;
                max = max.max(d);
                pairs += 1;
            }
        }

        let stats = TemplateStats {
            label: template.label.clone(),
            exemplar_count: exemplars.len(),
            mean_intra_distance: if pairs > 0 { sum / pairs as f32 } else { 0.0 },
            max_intra_distance: max,
        };

        match self.stats.iter().position(|s| s.label == template.label) {
            Some(pos) => self.stats[pos] = stats,
            None => self.stats.push(stats),
        }
    }

    /// Umbral de aceptación para una etiqueta: adaptativo con 2 o más
    /// ejemplares, estático con uno solo.
    fn acceptance_threshold(&self, label: &str) -> f32 {
        match self.stats.iter().find(|s| s.label == label) {
            Some(stats) if stats.exemplar_count >= 2 => {
                (stats.mean_intra_distance * ADAPTIVE_MARGIN).max(MIN_ADAPTIVE_THRESHOLD)
            }
            _ => STATIC_FALLBACK_THRESHOLD,
        }
    }

    /// Clasifica una secuencia contra todas las plantillas.
    ///
    /// El score de cada etiqueta es la media aritmética de las distancias DTW
    /// a sus ejemplares; gana la etiqueta de menor media. La aceptación se
    /// decide comparando la distancia MÍNIMA a los ejemplares de la ganadora
    /// contra el umbral adaptativo; un rechazo es un resultado de baja
    /// confianza, no un error.
    pub fn classify(&self, query: &[SensorSample]) -> Result<DtwMatch, MatcherError> {
        if self.templates.is_empty() {
            return Err(MatcherError::NoTemplates);
        }
        if query.is_empty() {
            return Err(MatcherError::EmptyQuery);
        }

        let mut label_scores: Vec<(String, f32, f32)> = Vec::with_capacity(self.templates.len());

        for template in &self.templates {
            let mut sum = 0.0f32;
            let mut min = f32::INFINITY;
            for exemplar in &template.exemplars {
                let d = dtw_distance(query, exemplar);
                sum += d;
                min = min.min(d);
            }
            let mean = sum / template.exemplars.len() as f32;
            label_scores.push((template.label.clone(), mean, min));
        }

        let (winner_label, winner_mean, winner_min) = label_scores
            .iter()
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .cloned()
            .ok_or(MatcherError::NoTemplates)?;

        // Pseudo-probabilidades: peso exp(-distancia media) normalizado
        let weights: Vec<(String, f32)> = label_scores
            .iter()
            .map(|(label, mean, _)| (label.clone(), (-mean).exp()))
            .collect();
        let total: f32 = weights.iter().map(|(_, w)| w).sum();
        let scores: Vec<(String, f32)> = if total > 0.0 {
            weights.into_iter().map(|(l, w)| (l, w / total)).collect()
        } else {
            // Todas las distancias desbordaron exp(): distribución uniforme
            let uniform = 1.0 / label_scores.len() as f32;
            weights.into_iter().map(|(l, _)| (l, uniform)).collect()
        };

        // Menor distancia media == mayor peso, así que la ganadora encabeza
        // también la distribución
        let mut prediction =
            PredictionResult::from_scores(scores).ok_or(MatcherError::NoTemplates)?;
        prediction.label = winner_label;

        let threshold = self.acceptance_threshold(&prediction.label);
        let accepted = winner_min < threshold;

        Ok(DtwMatch {
            prediction,
            mean_distance: winner_mean,
            min_distance: winner_min,
            threshold,
            accepted,
        })
    }
}
