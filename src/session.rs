use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use thiserror::Error;

use crate::dataset::{DatasetError, GestureDataset};
use crate::feature_extractor;
use crate::gesture_classifier::{ClassifierError, GestureClassifier};
use crate::model::Model;
use crate::preprocess;
use crate::template_store::{DtwMatch, MatcherError, TemplateStore};
use crate::trainer::{self, TrainingError, TrainingParams};
use crate::types::{GestureSequence, PredictionResult};

/// Ventana de suavizado por defecto para capturas y consultas
pub const DEFAULT_SMOOTH_WINDOW: usize = 5;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("captured sequence is empty")]
    EmptySequence,

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Matcher(#[from] MatcherError),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

/// Resultado de pedir un entrenamiento
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingDispatch {
    Started,
    /// Ya hay un entrenamiento en curso; no es un error, el llamador decide
    /// si reintenta tras el próximo poll
    Busy,
}

/// Clasificación combinada de una consulta: ambos clasificadores corren
/// sobre la misma secuencia suavizada
#[derive(Debug, Clone)]
pub struct SessionClassification {
    /// None si el almacén de plantillas está vacío
    pub dtw: Option<DtwMatch>,
    /// None si aún no hay modelo entrenado instalado
    pub softmax: Option<PredictionResult>,
}

struct TrainJob {
    dataset: Arc<GestureDataset>,
    params: TrainingParams,
}

/// Sesión de reconocimiento propiedad del llamador.
///
/// Sustituye cualquier estado mutable a nivel de módulo: cada sesión es
/// independiente, con ciclo de vida explícito (`new` / `poll` / `shutdown`).
/// El dataset y el almacén de plantillas se publican como snapshots
/// inmutables (`Arc`): cada append/clear produce un snapshot nuevo, así que
/// un lector con un clon del Arc nunca observa una colección a medio
/// actualizar. El entrenamiento corre en un hilo de fondo y entrega modelos
/// completos por canal; una época parcial nunca es observable.
pub struct GestureSession {
    dataset: Arc<GestureDataset>,
    templates: Arc<TemplateStore>,
    classifier: Option<GestureClassifier>,
    smooth_window: usize,
    capture_counter: u64,
    job_tx: Sender<TrainJob>,
    result_rx: Receiver<Result<Model, TrainingError>>,
    worker: Option<JoinHandle<()>>,
    training_in_flight: bool,
}

impl GestureSession {
    pub fn new() -> Self {
        Self::with_smooth_window(DEFAULT_SMOOTH_WINDOW)
    }

    pub fn with_smooth_window(smooth_window: usize) -> Self {
        let (job_tx, job_rx) = unbounded::<TrainJob>();
        let (result_tx, result_rx) = unbounded::<Result<Model, TrainingError>>();

        // Hilo entrenador: recibe snapshots del dataset y devuelve modelos
        // completos; muere cuando la sesión suelta el canal de trabajos
        let worker = std::thread::spawn(move || {
            while let Ok(job) = job_rx.recv() {
                let outcome = trainer::train(&job.dataset, job.params);
                if result_tx.send(outcome).is_err() {
                    break;
                }
            }
        });

        Self {
            dataset: Arc::new(GestureDataset::with_schema(
                feature_extractor::feature_names(),
            )),
            templates: Arc::new(TemplateStore::new()),
            classifier: None,
            smooth_window,
            capture_counter: 0,
            job_tx,
            result_rx,
            worker: Some(worker),
            training_in_flight: false,
        }
    }

    /// Snapshot actual del dataset; estable frente a capturas posteriores
    pub fn dataset(&self) -> Arc<GestureDataset> {
        Arc::clone(&self.dataset)
    }

    /// Snapshot actual del almacén de plantillas
    pub fn templates(&self) -> Arc<TemplateStore> {
        Arc::clone(&self.templates)
    }

    pub fn model(&self) -> Option<&Model> {
        self.classifier.as_ref().map(|c| c.model())
    }

    pub fn training_in_flight(&self) -> bool {
        self.training_in_flight
    }

    /// Registra una captura: suaviza, extrae características, añade la
    /// entrada al dataset y la secuencia como ejemplar de plantilla.
    /// Ambas colecciones se reemplazan por snapshots nuevos (copy-on-write).
    pub fn add_capture(&mut self, label: &str, raw: &GestureSequence) -> Result<String, SessionError> {
        if raw.is_empty() {
            return Err(SessionError::EmptySequence);
        }

        let smoothed = preprocess::smooth(raw, self.smooth_window);
        let features = feature_extractor::extract(&smoothed);
        let duration_ms = match (smoothed.first(), smoothed.last()) {
            (Some(first), Some(last)) => (last.timestamp_ms - first.timestamp_ms) as f32,
            _ => 0.0,
        };

        let id = format!("{}-{}", label, self.capture_counter);
        self.capture_counter += 1;

        let mut next_dataset = (*self.dataset).clone();
        next_dataset.append(
            id.clone(),
            label.to_string(),
            &features,
            smoothed.len(),
            duration_ms,
        )?;

        let mut next_templates = (*self.templates).clone();
        next_templates.add_exemplar(label, smoothed)?;

        // Publicar ambos snapshots solo cuando las dos mutaciones han validado
        self.dataset = Arc::new(next_dataset);
        self.templates = Arc::new(next_templates);
        Ok(id)
    }

    /// Limpieza total: snapshots vacíos nuevos, el esquema se conserva.
    /// El modelo instalado no se toca; solo lo reemplaza un entrenamiento o
    /// una importación.
    pub fn clear(&mut self) {
        self.dataset = Arc::new(GestureDataset::with_schema(
            self.dataset.feature_names.clone(),
        ));
        self.templates = Arc::new(TemplateStore::new());
    }

    /// Despacha un entrenamiento en segundo plano sobre el snapshot actual.
    /// Con un entrenamiento ya en curso devuelve `Busy` sin encolar nada.
    pub fn start_training(&mut self, params: TrainingParams) -> TrainingDispatch {
        if self.training_in_flight {
            return TrainingDispatch::Busy;
        }

        let job = TrainJob {
            dataset: Arc::clone(&self.dataset),
            params,
        };
        if self.job_tx.send(job).is_ok() {
            self.training_in_flight = true;
        }
        TrainingDispatch::Started
    }

    /// Recoge, sin bloquear, el resultado de un entrenamiento terminado.
    /// Un modelo terminado se instala como reemplazo completo del anterior.
    /// Devuelve None si no hay nada que recoger todavía.
    pub fn poll(&mut self) -> Option<Result<&Model, TrainingError>> {
        match self.result_rx.try_recv() {
            Ok(outcome) => {
                self.training_in_flight = false;
                match outcome {
                    Ok(model) => match GestureClassifier::new(model) {
                        Ok(classifier) => {
                            self.classifier = Some(classifier);
                            self.classifier.as_ref().map(|c| Ok(c.model()))
                        }
                        // El entrenador nunca produce un modelo sin etiquetas;
                        // si llega, se reporta como dataset insuficiente
                        Err(_) => Some(Err(TrainingError::EmptyDataset)),
                    },
                    Err(err) => Some(Err(err)),
                }
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Instala un modelo importado (reemplazo completo, nunca incremental)
    pub fn install_model(&mut self, model: Model) -> Result<(), SessionError> {
        self.classifier = Some(GestureClassifier::new(model)?);
        Ok(())
    }

    /// Clasifica una secuencia con ambos clasificadores sobre los snapshots
    /// actuales. Almacén vacío o modelo ausente producen None en la rama
    /// correspondiente, no un error.
    pub fn classify(&self, raw: &GestureSequence) -> Result<SessionClassification, SessionError> {
        if raw.is_empty() {
            return Err(SessionError::EmptySequence);
        }

        let smoothed = preprocess::smooth(raw, self.smooth_window);

        let dtw = if self.templates.is_empty() {
            None
        } else {
            Some(self.templates.classify(&smoothed)?)
        };

        let softmax = match &self.classifier {
            Some(classifier) => {
                let features = feature_extractor::extract(&smoothed);
                Some(classifier.predict(&features.values)?)
            }
            None => None,
        };

        Ok(SessionClassification { dtw, softmax })
    }

    /// Cierra la sesión: suelta el canal de trabajos y espera al hilo
    /// entrenador. Un resultado pendiente no recogido se descarta.
    pub fn shutdown(mut self) {
        drop(self.job_tx);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Default for GestureSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SensorSample;
    use std::time::Duration;

    fn capture(amplitude: f32, len: usize) -> GestureSequence {
        (0..len)
            .map(|i| {
                let t = i as f32 / len as f32;
                let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
                SensorSample::new(
                    i as u64 * 20,
                    amplitude * sign,
                    amplitude * t,
                    9.8,
                    0.1 * amplitude,
                    0.0,
                    t,
                )
            })
            .collect()
    }

    /// Forma distinta a `capture`: un pico aislado en mitad de la secuencia
    fn jolt(amplitude: f32, len: usize) -> GestureSequence {
        (0..len)
            .map(|i| {
                let v = if i == len / 2 { amplitude } else { 0.0 };
                SensorSample::new(i as u64 * 20, v, -v, 9.8, v * 0.5, v, 0.0)
            })
            .collect()
    }

    fn wait_for_model(session: &mut GestureSession) -> Result<(), TrainingError> {
        for _ in 0..500 {
            if let Some(outcome) = session.poll() {
                return outcome.map(|_| ());
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("el entrenamiento no terminó a tiempo");
    }

    #[test]
    fn test_capture_grows_both_collections() {
        let mut session = GestureSession::new();
        let id = session.add_capture("maps", &capture(1.0, 12)).unwrap();

        assert_eq!(id, "maps-0");
        assert_eq!(session.dataset().len(), 1);
        assert_eq!(session.templates().exemplar_count(), 1);

        session.add_capture("maps", &capture(1.1, 12)).unwrap();
        assert_eq!(session.dataset().len(), 2);
        assert_eq!(session.dataset().entries[1].id, "maps-1");
    }

    #[test]
    fn test_empty_capture_rejected() {
        let mut session = GestureSession::new();
        assert!(matches!(
            session.add_capture("maps", &vec![]),
            Err(SessionError::EmptySequence)
        ));
    }

    #[test]
    fn test_snapshots_are_copy_on_write() {
        let mut session = GestureSession::new();
        session.add_capture("maps", &capture(1.0, 12)).unwrap();

        // Un lector se queda con el snapshot anterior
        let before = session.dataset();
        session.add_capture("maps", &capture(1.2, 12)).unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(session.dataset().len(), 2);
    }

    #[test]
    fn test_training_lifecycle() {
        let mut session = GestureSession::new();
        for i in 0..4 {
            session
                .add_capture("maps", &capture(0.5 + i as f32 * 0.05, 12))
                .unwrap();
            session
                .add_capture("whatsapp", &jolt(8.0 + i as f32 * 0.1, 12))
                .unwrap();
        }

        let params = TrainingParams {
            epochs: 40,
            learning_rate: 0.1,
        };
        assert_eq!(session.start_training(params), TrainingDispatch::Started);
        assert!(session.training_in_flight());

        wait_for_model(&mut session).unwrap();
        assert!(!session.training_in_flight());

        let model = session.model().unwrap();
        assert_eq!(model.labels.len(), 2);
        assert_eq!(model.loss_history.len(), 40);

        session.shutdown();
    }

    #[test]
    fn test_second_training_request_is_busy() {
        let mut session = GestureSession::new();
        for i in 0..3 {
            session
                .add_capture("maps", &capture(0.5 + i as f32 * 0.05, 10))
                .unwrap();
            session
                .add_capture("whatsapp", &jolt(7.0, 10))
                .unwrap();
        }

        let params = TrainingParams {
            epochs: 2000,
            learning_rate: 0.05,
        };
        assert_eq!(session.start_training(params), TrainingDispatch::Started);
        assert_eq!(session.start_training(params), TrainingDispatch::Busy);

        wait_for_model(&mut session).unwrap();
        session.shutdown();
    }

    #[test]
    fn test_training_error_is_reported() {
        let mut session = GestureSession::new();
        // Una sola etiqueta: el entrenamiento debe fallar con validación
        session.add_capture("maps", &capture(1.0, 10)).unwrap();
        session.start_training(TrainingParams::default());

        let outcome = wait_for_model(&mut session);
        assert!(matches!(outcome, Err(TrainingError::NotEnoughLabels { .. })));
        assert!(session.model().is_none());
        session.shutdown();
    }

    #[test]
    fn test_classify_before_and_after_training() {
        let mut session = GestureSession::new();
        let query = capture(1.0, 12);

        // Sesión vacía: ninguna rama disponible
        let result = session.classify(&query).unwrap();
        assert!(result.dtw.is_none());
        assert!(result.softmax.is_none());

        for i in 0..3 {
            session
                .add_capture("maps", &capture(0.9 + i as f32 * 0.1, 12))
                .unwrap();
            session
                .add_capture("whatsapp", &jolt(9.0 + i as f32 * 0.1, 12))
                .unwrap();
        }

        // Con plantillas pero sin modelo: solo DTW
        let result = session.classify(&query).unwrap();
        assert!(result.dtw.is_some());
        assert!(result.softmax.is_none());

        session.start_training(TrainingParams {
            epochs: 40,
            learning_rate: 0.1,
        });
        wait_for_model(&mut session).unwrap();

        let result = session.classify(&query).unwrap();
        let dtw = result.dtw.unwrap();
        assert_eq!(dtw.prediction.label, "maps");
        assert!(result.softmax.is_some());

        session.shutdown();
    }

    #[test]
    fn test_clear_resets_collections_keeps_model() {
        let mut session = GestureSession::new();
        for _ in 0..2 {
            session.add_capture("maps", &capture(1.0, 10)).unwrap();
            session.add_capture("whatsapp", &jolt(7.0, 10)).unwrap();
        }
        session.start_training(TrainingParams {
            epochs: 20,
            learning_rate: 0.1,
        });
        wait_for_model(&mut session).unwrap();

        session.clear();
        assert!(session.dataset().is_empty());
        assert!(session.templates().is_empty());
        assert!(!session.dataset().feature_names.is_empty());
        assert!(session.model().is_some());

        session.shutdown();
    }
}
