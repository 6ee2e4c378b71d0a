use serde::{Deserialize, Serialize};

/// Una muestra IMU de 6 ejes: acelerómetro (ax, ay, az) + giroscopio (gx, gy, gz)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SensorSample {
    /// Timestamp monotónico en milisegundos
    pub timestamp_ms: u64,
    pub ax: f32,
    pub ay: f32,
    pub az: f32,
    pub gx: f32,
    pub gy: f32,
    pub gz: f32,
}

impl SensorSample {
    pub fn new(timestamp_ms: u64, ax: f32, ay: f32, az: f32, gx: f32, gy: f32, gz: f32) -> Self {
        Self {
            timestamp_ms,
            ax,
            ay,
            az,
            gx,
            gy,
            gz,
        }
    }

    /// Devuelve los 6 ejes en el orden canónico [ax, ay, az, gx, gy, gz]
    pub fn axes(&self) -> [f32; NUM_AXES] {
        [self.ax, self.ay, self.az, self.gx, self.gy, self.gz]
    }

    /// Magnitud del vector de aceleración
    pub fn accel_magnitude(&self) -> f32 {
        (self.ax * self.ax + self.ay * self.ay + self.az * self.az).sqrt()
    }

    /// Magnitud del vector de giro
    pub fn gyro_magnitude(&self) -> f32 {
        (self.gx * self.gx + self.gy * self.gy + self.gz * self.gz).sqrt()
    }
}

/// Secuencia de muestras ordenada por timestamp
pub type GestureSequence = Vec<SensorSample>;

/// Constantes del sistema
pub const NUM_AXES: usize = 6;
pub const STATS_PER_AXIS: usize = 7; // mean, std, min, max, range, energy, avg_abs_diff
pub const MAGNITUDE_FEATURES: usize = 6; // accel_mag y gyro_mag: mean, std, energy
pub const SCALAR_FEATURES: usize = 3; // duration_ms, sample_count, sample_rate_hz
pub const TOTAL_FEATURES: usize = NUM_AXES * STATS_PER_AXIS + MAGNITUDE_FEATURES + SCALAR_FEATURES; // 51

/// Nombres de los ejes en el orden canónico
pub const AXIS_NAMES: [&str; NUM_AXES] = [
    "accel_x", "accel_y", "accel_z", "gyro_x", "gyro_y", "gyro_z",
];

/// Resultado de una clasificación: etiqueta ganadora + distribución completa
#[derive(Debug, Clone)]
pub struct PredictionResult {
    pub label: String,
    pub confidence: f32,
    /// Distribución (etiqueta, confianza) ordenada de mayor a menor
    pub distribution: Vec<(String, f32)>,
}

impl PredictionResult {
    /// Construye el resultado a partir de pares sin ordenar.
    /// La distribución queda ordenada de mayor a menor confianza.
    pub fn from_scores(mut scores: Vec<(String, f32)>) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let (label, confidence) = scores[0].clone();
        Some(Self {
            label,
            confidence,
            distribution: scores,
        })
    }
}
