use crate::types::{SensorSample, AXIS_NAMES, TOTAL_FEATURES};

/// Vector de características con su esquema de nombres.
/// La lista de nombres es el esquema autoritativo: dos vectores solo son
/// comparables si sus nombres coinciden en contenido y orden.
#[derive(Debug, Clone)]
pub struct FeatureVector {
    pub names: Vec<String>,
    pub values: Vec<f32>,
}

/// Estadísticos por eje, en orden declarado
const STAT_NAMES: [&str; 7] = [
    "mean",
    "std",
    "min",
    "max",
    "range",
    "energy",
    "avg_abs_diff",
];

/// Devuelve los 51 nombres de características en el orden canónico.
/// Cualquier consumidor que indexe por posición depende de este orden.
pub fn feature_names() -> Vec<String> {
    let mut names = Vec::with_capacity(TOTAL_FEATURES);

    for axis in AXIS_NAMES {
        for stat in STAT_NAMES {
            names.push(format!("{}_{}", axis, stat));
        }
    }

    for mag in ["accel_mag", "gyro_mag"] {
        for stat in ["mean", "std", "energy"] {
            names.push(format!("{}_{}", mag, stat));
        }
    }

    names.push("duration_ms".to_string());
    names.push("sample_count".to_string());
    names.push("sample_rate_hz".to_string());

    names
}

/// Extrae las 51 características de una secuencia.
///
/// Por cada eje: mean, std (poblacional), min, max, range, energy (valor
/// cuadrático medio) y diferencia absoluta media entre muestras consecutivas.
/// Después las dos series de magnitud (accel, gyro) con mean/std/energy, y
/// finalmente duración en ms, número de muestras y frecuencia estimada en Hz.
/// Una secuencia vacía produce estadísticos en cero, nunca división por cero.
pub fn extract(sequence: &[SensorSample]) -> FeatureVector {
    let mut values = Vec::with_capacity(TOTAL_FEATURES);

    for axis_idx in 0..AXIS_NAMES.len() {
        let signal: Vec<f32> = sequence.iter().map(|s| s.axes()[axis_idx]).collect();
        values.extend(axis_stats(&signal));
    }

    let accel_mag: Vec<f32> = sequence.iter().map(|s| s.accel_magnitude()).collect();
    let gyro_mag: Vec<f32> = sequence.iter().map(|s| s.gyro_magnitude()).collect();
    for signal in [&accel_mag, &gyro_mag] {
        values.push(mean(signal));
        values.push(std_dev(signal));
        values.push(energy(signal));
    }

    let duration_ms = match (sequence.first(), sequence.last()) {
        (Some(first), Some(last)) => (last.timestamp_ms - first.timestamp_ms) as f32,
        _ => 0.0,
    };
    let sample_count = sequence.len() as f32;
    let sample_rate_hz = if duration_ms > 0.0 {
        sample_count / duration_ms * 1000.0
    } else {
        // Fallback degenerado: secuencias de una sola muestra o timestamps iguales
        sample_count
    };

    values.push(duration_ms);
    values.push(sample_count);
    values.push(sample_rate_hz);

    FeatureVector {
        names: feature_names(),
        values,
    }
}

/// Los 7 estadísticos de un eje en orden declarado
fn axis_stats(signal: &[f32]) -> [f32; 7] {
    let mn = min(signal);
    let mx = max(signal);
    [
        mean(signal),
        std_dev(signal),
        mn,
        mx,
        mx - mn,
        energy(signal),
        avg_abs_diff(signal),
    ]
}

fn mean(data: &[f32]) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f32>() / data.len() as f32
}

/// Desviación estándar poblacional (divisor n)
fn std_dev(data: &[f32]) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    let variance = data.iter().map(|x| (x - m).powi(2)).sum::<f32>() / data.len() as f32;
    variance.sqrt()
}

fn min(data: &[f32]) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().fold(f32::INFINITY, |a, &b| a.min(b))
}

fn max(data: &[f32]) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b))
}

/// Valor cuadrático medio
fn energy(data: &[f32]) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().map(|x| x * x).sum::<f32>() / data.len() as f32
}

fn avg_abs_diff(data: &[f32]) -> f32 {
    if data.len() <= 1 {
        return 0.0;
    }
    let sum: f32 = data.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    sum / (data.len() - 1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(fv: &FeatureVector, name: &str) -> f32 {
        let idx = fv.names.iter().position(|n| n == name).unwrap();
        fv.values[idx]
    }

    #[test]
    fn test_total_feature_count() {
        let names = feature_names();
        assert_eq!(names.len(), TOTAL_FEATURES);
        assert_eq!(names.len(), 51);

        let seq = vec![SensorSample::new(0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0)];
        let fv = extract(&seq);
        assert_eq!(fv.values.len(), 51);
        assert_eq!(fv.names, names);
    }

    #[test]
    fn test_declared_order_starts_with_accel_x() {
        let names = feature_names();
        assert_eq!(names[0], "accel_x_mean");
        assert_eq!(names[1], "accel_x_std");
        assert_eq!(names[6], "accel_x_avg_abs_diff");
        assert_eq!(names[7], "accel_y_mean");
        assert_eq!(names[48], "duration_ms");
        assert_eq!(names[49], "sample_count");
        assert_eq!(names[50], "sample_rate_hz");
    }

    #[test]
    fn test_constant_sequence() {
        // Secuencia constante: std=0, range=0, avg_abs_diff=0, energy=valor²
        let seq: Vec<SensorSample> = (0..10)
            .map(|i| SensorSample::new(i * 20, 3.0, 3.0, 3.0, 0.5, 0.5, 0.5))
            .collect();
        let fv = extract(&seq);

        assert!((find(&fv, "accel_x_std")).abs() < 1e-6);
        assert!((find(&fv, "accel_x_range")).abs() < 1e-6);
        assert!((find(&fv, "accel_x_avg_abs_diff")).abs() < 1e-6);
        assert!((find(&fv, "accel_x_energy") - 9.0).abs() < 1e-5);
        assert!((find(&fv, "gyro_z_energy") - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_two_sample_scenario() {
        let seq = vec![
            SensorSample::new(0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0),
            SensorSample::new(100, -1.0, 0.0, 0.0, 0.0, 0.0, 0.0),
        ];
        let fv = extract(&seq);

        assert!((find(&fv, "accel_x_mean")).abs() < 1e-6);
        assert!((find(&fv, "accel_x_std") - 1.0).abs() < 1e-6);
        assert!((find(&fv, "accel_x_range") - 2.0).abs() < 1e-6);
        assert!((find(&fv, "duration_ms") - 100.0).abs() < 1e-6);
        assert!((find(&fv, "sample_count") - 2.0).abs() < 1e-6);
        assert!((find(&fv, "sample_rate_hz") - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_sequence_all_zeros() {
        let fv = extract(&[]);
        assert_eq!(fv.values.len(), 51);
        for value in &fv.values {
            assert_eq!(*value, 0.0);
            assert!(value.is_finite());
        }
    }

    #[test]
    fn test_single_sample_fallbacks() {
        let seq = vec![SensorSample::new(500, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0)];
        let fv = extract(&seq);

        assert_eq!(find(&fv, "duration_ms"), 0.0);
        assert_eq!(find(&fv, "sample_count"), 1.0);
        // Con duración 0 la frecuencia cae al conteo de muestras
        assert_eq!(find(&fv, "sample_rate_hz"), 1.0);
        assert_eq!(find(&fv, "accel_x_avg_abs_diff"), 0.0);
    }
}
