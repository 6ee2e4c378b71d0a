use crate::types::{SensorSample, NUM_AXES};

/// Secuencia normalizada: una fila de 6 valores z-score por muestra
type NormalizedSequence = Vec<[f32; NUM_AXES]>;

/// Normalización z-score por eje, calculada sobre la propia secuencia.
/// Una desviación estándar de cero se sustituye por 1 para mantener la
/// normalización bien definida. Esta normalización es local a cada
/// comparación DTW y es independiente de la normalización global del
/// entrenador softmax.
fn normalize(sequence: &[SensorSample]) -> NormalizedSequence {
    let n = sequence.len();
    if n == 0 {
        return Vec::new();
    }

    let mut means = [0.0f32; NUM_AXES];
    for sample in sequence {
        let axes = sample.axes();
        for (m, v) in means.iter_mut().zip(axes.iter()) {
            *m += v;
        }
    }
    for m in means.iter_mut() {
        *m /= n as f32;
    }

    let mut stds = [0.0f32; NUM_AXES];
    for sample in sequence {
        let axes = sample.axes();
        for (s, (v, m)) in stds.iter_mut().zip(axes.iter().zip(means.iter())) {
            *s += (v - m).powi(2);
        }
    }
    for s in stds.iter_mut() {
        *s = (*s / n as f32).sqrt();
        if *s == 0.0 {
            *s = 1.0;
        }
    }

    sequence
        .iter()
        .map(|sample| {
            let axes = sample.axes();
            let mut row = [0.0f32; NUM_AXES];
            for (i, slot) in row.iter_mut().enumerate() {
                *slot = (axes[i] - means[i]) / stds[i];
            }
            row
        })
        .collect()
}

/// Distancia euclídea entre dos muestras normalizadas
fn sample_cost(a: &[f32; NUM_AXES], b: &[f32; NUM_AXES]) -> f32 {
    let mut acc = 0.0f32;
    for i in 0..NUM_AXES {
        let d = a[i] - b[i];
        acc += d * d;
    }
    acc.sqrt()
}

/// Distancia DTW entre dos secuencias.
///
/// Matriz de costes con `D[0][0] = 0`, resto de bordes en infinito y
/// recurrencia `D[i][j] = cost(i,j) + min(D[i-1][j], D[i][j-1], D[i-1][j-1])`.
/// La distancia final se normaliza por `n + m` (longitudes combinadas, no la
/// longitud del camino óptimo); los umbrales de aceptación están calibrados
/// contra este denominador exacto. Comparar contra una secuencia vacía
/// devuelve infinito (no-match garantizado).
pub fn dtw_distance(a: &[SensorSample], b: &[SensorSample]) -> f32 {
    if a.is_empty() || b.is_empty() {
        return f32::INFINITY;
    }

    let na = normalize(a);
    let nb = normalize(b);
    let n = na.len();
    let m = nb.len();

    let mut matrix = vec![vec![f32::INFINITY; m + 1]; n + 1];
    matrix[0][0] = 0.0;

    for i in 1..=n {
        for j in 1..=m {
            let cost = sample_cost(&na[i - 1], &nb[j - 1]);
            let best = matrix[i - 1][j]
                .min(matrix[i][j - 1])
                .min(matrix[i - 1][j - 1]);
            matrix[i][j] = cost + best;
        }
    }

    matrix[n][m] / (n + m) as f32
}
