use crate::types::{GestureSequence, SensorSample};

/// Suavizado por media móvil centrada.
///
/// Para cada índice `i` promedia las muestras en el rango inclusivo
/// `[i - window/2, i + window/2]` recortado a los bordes de la secuencia.
/// El timestamp de salida en `i` es el de la muestra original, sin promediar.
/// Con `window <= 1` o secuencias de 2 muestras o menos devuelve la entrada
/// sin cambios.
pub fn smooth(sequence: &[SensorSample], window: usize) -> GestureSequence {
    if window <= 1 || sequence.len() <= 2 {
        return sequence.to_vec();
    }

    let half = window / 2;
    let len = sequence.len();
    let mut out = Vec::with_capacity(len);

    for i in 0..len {
        let start = i.saturating_sub(half);
        let end = (i + half).min(len - 1);
        let count = (end - start + 1) as f32;

        let mut acc = [0.0f32; 6];
        for sample in &sequence[start..=end] {
            let axes = sample.axes();
            for (slot, value) in acc.iter_mut().zip(axes.iter()) {
                *slot += value;
            }
        }

        out.push(SensorSample::new(
            sequence[i].timestamp_ms,
            acc[0] / count,
            acc[1] / count,
            acc[2] / count,
            acc[3] / count,
            acc[4] / count,
            acc[5] / count,
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq_from_ax(values: &[f32]) -> GestureSequence {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| SensorSample::new(i as u64 * 10, v, 0.0, 0.0, 0.0, 0.0, 0.0))
            .collect()
    }

    #[test]
    fn test_window_one_returns_input() {
        let seq = seq_from_ax(&[1.0, 5.0, 9.0, 2.0]);
        let out = smooth(&seq, 1);
        for (a, b) in seq.iter().zip(out.iter()) {
            assert_eq!(a.ax, b.ax);
        }
    }

    #[test]
    fn test_short_sequence_returns_input() {
        let seq = seq_from_ax(&[1.0, 100.0]);
        let out = smooth(&seq, 5);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].ax, 1.0);
        assert_eq!(out[1].ax, 100.0);
    }

    #[test]
    fn test_interior_average() {
        let seq = seq_from_ax(&[0.0, 3.0, 6.0, 9.0, 12.0]);
        let out = smooth(&seq, 3);

        // Índice 2 promedia [1..=3]: (3 + 6 + 9) / 3 = 6
        assert!((out[2].ax - 6.0).abs() < 1e-6);
        assert_eq!(out.len(), seq.len());
    }

    #[test]
    fn test_boundary_clamps_window() {
        let seq = seq_from_ax(&[0.0, 3.0, 6.0, 9.0, 12.0]);
        let out = smooth(&seq, 3);

        // Índice 0 solo ve [0..=1]: (0 + 3) / 2 = 1.5
        assert!((out[0].ax - 1.5).abs() < 1e-6);
        // Índice 4 solo ve [3..=4]: (9 + 12) / 2 = 10.5
        assert!((out[4].ax - 10.5).abs() < 1e-6);
    }

    #[test]
    fn test_timestamps_preserved() {
        let seq = seq_from_ax(&[1.0, 2.0, 3.0, 4.0]);
        let out = smooth(&seq, 3);
        for (a, b) in seq.iter().zip(out.iter()) {
            assert_eq!(a.timestamp_ms, b.timestamp_ms);
        }
    }
}
