use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use csv::ReaderBuilder;

use crate::types::{GestureSequence, SensorSample};

/// Carga una secuencia de captura desde un CSV en el formato
/// timestamp_ms,ax,ay,az,gx,gy,gz con cabecera, una muestra por fila,
/// ordenado por timestamp.
pub fn load_sequence_from_csv(path: impl AsRef<Path>) -> Result<GestureSequence> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("No se pudo abrir el CSV {:?}", path))?;

    let mut sequence: GestureSequence = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record =
            result.with_context(|| format!("Fila {} inválida en {:?}", row_idx + 1, path))?;
        if record.len() < 7 {
            bail!("La fila {} no tiene 7 columnas", row_idx + 1);
        }

        let timestamp_ms: u64 = record[0]
            .parse()
            .with_context(|| format!("timestamp_ms inválido en fila {}", row_idx + 1))?;
        let ax: f32 = record[1].parse()?;
        let ay: f32 = record[2].parse()?;
        let az: f32 = record[3].parse()?;
        let gx: f32 = record[4].parse()?;
        let gy: f32 = record[5].parse()?;
        let gz: f32 = record[6].parse()?;

        if let Some(last) = sequence.last() {
            if timestamp_ms < last.timestamp_ms {
                bail!(
                    "Timestamps fuera de orden en fila {}: {} < {}",
                    row_idx + 1,
                    timestamp_ms,
                    last.timestamp_ms
                );
            }
        }

        sequence.push(SensorSample::new(timestamp_ms, ax, ay, az, gx, gy, gz));
    }

    if sequence.is_empty() {
        return Err(anyhow!("El CSV {:?} no contiene muestras", path));
    }

    Ok(sequence)
}

/// Escribe una secuencia en el mismo formato CSV que acepta el cargador
pub fn write_sequence_to_csv(path: impl AsRef<Path>, sequence: &[SensorSample]) -> Result<()> {
    let path = path.as_ref();
    let mut file =
        File::create(path).with_context(|| format!("No se pudo crear el CSV {:?}", path))?;

    writeln!(file, "timestamp_ms,ax,ay,az,gx,gy,gz")?;
    for sample in sequence {
        writeln!(
            file,
            "{},{},{},{},{},{},{}",
            sample.timestamp_ms, sample.ax, sample.ay, sample.az, sample.gx, sample.gy, sample.gz,
        )?;
    }

    Ok(())
}
