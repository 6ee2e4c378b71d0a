use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use gestoml::dataset::GestureDataset;
use gestoml::trainer::{self, TrainingParams, DEFAULT_EPOCHS, DEFAULT_LEARNING_RATE};

const DEFAULT_OUTPUT: &str = "gesture_ml_model.json";

struct TrainOptions {
    dataset_path: PathBuf,
    output_path: PathBuf,
    params: TrainingParams,
}

fn print_usage() {
    println!("Uso: train_model <dataset.json> [output.json] [--epochs=N] [--lr=F]");
    println!();
    println!("  --epochs=N   Número de épocas (defecto {})", DEFAULT_EPOCHS);
    println!(
        "  --lr=F       Tasa de aprendizaje (defecto {})",
        DEFAULT_LEARNING_RATE
    );
    println!("  --help       Muestra esta ayuda");
}

fn parse_args() -> Result<TrainOptions> {
    let mut epochs = DEFAULT_EPOCHS;
    let mut learning_rate = DEFAULT_LEARNING_RATE;
    let mut positional: Vec<String> = Vec::new();

    for arg in env::args().skip(1) {
        if arg == "--help" {
            print_usage();
            std::process::exit(0);
        } else if let Some(value) = arg.strip_prefix("--epochs=") {
            let parsed: i64 = value
                .parse()
                .with_context(|| format!("--epochs inválido: '{}'", value))?;
            if parsed <= 0 {
                bail!("--epochs debe ser un entero positivo, recibido {}", parsed);
            }
            epochs = parsed as usize;
        } else if let Some(value) = arg.strip_prefix("--lr=") {
            let parsed: f32 = value
                .parse()
                .with_context(|| format!("--lr inválido: '{}'", value))?;
            if !parsed.is_finite() || parsed <= 0.0 {
                bail!("--lr debe ser un número positivo finito, recibido {}", value);
            }
            learning_rate = parsed;
        } else if arg.starts_with("--") {
            bail!("Flag desconocida: {}", arg);
        } else {
            positional.push(arg);
        }
    }

    if positional.is_empty() || positional.len() > 2 {
        bail!("Uso: train_model <dataset.json> [output.json] [--epochs=N] [--lr=F]");
    }

    let dataset_path = PathBuf::from(&positional[0]);
    let output_path = positional
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    Ok(TrainOptions {
        dataset_path,
        output_path,
        params: TrainingParams {
            epochs,
            learning_rate,
        },
    })
}

fn main() -> Result<()> {
    let opts = parse_args()?;

    let dataset = GestureDataset::from_file(&opts.dataset_path)
        .with_context(|| format!("No se pudo cargar el dataset {:?}", opts.dataset_path))?;

    println!(
        "📚 Dataset: {} entradas, {} etiquetas",
        dataset.len(),
        dataset.labels().len()
    );
    for (label, count) in dataset.label_counts() {
        println!("   {} × {}", count, label);
    }

    println!(
        "🏋️  Entrenando: {} épocas, lr={}",
        opts.params.epochs, opts.params.learning_rate
    );
    let model = trainer::train(&dataset, opts.params)?;

    let first_loss = model.loss_history.first().copied().unwrap_or(0.0);
    let last_loss = model.loss_history.last().copied().unwrap_or(0.0);
    println!(
        "📉 Pérdida: {:.4} → {:.4} en {} épocas",
        first_loss,
        last_loss,
        model.loss_history.len()
    );

    model
        .to_file(&opts.output_path)
        .with_context(|| format!("No se pudo escribir el modelo en {:?}", opts.output_path))?;
    println!("✅ Modelo guardado en {:?}", opts.output_path);

    Ok(())
}
