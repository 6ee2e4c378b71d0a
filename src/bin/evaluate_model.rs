use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use gestoml::dataset::GestureDataset;
use gestoml::evaluator::{
    self, DEFAULT_EVAL_EPOCHS, DEFAULT_EVAL_LEARNING_RATE, DEFAULT_TEST_FRACTION,
};
use gestoml::trainer::TrainingParams;

struct EvalOptions {
    dataset_path: PathBuf,
    test_fraction: f32,
    params: TrainingParams,
}

fn print_usage() {
    println!("Uso: evaluate_model <dataset.json> [--testFraction=F] [--epochs=N] [--lr=F]");
    println!();
    println!(
        "  --testFraction=F  Fracción reservada para test, entre 0 y 1 (defecto {})",
        DEFAULT_TEST_FRACTION
    );
    println!("  --epochs=N        Épocas de entrenamiento (defecto {})", DEFAULT_EVAL_EPOCHS);
    println!(
        "  --lr=F            Tasa de aprendizaje (defecto {})",
        DEFAULT_EVAL_LEARNING_RATE
    );
    println!("  --help            Muestra esta ayuda");
}

fn parse_args() -> Result<EvalOptions> {
    let mut test_fraction = DEFAULT_TEST_FRACTION;
    let mut epochs = DEFAULT_EVAL_EPOCHS;
    let mut learning_rate = DEFAULT_EVAL_LEARNING_RATE;
    let mut positional: Vec<String> = Vec::new();

    for arg in env::args().skip(1) {
        if arg == "--help" {
            print_usage();
            std::process::exit(0);
        } else if let Some(value) = arg.strip_prefix("--testFraction=") {
            let parsed: f32 = value
                .parse()
                .with_context(|| format!("--testFraction inválido: '{}'", value))?;
            if !parsed.is_finite() || parsed <= 0.0 || parsed >= 1.0 {
                bail!(
                    "--testFraction debe estar estrictamente entre 0 y 1, recibido {}",
                    value
                );
            }
            test_fraction = parsed;
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
        } else if !positional.is_empty() {
            bail!("Uso: evaluate_model <dataset.json> [--testFraction=F] [--epochs=N] [--lr=F]");
        } else {
            positional.push(arg);
        }
    }

    let dataset_path = match positional.into_iter().next() {
        Some(path) => PathBuf::from(path),
        None => bail!("Debes especificar un dataset.json"),
    };

    Ok(EvalOptions {
        dataset_path,
        test_fraction,
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
    println!(
        "🧪 Evaluando: testFraction={}, {} épocas, lr={}\n",
        opts.test_fraction, opts.params.epochs, opts.params.learning_rate
    );

    let (result, _model) = evaluator::evaluate(&dataset, opts.test_fraction, opts.params)?;

    println!(
        "Precisión global: {:.2}% ({}/{})",
        result.overall_accuracy * 100.0,
        result.correct,
        result.total_test_samples
    );
    println!("Muestras de test: {}", result.total_test_samples);
    println!();
    for acc in &result.per_label {
        println!(
            "{}: {:.2}% ({}/{})",
            acc.label,
            acc.accuracy() * 100.0,
            acc.correct,
            acc.total
        );
    }

    Ok(())
}
