// Clasificación de capturas de gestos IMU contra un modelo entrenado.
//
// Uso:
//     gestoml <modelo.json> <captura.csv>... [--templates=DIR] [--dataset=FILE] [--smooth=N]
//
// Cada captura es un CSV timestamp_ms,ax,ay,az,gx,gy,gz. Con --templates, el
// directorio debe contener una carpeta por etiqueta con los CSV de sus
// ejemplares (templates/maps/*.csv) y se clasifica también por DTW. Con
// --dataset se añade el baseline de vecino más cercano.

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use gestoml::csv_loader::load_sequence_from_csv;
use gestoml::dataset::GestureDataset;
use gestoml::feature_extractor;
use gestoml::gesture_classifier::GestureClassifier;
use gestoml::nearest_neighbor::predict_nn;
use gestoml::preprocess;
use gestoml::template_store::TemplateStore;
use gestoml::types::PredictionResult;

struct Options {
    model_path: PathBuf,
    captures: Vec<PathBuf>,
    templates_dir: Option<PathBuf>,
    dataset_path: Option<PathBuf>,
    smooth_window: usize,
}

fn parse_args() -> Result<Options> {
    let mut templates_dir = None;
    let mut dataset_path = None;
    let mut smooth_window = gestoml::session::DEFAULT_SMOOTH_WINDOW;
    let mut positional: Vec<PathBuf> = Vec::new();

    for arg in env::args().skip(1) {
        if let Some(value) = arg.strip_prefix("--templates=") {
            templates_dir = Some(PathBuf::from(value));
        } else if let Some(value) = arg.strip_prefix("--dataset=") {
            dataset_path = Some(PathBuf::from(value));
        } else if let Some(value) = arg.strip_prefix("--smooth=") {
            smooth_window = value
                .parse()
                .with_context(|| format!("--smooth inválido: '{}'", value))?;
        } else if arg.starts_with("--") {
            bail!("Flag desconocida: {}", arg);
        } else {
            positional.push(PathBuf::from(arg));
        }
    }

    if positional.len() < 2 {
        bail!("Uso: gestoml <modelo.json> <captura.csv>... [--templates=DIR] [--dataset=FILE] [--smooth=N]");
    }

    let model_path = positional.remove(0);
    Ok(Options {
        model_path,
        captures: positional,
        templates_dir,
        dataset_path,
        smooth_window,
    })
}

/// Carga un almacén de plantillas desde un directorio con una carpeta por
/// etiqueta, igual que el layout de capturas de entrenamiento
fn load_templates(dir: &PathBuf, smooth_window: usize) -> Result<TemplateStore> {
    let mut store = TemplateStore::new();

    for entry in fs::read_dir(dir).with_context(|| format!("No se pudo leer {:?}", dir))? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let label = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };

        for csv_entry in fs::read_dir(&path)? {
            let csv_path = csv_entry?.path();
            let is_csv = csv_path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false);
            if !is_csv {
                continue;
            }

            let sequence = load_sequence_from_csv(&csv_path)?;
            let smoothed = preprocess::smooth(&sequence, smooth_window);
            store
                .add_exemplar(&label, smoothed)
                .with_context(|| format!("Ejemplar inválido: {:?}", csv_path))?;
        }
    }

    if store.is_empty() {
        bail!("El directorio {:?} no contiene plantillas", dir);
    }
    Ok(store)
}

fn print_top(result: &PredictionResult, take: usize) {
    for (idx, (label, score)) in result.distribution.iter().take(take).enumerate() {
        println!("     {:>2}. {:<20} {:>6.2}%", idx + 1, label, score * 100.0);
    }
}

fn main() -> Result<()> {
    let opts = parse_args()?;

    let classifier = GestureClassifier::from_file(&opts.model_path)
        .with_context(|| format!("No se pudo cargar el modelo {:?}", opts.model_path))?;
    println!(
        "✅ Modelo cargado: {} etiquetas, {} muestras de entrenamiento",
        classifier.labels().len(),
        classifier.model().training_samples
    );

    let templates = match &opts.templates_dir {
        Some(dir) => {
            let store = load_templates(dir, opts.smooth_window)?;
            println!(
                "✅ Plantillas: {} etiquetas, {} ejemplares",
                store.templates().len(),
                store.exemplar_count()
            );
            for stats in store.stats() {
                println!(
                    "     {:<20} {} ejemplares, distancia intra media {:.3}",
                    stats.label, stats.exemplar_count, stats.mean_intra_distance
                );
            }
            Some(store)
        }
        None => None,
    };

    let dataset = match &opts.dataset_path {
        Some(path) => {
            let dataset = GestureDataset::from_file(path)
                .with_context(|| format!("No se pudo cargar el dataset {:?}", path))?;
            println!("✅ Dataset para baseline NN: {} entradas", dataset.len());
            Some(dataset)
        }
        None => None,
    };

    for capture_path in &opts.captures {
        println!("\n🎞️  {:?}", capture_path);

        let raw = load_sequence_from_csv(capture_path)?;
        let smoothed = preprocess::smooth(&raw, opts.smooth_window);
        let features = feature_extractor::extract(&smoothed);

        let prediction = classifier.predict(&features.values)?;
        println!(
            "  🥇 softmax: {} ({:.1}%)",
            prediction.label,
            prediction.confidence * 100.0
        );
        print_top(&prediction, 5);

        if let Some(store) = &templates {
            let dtw = store.classify(&smoothed)?;
            if dtw.accepted {
                println!(
                    "  🎯 DTW: {} (min {:.3} < umbral {:.3})",
                    dtw.prediction.label, dtw.min_distance, dtw.threshold
                );
            } else {
                // Baja confianza: se informa, no dispara acciones
                println!(
                    "  ⚠️  DTW: {} con baja confianza (min {:.3} >= umbral {:.3})",
                    dtw.prediction.label, dtw.min_distance, dtw.threshold
                );
            }
        }

        if let Some(dataset) = &dataset {
            let nn = predict_nn(dataset, &features.values)?;
            println!("  📍 NN: {} ({:.1}%)", nn.label, nn.confidence * 100.0);
        }
    }

    Ok(())
}
