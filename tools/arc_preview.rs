/// Arc Preview — analyzes a text file and prints its emotions and arcs.
///
/// Usage: arc_preview --config <config.ron> --input <file.txt> [--lexicon <variant>]
///        [--strategy <filtered|unfiltered>] [--lemmas <lemmas.ron>]
///        [--harmonics <k1,k2,..>] [--real] [--normalize] [--mask]
use std::collections::BTreeSet;
use std::env;
use std::path::Path;
use std::process;

use emotion_arc::core::pipeline::EmotionAnalyzer;
use emotion_arc::core::smoothing::{mask_by_reference, normalize, Series, TransformKind};
use emotion_arc::core::strategy::Strategy;
use emotion_arc::core::text::TableLemmatizer;
use emotion_arc::schema::emotion::EmotionNames;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: arc_preview --config <config.ron> --input <file.txt> \
[--lexicon <variant>] [--strategy <filtered|unfiltered>] [--lemmas <lemmas.ron>] \
[--harmonics <k1,k2,..>] [--real] [--normalize] [--mask]";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    let mut config = None;
    let mut input = None;
    let mut lexicon = None;
    let mut strategy = None;
    let mut lemmas = None;
    let mut harmonics = BTreeSet::new();
    let mut kind = TransformKind::FullComplex;
    let mut normalized = false;
    let mut masked = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                config = Some(required_value(&args, i, "--config"));
            }
            "--input" => {
                i += 1;
                input = Some(required_value(&args, i, "--input"));
            }
            "--lexicon" => {
                i += 1;
                lexicon = Some(required_value(&args, i, "--lexicon"));
            }
            "--strategy" => {
                i += 1;
                strategy = Some(match required_value(&args, i, "--strategy").as_str() {
                    "filtered" => Strategy::Filtered,
                    "unfiltered" => Strategy::Unfiltered,
                    other => {
                        eprintln!("Error: unknown strategy '{}'", other);
                        process::exit(1);
                    }
                });
            }
            "--lemmas" => {
                i += 1;
                lemmas = Some(required_value(&args, i, "--lemmas"));
            }
            "--harmonics" => {
                i += 1;
                for part in required_value(&args, i, "--harmonics").split(',') {
                    let keep: usize = part.trim().parse().unwrap_or_else(|_| {
                        eprintln!("Error: --harmonics takes comma-separated positive integers");
                        process::exit(1);
                    });
                    harmonics.insert(keep);
                }
            }
            "--real" => kind = TransformKind::RealOnly,
            "--normalize" => normalized = true,
            "--mask" => masked = true,
            "--help" | "-h" => {
                println!("{}", USAGE);
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let config_path = config.unwrap_or_else(|| {
        eprintln!("Error: --config is required");
        eprintln!("{}", USAGE);
        process::exit(1);
    });
    let input_path = input.unwrap_or_else(|| {
        eprintln!("Error: --input is required");
        eprintln!("{}", USAGE);
        process::exit(1);
    });

    let mut builder = EmotionAnalyzer::builder().config_path(&config_path);
    if let Some(ref path) = lemmas {
        let table = TableLemmatizer::load_from_ron(Path::new(path)).unwrap_or_else(|e| {
            eprintln!("Error loading lemma table '{}': {}", path, e);
            process::exit(1);
        });
        builder = builder.lemmatizer(table);
    }
    let mut analyzer = builder.build().unwrap_or_else(|e| {
        eprintln!("Error building analyzer: {}", e);
        process::exit(1);
    });

    let text = std::fs::read_to_string(&input_path).unwrap_or_else(|e| {
        eprintln!("Error reading input file '{}': {}", input_path, e);
        process::exit(1);
    });

    let strategy = strategy.unwrap_or(analyzer.config().default_strategy);
    let variant = lexicon.unwrap_or_else(|| analyzer.config().default_lexicon.clone());
    let result = analyzer
        .analyze(&text, strategy, &variant)
        .unwrap_or_else(|e| {
            eprintln!("Error analyzing '{}': {}", input_path, e);
            process::exit(1);
        });

    let names = analyzer.names().clone();
    println!(
        "=== {} ({} strategy, '{}' lexicon, {} sentence(s)) ===",
        input_path,
        strategy.name(),
        variant,
        result.sentence_count()
    );
    println!();
    println!("Aggregate:");
    for (name, count) in result.labelled(&names) {
        println!("  {:<16} {}", name, count);
    }
    println!();
    println!("Per sentence:");
    for (index, vector) in result.per_sentence.iter().enumerate() {
        println!("  [{:>3}] {:?}", index, vector.values());
    }

    if harmonics.is_empty() {
        return;
    }

    let arcs = analyzer
        .smooth(&result.per_sentence, &harmonics, kind)
        .unwrap_or_else(|e| {
            eprintln!("Error smoothing: {}", e);
            process::exit(1);
        });
    let reference = Series::from_emotion_vectors(&result.per_sentence).unwrap_or_else(|e| {
        eprintln!("Error building reference series: {}", e);
        process::exit(1);
    });

    for (keep, arc) in &arcs.arcs {
        let mut arc = arc.clone();
        if normalized {
            arc = normalize(&arc).unwrap_or_else(|e| {
                eprintln!("Error normalizing arc: {}", e);
                process::exit(1);
            });
        }
        if masked {
            arc = mask_by_reference(&reference, &arc).unwrap_or_else(|e| {
                eprintln!("Error masking arc: {}", e);
                process::exit(1);
            });
        }
        println!();
        println!("--- Arc with {} harmonic(s) ---", keep);
        print_arc(&arc, &names);
    }
}

fn required_value(args: &[String], i: usize, flag: &str) -> String {
    args.get(i).cloned().unwrap_or_else(|| {
        eprintln!("Error: {} needs a value", flag);
        process::exit(1);
    })
}

fn print_arc(arc: &Series, names: &EmotionNames) {
    for (column, values) in arc.columns().iter().enumerate() {
        let label = names
            .get(column)
            .map(str::to_string)
            .unwrap_or_else(|| column.to_string());
        let line: Vec<String> = values.iter().map(|v| format!("{:6.3}", v)).collect();
        println!("  {:<16} {}", label, line.join(" "));
    }
}
