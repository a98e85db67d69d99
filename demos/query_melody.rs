//! Example: Rank melodies against a hummed query
//!
//! Usage:
//!   cargo run --release --example query_melody -- [--top N] [--config config.json] <catalog.json> <query.json>
//!
//! `catalog.json` maps names to per-quantum MIDI pitch arrays (0 = rest):
//!   {"ode to joy": [64, 64, 65, 67, ...], "scale": [60, 62, 64, ...]}
//! `query.json` is a single pitch array.

use std::collections::BTreeMap;
use std::env;
use std::time::Instant;

use stratum_retrieval::preprocessing::pitch::pitch_sequence_from_raw;
use stratum_retrieval::{MelodyCatalog, RetrievalConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut top = 10usize;
    let mut config = RetrievalConfig::default();
    let mut positional: Vec<String> = Vec::new();

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--top" => {
                top = args.first().ok_or("--top requires a value")?.parse()?;
                args.remove(0);
            }
            "--config" => {
                let path = args.first().ok_or("--config requires a path")?;
                config = RetrievalConfig::from_json(&std::fs::read_to_string(path)?)?;
                args.remove(0);
            }
            "--help" | "-h" => {
                eprintln!("Usage: query_melody [--top N] [--config FILE] <catalog.json> <query.json>");
                return Ok(());
            }
            _ => positional.push(a),
        }
    }

    let [catalog_path, query_path] = positional.as_slice() else {
        return Err("expected <catalog.json> <query.json>".into());
    };

    let raw: BTreeMap<String, Vec<i32>> = serde_json::from_str(&std::fs::read_to_string(catalog_path)?)?;
    let query: Vec<i32> = serde_json::from_str(&std::fs::read_to_string(query_path)?)?;

    let start = Instant::now();
    let entries = raw
        .into_iter()
        .map(|(name, values)| (name, pitch_sequence_from_raw(&values)))
        .collect();
    let catalog = MelodyCatalog::from_sequences(entries, config.melody)?;
    let build_ms = start.elapsed().as_secs_f32() * 1000.0;

    let matches = catalog.query(&pitch_sequence_from_raw(&query), top)?;

    println!("Indexed {} melodies in {:.1} ms", catalog.len(), build_ms);
    for (rank, m) in matches.iter().enumerate() {
        println!("{:>3}. {:<40} score {:.4}", rank + 1, m.name, m.result.score);
    }

    Ok(())
}
