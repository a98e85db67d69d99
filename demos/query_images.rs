//! Example: Rank a directory of cover images against a query image
//!
//! Usage:
//!   cargo run --release --example query_images -- [--top N] [--components K] [--json] <query> <dir>
//!
//! Every PNG/JPEG in `<dir>` is decoded to a 20x20 grayscale matrix, a PCA
//! space is fitted over them, and the query is ranked against the set.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Instant;

use stratum_retrieval::io::decoder::decode_image_file;
use stratum_retrieval::{ImageCatalog, ImageConfig};

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();
    Ok(paths)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut json = false;
    let mut top = 5usize;
    let mut config = ImageConfig {
        seed: Some(0),
        ..ImageConfig::default()
    };
    let mut positional: Vec<String> = Vec::new();

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--top" => {
                top = args.first().ok_or("--top requires a value")?.parse()?;
                args.remove(0);
            }
            "--components" => {
                config.components = args.first().ok_or("--components requires a value")?.parse()?;
                args.remove(0);
            }
            "--help" | "-h" => {
                eprintln!("Usage: query_images [--top N] [--components K] [--json] <query> <dir>");
                return Ok(());
            }
            _ => positional.push(a),
        }
    }

    let [query_path, dir] = positional.as_slice() else {
        return Err("expected <query> <dir>".into());
    };

    let start = Instant::now();
    let mut entries = Vec::new();
    for path in list_images(Path::new(dir))? {
        match decode_image_file(&path, config.height, config.width) {
            Ok(image) => entries.push((path.display().to_string(), image)),
            Err(e) => eprintln!("Skipping {}: {}", path.display(), e),
        }
    }
    if entries.len() < 2 {
        return Err(format!("need at least 2 decodable images in {}", dir).into());
    }
    // Cannot keep more components than pixels
    config.components = config.components.min(config.height * config.width);

    let catalog = ImageCatalog::build(entries, &config)?;
    let query = decode_image_file(query_path, config.height, config.width)?;
    let matches = catalog.query(&query, top)?;

    if json {
        for m in &matches {
            println!("{}", serde_json::to_string(m)?);
        }
    } else {
        println!("Fitted {} images in {:.1} ms", catalog.len(), start.elapsed().as_secs_f32() * 1000.0);
        println!("Eigenvalues: {:?}", catalog.space().eigenvalues);
        for (rank, m) in matches.iter().enumerate() {
            println!(
                "{:>3}. {:<40} distance {:>10.3}  similarity {:>6.2}%",
                rank + 1,
                m.name,
                m.result.distance,
                m.result.similarity_percentage
            );
        }
    }

    Ok(())
}
