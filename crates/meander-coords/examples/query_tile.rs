//! Example: list the geometry of one segment from a coordinate directory.
//!
//! Usage: cargo run --example query_tile -- <huc> <segment_id> [coords_dir]

use meander_coords::{CoordinateManager, CoordinateSource, SegmentId};
use std::env;
use std::time::Instant;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <huc> <segment_id> [coords_dir]", args[0]);
        eprintln!("Example: {} 0601 5000100001234 ./coordinates", args[0]);
        std::process::exit(1);
    }

    let huc = &args[1];
    let id = SegmentId::parse_key(&args[2]).expect("Invalid segment id");
    let dir = args.get(3).map(|s| s.as_str()).unwrap_or("coordinates");

    let mut manager = CoordinateManager::new();
    let count = manager.add_directory(dir).expect("Failed to index coordinate directory");
    println!("Indexed {} tiles: {:?}", count, manager.units());

    let start = Instant::now();
    let tile = match manager.load_tile(huc) {
        Ok(tile) => tile,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    println!(
        "Loaded tile {} ({} segments) in {:.3}s",
        tile.huc(),
        tile.len(),
        start.elapsed().as_secs_f64()
    );

    match tile.get(id) {
        Some(line) => {
            println!("Segment {}: {} vertices, length {:.1}", id, line.len(), line.length());
            for p in line.points() {
                println!("  {:.3}, {:.3}", p.x, p.y);
            }
        }
        None => {
            eprintln!("Segment {} not found in tile {}", id, huc);
            std::process::exit(1);
        }
    }
}
