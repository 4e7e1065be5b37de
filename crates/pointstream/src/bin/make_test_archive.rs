//! Write a synthetic JSON archive for archive playback.
//!
//! Frames are written under the `frames` group with deliberately unpadded
//! names (`frame1` ... `frameN`) so that playback order depends on numeric
//! sorting. Every other frame uses the column-major dataset shape.
//!
//! Run: `cargo run -p pointstream --features test-tools --bin make_test_archive -- [out.json] [frames] [points]`

use std::env;
use std::fs::File;
use std::io::Write;

use pointstream::archive::DEFAULT_GROUP;

const DEFAULT_OUTPUT: &str = "test_archive.json";
const DEFAULT_FRAMES: usize = 24;
const DEFAULT_POINTS: usize = 5_000;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let output = args.get(1).map_or(DEFAULT_OUTPUT, String::as_str);
    let frame_count = args.get(2).map_or(Ok(DEFAULT_FRAMES), |s| s.parse())?;
    let points = args.get(3).map_or(Ok(DEFAULT_POINTS), |s| s.parse())?;

    let mut frames = serde_json::Map::new();
    for index in 0..frame_count {
        let rows = synth_rows(index, frame_count, points);
        let dataset = if index % 2 == 0 {
            serde_json::json!(rows.iter().flatten().collect::<Vec<_>>())
        } else {
            let columns: Vec<Vec<f64>> = (0..6)
                .map(|p| rows.iter().map(|row| row[p]).collect())
                .collect();
            serde_json::json!({ "columns": columns })
        };
        frames.insert(format!("frame{}", index + 1), dataset);
    }

    let mut document = serde_json::Map::new();
    document.insert(DEFAULT_GROUP.to_string(), serde_json::Value::Object(frames));
    File::create(output)?.write_all(serde_json::to_string(&document)?.as_bytes())?;
    println!("Wrote {frame_count} frames of {points} points to {output}");

    Ok(())
}

/// A helix that rotates a little further each frame.
#[allow(clippy::cast_precision_loss)]
fn synth_rows(index: usize, frame_count: usize, points: usize) -> Vec<[f64; 6]> {
    let phase = index as f64 / frame_count.max(1) as f64 * std::f64::consts::TAU;
    (0..points)
        .map(|i| {
            let u = i as f64 / points.max(1) as f64;
            let angle = u * 40.0 + phase;
            [
                angle.cos() * 3.0,
                u * 10.0 - 5.0,
                angle.sin() * 3.0,
                (255.0 * u).round(),
                (255.0 * (1.0 - u)).round(),
                128.0,
            ]
        })
        .collect()
}
