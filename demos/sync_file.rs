//! Detect the encoding of a file on a background executor.
//!
//! Run with:
//!     cargo run --example sync_file -- <path>

use std::env;
use std::sync::mpsc;
use std::time::Instant;

use encsniff::{DetectConfig, Detector, SerialExecutor};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = env::args()
        .nth(1)
        .ok_or("usage: sync_file <path>")?;

    let detector = Detector::new(DetectConfig::new(64 * 1024)?)?;
    let analysis = SerialExecutor::new("encsniff-analysis")?;
    let completion = SerialExecutor::new("encsniff-completion")?;
    let (tx, rx) = mpsc::channel();

    let start = Instant::now();
    let _token = detector.detect_path(&path, analysis, completion, move |result| {
        tx.send(result).ok();
    })?;

    let result = rx.recv()?;
    println!("{}: {:?} ({:?})", path, result, start.elapsed());

    Ok(())
}
