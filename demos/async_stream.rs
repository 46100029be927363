//! Async detection of a file with tokio and tokio-util compat.
//!
//! Run with:
//!     cargo run --example async_stream -- <path>

use std::env;

use encsniff::{CancellationToken, ChunkStream, DetectConfig, Detector};
use futures_util::StreamExt;
use tokio_util::compat::TokioAsyncReadCompatExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = env::args()
        .nth(1)
        .ok_or("usage: async_stream <path>")?;
    let config = DetectConfig::new(16 * 1024)?;

    // Raw chunk events
    let file = tokio::fs::File::open(&path).await?;
    let mut stream = ChunkStream::new(file.compat(), &config);
    let mut chunks = 0;
    while let Some(event) = stream.next().await {
        if let Some(error) = &event.error {
            eprintln!("read failed: {}", error);
        }
        if !event.chunk.is_empty() {
            chunks += 1;
        }
        if event.is_final {
            break;
        }
    }
    println!("{} chunks, {} bytes", chunks, stream.bytes_read());

    // Whole detection
    let detector = Detector::new(config)?;
    let file = tokio::fs::File::open(&path).await?;
    let result = detector
        .detect_async(file.compat(), &CancellationToken::new())
        .await;
    println!("{}: {:?}", path, result);

    Ok(())
}
