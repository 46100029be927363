//! encsniff
//!
//! Streaming character-encoding detection for Rust.
//!
//! `encsniff` reads a byte source in bounded chunks, feeds them to an
//! incremental classifier and reports one best-effort verdict per operation.
//! It is built for sources that are large or cannot be rewound:
//!
//! - multi-gigabyte files
//! - pipes and sockets
//! - already-open file handles
//! - async readers
//!
//! The crate intentionally:
//! - never buffers more than the configured high-water mark
//! - never closes a source while a read on it may still run
//! - never fails mid-stream: read and classifier errors degrade to a
//!   best-effort result
//! - always delivers exactly one result per started operation, cancelled or not
//!
//! The classifier is pluggable through [`Classifier`]; the built-in
//! [`CandidateClassifier`] recognizes ASCII, UTF-8/16 (BOM), Shift_JIS, EUC-JP,
//! ISO-2022-JP, GB18030, Big5, EUC-KR and falls back to Windows-1252.
//!
//! # Executors
//!
//! ```no_run
//! use std::sync::mpsc;
//! use encsniff::{DetectConfig, Detector, SerialExecutor};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let detector = Detector::new(DetectConfig::default())?;
//!     let (tx, rx) = mpsc::channel();
//!
//!     let _token = detector.detect_path(
//!         "data.txt",
//!         SerialExecutor::new("analysis")?,
//!         SerialExecutor::new("completion")?,
//!         move |result| {
//!             tx.send(result).ok();
//!         },
//!     )?;
//!
//!     println!("encoding: {:?}", rx.recv()?);
//!     Ok(())
//! }
//! ```
//!
//! # Async (feature = "async-io")
//!
//! ```ignore
//! use tokio_util::compat::TokioAsyncReadCompatExt;
//! use encsniff::{CancellationToken, DetectConfig, Detector};
//!
//! async fn demo(path: &str) -> Result<(), Box<dyn std::error::Error>> {
//!     let detector = Detector::new(DetectConfig::default())?;
//!     let file = tokio::fs::File::open(path).await?;
//!     let result = detector.detect_async(file.compat(), &CancellationToken::new()).await;
//!     println!("encoding: {:?}", result);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cancel;
mod classifier;
mod config;
mod detect;
mod error;
mod executor;
mod reader;

//
// Public surface
//

pub use cancel::CancellationToken;
pub use classifier::{CandidateClassifier, Classifier, ClassifierSession};
pub use config::{DEFAULT_HIGH_WATER_MARK, DetectConfig, MAX_HIGH_WATER_MARK};
pub use detect::{DetectState, Detection, Detector, Step, Termination};
pub use error::DetectError;
pub use executor::{Executor, InlineExecutor, SerialExecutor, Task};
pub use reader::{ChunkReader, ReadEvent};

#[cfg(feature = "async-io")]
pub use reader::ChunkStream;

/// Outcome of one detection: an encoding identifier such as `"UTF-8"` or
/// `"SHIFT_JIS"`, or `None` when no verdict could be reached (no data,
/// binary data, or nothing analyzable before cancellation).
pub type DetectionResult = Option<String>;
