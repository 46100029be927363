//! Streaming detection orchestration.
//!
//! - [`Detector`] - Entry point: starts detection operations
//! - [`Detection`] - Explicit state machine for one operation
//!
//! # Example
//!
//! ```no_run
//! use std::sync::mpsc;
//! use encsniff::{DetectConfig, Detector, SerialExecutor};
//!
//! let detector = Detector::new(DetectConfig::default())?;
//! let analysis = SerialExecutor::new("analysis")?;
//! let completion = SerialExecutor::new("completion")?;
//! let (tx, rx) = mpsc::channel();
//!
//! let token = detector.detect_path("data.txt", analysis, completion, move |result| {
//!     tx.send(result).ok();
//! })?;
//!
//! // token.cancel() stops reading early; the callback still fires once.
//! println!("{:?}", rx.recv()?);
//! # let _ = token;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod machine;
mod pipeline;

pub use machine::{DetectState, Detection, Step, Termination};

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use crate::DetectionResult;
use crate::cancel::CancellationToken;
use crate::classifier::{CandidateClassifier, Classifier, ClassifierSession};
use crate::config::DetectConfig;
use crate::error::DetectError;
use crate::executor::Executor;
use crate::reader::ChunkReader;

use pipeline::Pipeline;

/// Starts detection operations.
///
/// A `Detector` holds a validated [`DetectConfig`] and a factory for
/// classifiers; each operation gets its own classifier session and owns its
/// byte source until it completes.
///
/// Executor-driven operations (`detect_path`, `detect_file`,
/// `detect_reader`) return a [`CancellationToken`] immediately and report
/// through a callback that fires exactly once.
pub struct Detector<C = CandidateClassifier> {
    config: DetectConfig,
    factory: Arc<dyn Fn() -> C + Send + Sync>,
}

impl Detector<CandidateClassifier> {
    /// Creates a detector using the built-in [`CandidateClassifier`].
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::InvalidConfig`] if `config` is invalid.
    pub fn new(config: DetectConfig) -> Result<Self, DetectError> {
        Self::with_factory(config, CandidateClassifier::new)
    }
}

impl<C> Detector<C>
where
    C: Classifier + Send + 'static,
{
    /// Creates a detector whose operations use classifiers from `factory`.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::InvalidConfig`] if `config` is invalid.
    pub fn with_factory(
        config: DetectConfig,
        factory: impl Fn() -> C + Send + Sync + 'static,
    ) -> Result<Self, DetectError> {
        config.validate()?;
        Ok(Self {
            config,
            factory: Arc::new(factory),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DetectConfig {
        &self.config
    }

    /// Creates a fresh classifier session.
    pub fn session(&self) -> ClassifierSession<C> {
        ClassifierSession::new((self.factory)())
    }

    /// Opens `path` and detects its encoding.
    ///
    /// Reads and analysis run on `analysis`, one chunk per task; the callback
    /// runs on `completion`. The file is closed after the last read, before
    /// the callback is dispatched.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::Open`] if the file cannot be opened or is a
    /// directory. No callback fires in that case.
    pub fn detect_path(
        &self,
        path: impl AsRef<Path>,
        analysis: impl Executor + 'static,
        completion: impl Executor + 'static,
        on_complete: impl FnOnce(DetectionResult) + Send + 'static,
    ) -> Result<CancellationToken, DetectError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| DetectError::open(path, e))?;
        let metadata = file.metadata().map_err(|e| DetectError::open(path, e))?;
        if metadata.is_dir() {
            return Err(DetectError::open(
                path,
                io::Error::new(io::ErrorKind::IsADirectory, "is a directory"),
            ));
        }
        tracing::debug!(path = %path.display(), "detecting encoding");
        Ok(self.spawn(file, analysis, completion, on_complete))
    }

    /// Detects the encoding of an already-open file.
    ///
    /// The handle is duplicated: the operation reads through and then closes
    /// its duplicate, and the caller keeps `file`. Both share one read
    /// position, so the caller's position moves and concurrent reads by the
    /// caller interleave with the detection's.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::Open`] if the handle cannot be duplicated.
    pub fn detect_file(
        &self,
        file: &File,
        analysis: impl Executor + 'static,
        completion: impl Executor + 'static,
        on_complete: impl FnOnce(DetectionResult) + Send + 'static,
    ) -> Result<CancellationToken, DetectError> {
        let owned = file
            .try_clone()
            .map_err(|e| DetectError::open("<file handle>", e))?;
        tracing::debug!("detecting encoding of open handle");
        Ok(self.spawn(owned, analysis, completion, on_complete))
    }

    /// Detects the encoding of any reader: pipes, sockets, in-memory data.
    ///
    /// The reader is moved into the operation and dropped once reading ends.
    pub fn detect_reader<R>(
        &self,
        reader: R,
        analysis: impl Executor + 'static,
        completion: impl Executor + 'static,
        on_complete: impl FnOnce(DetectionResult) + Send + 'static,
    ) -> CancellationToken
    where
        R: Read + Send + 'static,
    {
        self.spawn(reader, analysis, completion, on_complete)
    }

    /// Detects the encoding of in-memory bytes on the calling thread.
    ///
    /// Data is analyzed in high-water-mark sized slices, honoring the read
    /// limit.
    ///
    /// # Example
    ///
    /// ```
    /// use encsniff::{DetectConfig, Detector};
    ///
    /// let detector = Detector::new(DetectConfig::default())?;
    /// assert_eq!(detector.detect_bytes(b"hello world").as_deref(), Some("ASCII"));
    /// assert_eq!(detector.detect_bytes(b""), None);
    /// # Ok::<(), encsniff::DetectError>(())
    /// ```
    pub fn detect_bytes(&self, data: &[u8]) -> DetectionResult {
        let limit = self
            .config
            .max_bytes()
            .and_then(|max| usize::try_from(max).ok())
            .map_or(data.len(), |max| max.min(data.len()));

        let mut session = self.session();
        for chunk in data[..limit].chunks(self.config.high_water_mark()) {
            if !session.analyze(chunk) {
                break;
            }
        }
        session.finish()
    }

    fn spawn<R>(
        &self,
        reader: R,
        analysis: impl Executor + 'static,
        completion: impl Executor + 'static,
        on_complete: impl FnOnce(DetectionResult) + Send + 'static,
    ) -> CancellationToken
    where
        R: Read + Send + 'static,
    {
        let token = CancellationToken::new();
        let detection = Detection::new(self.session(), token.clone());
        Pipeline::new(
            ChunkReader::new(reader, &self.config),
            detection,
            Arc::new(analysis),
            Arc::new(completion),
            Box::new(on_complete),
        )
        .start();
        token
    }
}

#[cfg(feature = "async-io")]
impl<C> Detector<C>
where
    C: Classifier + Send + 'static,
{
    /// Detects the encoding of an async reader.
    ///
    /// Runs on whatever executor polls the future; reads overlap with other
    /// tasks on that executor. Setting `cancel` stops further reads and the
    /// future resolves with a best-effort result.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use tokio_util::compat::TokioAsyncReadCompatExt;
    /// use encsniff::{CancellationToken, DetectConfig, Detector};
    ///
    /// let detector = Detector::new(DetectConfig::default())?;
    /// let file = tokio::fs::File::open("data.txt").await?;
    /// let result = detector.detect_async(file.compat(), &CancellationToken::new()).await;
    /// ```
    pub async fn detect_async<R>(&self, reader: R, cancel: &CancellationToken) -> DetectionResult
    where
        R: futures_io::AsyncRead,
    {
        use futures_core::Stream;

        let mut detection = Detection::new(self.session(), cancel.clone());
        detection.start();

        {
            let mut stream = std::pin::pin!(
                crate::reader::ChunkStream::new(reader, &self.config)
                    .with_cancellation(cancel.clone())
            );
            while let Some(event) =
                std::future::poll_fn(|cx| stream.as_mut().poll_next(cx)).await
            {
                if detection.on_event(event) == Step::Finalize {
                    break;
                }
            }
        }

        detection.finalize()
    }
}

impl<C> fmt::Debug for Detector<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<C> Clone for Detector<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config,
            factory: Arc::clone(&self.factory),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::InlineExecutor;
    use std::io::Cursor;
    use std::sync::mpsc;

    #[test]
    fn test_invalid_config_rejected() {
        let config = DetectConfig::default().with_high_water_mark(0);
        assert!(Detector::new(config).is_err());
    }

    #[test]
    fn test_detect_bytes_honors_max_bytes() {
        let mut data = b"plain ascii prefix ".to_vec();
        data.extend_from_slice("日本語".as_bytes());

        let limited = Detector::new(DetectConfig::default().with_max_bytes(Some(19))).unwrap();
        assert_eq!(limited.detect_bytes(&data).as_deref(), Some("ASCII"));

        let full = Detector::new(DetectConfig::default()).unwrap();
        assert_eq!(full.detect_bytes(&data).as_deref(), Some("UTF-8"));
    }

    #[test]
    fn test_detect_reader_inline() {
        let detector = Detector::new(DetectConfig::new(3).unwrap()).unwrap();
        let (tx, rx) = mpsc::channel();
        let token = detector.detect_reader(
            Cursor::new("naïve".as_bytes().to_vec()),
            InlineExecutor,
            InlineExecutor,
            move |result| tx.send(result).unwrap(),
        );

        assert_eq!(rx.try_recv().unwrap().as_deref(), Some("UTF-8"));
        token.cancel();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_custom_factory() {
        struct Fixed;
        impl Classifier for Fixed {
            fn reset(&mut self) {}
            fn analyze(&mut self, _chunk: &[u8]) -> bool {
                true
            }
            fn finish(&mut self) -> Option<String> {
                Some("KOI8-R".to_string())
            }
        }

        let detector = Detector::with_factory(DetectConfig::default(), || Fixed).unwrap();
        assert_eq!(detector.detect_bytes(b"x").as_deref(), Some("KOI8-R"));
    }

    #[test]
    fn test_open_error_is_synchronous() {
        let detector = Detector::new(DetectConfig::default()).unwrap();
        let (tx, rx) = mpsc::channel::<DetectionResult>();
        let err = detector
            .detect_path(
                "/definitely/not/here.txt",
                InlineExecutor,
                InlineExecutor,
                move |result| tx.send(result).unwrap(),
            )
            .unwrap_err();

        assert_eq!(err.io_kind(), Some(std::io::ErrorKind::NotFound));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_directory_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let detector = Detector::new(DetectConfig::default()).unwrap();
        let (tx, rx) = mpsc::channel::<DetectionResult>();
        let err = detector
            .detect_path(dir.path(), InlineExecutor, InlineExecutor, move |result| {
                tx.send(result).unwrap()
            })
            .unwrap_err();

        assert!(matches!(err, DetectError::Open { .. }));
        assert_eq!(err.io_kind(), Some(std::io::ErrorKind::IsADirectory));
        assert!(rx.try_recv().is_err());
    }
}
