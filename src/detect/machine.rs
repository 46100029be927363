//! The detection state machine.

use crate::DetectionResult;
use crate::cancel::CancellationToken;
use crate::classifier::{Classifier, ClassifierSession};
use crate::reader::ReadEvent;

/// Where a detection operation is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectState {
    /// Created, no event handled yet.
    Idle,
    /// Feeding chunks to the classifier.
    Reading,
    /// Reading ended; waiting for [`Detection::finalize`].
    Finalizing,
    /// The result was produced.
    Completed,
}

/// Why reading ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The source was exhausted or the read limit reached.
    EndOfStream,
    /// The cancellation token was set.
    Cancelled,
    /// A read failed.
    Io(std::io::ErrorKind),
    /// The classifier reported an unrecoverable failure.
    ClassifierFailed,
    /// Finalized before reading ended (the driver was torn down).
    Abandoned,
}

/// What the driver should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Issue the next read.
    Continue,
    /// Stop reading and call [`Detection::finalize`].
    Finalize,
}

/// One detection operation: `Idle → Reading → Finalizing → Completed`.
///
/// The driver feeds every [`ReadEvent`] to [`on_event`](Self::on_event) and
/// keeps reading while it returns [`Step::Continue`]. Reading stops at the
/// first final event, I/O error, classifier failure or observed cancellation.
/// [`finalize`](Self::finalize) then produces the result, exactly once.
///
/// # Example
///
/// ```
/// use encsniff::{
///     CancellationToken, CandidateClassifier, ChunkReader, ClassifierSession,
///     DetectConfig, Detection, Step,
/// };
///
/// let token = CancellationToken::new();
/// let session = ClassifierSession::new(CandidateClassifier::new());
/// let mut detection = Detection::new(session, token.clone());
/// let mut reader = ChunkReader::new(&b"hello world"[..], &DetectConfig::default());
///
/// detection.start();
/// while let Some(event) = reader.next_event(detection.token()) {
///     if detection.on_event(event) == Step::Finalize {
///         break;
///     }
/// }
/// assert_eq!(detection.finalize().as_deref(), Some("ASCII"));
/// ```
#[derive(Debug)]
pub struct Detection<C> {
    session: ClassifierSession<C>,
    state: DetectState,
    cancel: CancellationToken,
    termination: Option<Termination>,
    chunks: u64,
}

impl<C: Classifier> Detection<C> {
    /// Creates an idle detection over `session`.
    ///
    /// A session that was finished or already fed is reset first.
    pub fn new(mut session: ClassifierSession<C>, cancel: CancellationToken) -> Self {
        if session.is_finished() || session.bytes_analyzed() > 0 {
            session.reset();
        }
        Self {
            session,
            state: DetectState::Idle,
            cancel,
            termination: None,
            chunks: 0,
        }
    }

    /// Enters [`DetectState::Reading`].
    ///
    /// # Panics
    ///
    /// Panics unless the detection is idle; reading is entered once.
    pub fn start(&mut self) {
        assert_eq!(
            self.state,
            DetectState::Idle,
            "Detection::start called twice"
        );
        self.state = DetectState::Reading;
    }

    /// Handles one read event and decides whether reading continues.
    ///
    /// A non-empty chunk is analyzed first, even if the event is final or
    /// cancellation was requested meanwhile.
    ///
    /// # Panics
    ///
    /// Panics unless the detection is reading.
    pub fn on_event(&mut self, event: ReadEvent) -> Step {
        assert_eq!(
            self.state,
            DetectState::Reading,
            "Detection::on_event called outside of Reading"
        );

        if !event.chunk.is_empty() {
            self.chunks += 1;
            tracing::trace!(
                chunk = self.chunks,
                len = event.chunk.len(),
                is_final = event.is_final,
                "analyzing chunk"
            );
            if !self.session.analyze(&event.chunk) {
                tracing::warn!(
                    bytes = self.session.bytes_analyzed(),
                    "classifier failed, finalizing with partial input"
                );
                return self.stop(Termination::ClassifierFailed);
            }
        }

        if let Some(error) = event.error {
            tracing::warn!(
                error = %error,
                bytes = self.session.bytes_analyzed(),
                "read failed, finalizing with partial input"
            );
            return self.stop(Termination::Io(error.kind()));
        }

        if self.cancel.is_cancelled() {
            return self.stop(Termination::Cancelled);
        }

        if event.is_final {
            return self.stop(Termination::EndOfStream);
        }

        Step::Continue
    }

    fn stop(&mut self, termination: Termination) -> Step {
        self.termination = Some(termination);
        self.state = DetectState::Finalizing;
        Step::Finalize
    }

    /// Finishes the classifier session and returns the result.
    ///
    /// Callable from any state but [`DetectState::Completed`]; finalizing
    /// while still idle or reading records [`Termination::Abandoned`].
    ///
    /// # Panics
    ///
    /// Panics if the detection already completed.
    pub fn finalize(&mut self) -> DetectionResult {
        assert_ne!(
            self.state,
            DetectState::Completed,
            "Detection::finalize called twice"
        );
        let termination = *self.termination.get_or_insert(Termination::Abandoned);
        self.state = DetectState::Completed;

        let result = self.session.finish();
        tracing::debug!(
            bytes = self.session.bytes_analyzed(),
            chunks = self.chunks,
            ?termination,
            result = result.as_deref().unwrap_or("<none>"),
            "detection finished"
        );
        result
    }

    /// Returns the current state.
    pub fn state(&self) -> DetectState {
        self.state
    }

    /// Returns why reading ended, once it has.
    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    /// Returns the cancellation token this detection consults.
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Returns the number of non-empty chunks analyzed.
    pub fn chunks_analyzed(&self) -> u64 {
        self.chunks
    }

    /// Returns the number of bytes analyzed.
    pub fn bytes_analyzed(&self) -> u64 {
        self.session.bytes_analyzed()
    }

    /// Consumes the detection and returns the session for reuse.
    pub fn into_session(self) -> ClassifierSession<C> {
        self.session
    }
}
