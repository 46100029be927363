//! Lifecycle-checked classifier session.

use crate::DetectionResult;

use super::Classifier;

/// Wraps a [`Classifier`] with explicit session state.
///
/// A session is either *analyzing* or *finished*. [`finish`](Self::finish)
/// moves it to finished; [`reset`](Self::reset) starts a new session on the
/// same classifier without reallocating it.
///
/// Calling [`analyze`](Self::analyze) or [`finish`](Self::finish) on a
/// finished session is a programming error and panics.
///
/// # Example
///
/// ```
/// use encsniff::{CandidateClassifier, ClassifierSession};
///
/// let mut session = ClassifierSession::new(CandidateClassifier::new());
/// assert!(session.analyze(b"hello "));
/// assert!(session.analyze(b"world"));
/// assert_eq!(session.finish().as_deref(), Some("ASCII"));
///
/// session.reset();
/// assert_eq!(session.finish(), None);
/// ```
#[derive(Debug, Default)]
pub struct ClassifierSession<C> {
    classifier: C,
    finished: bool,
    bytes_analyzed: u64,
}

impl<C: Classifier> ClassifierSession<C> {
    /// Starts a session on `classifier`.
    ///
    /// The classifier is reset first so no state leaks in from a previous
    /// owner.
    pub fn new(mut classifier: C) -> Self {
        classifier.reset();
        Self {
            classifier,
            finished: false,
            bytes_analyzed: 0,
        }
    }

    /// Feeds `chunk` to the classifier.
    ///
    /// Returns `false` if the classifier hit an unrecoverable failure.
    ///
    /// # Panics
    ///
    /// Panics if the session is finished and was not reset.
    pub fn analyze(&mut self, chunk: &[u8]) -> bool {
        assert!(
            !self.finished,
            "ClassifierSession::analyze called after finish() without reset()"
        );
        self.bytes_analyzed += chunk.len() as u64;
        self.classifier.analyze(chunk)
    }

    /// Finishes the session and returns the verdict.
    ///
    /// An empty identifier from the classifier is reported as `None`.
    ///
    /// # Panics
    ///
    /// Panics if the session is already finished.
    pub fn finish(&mut self) -> DetectionResult {
        assert!(
            !self.finished,
            "ClassifierSession::finish called twice without reset()"
        );
        self.finished = true;
        self.classifier.finish().filter(|name| !name.is_empty())
    }

    /// Clears classifier state and starts a new session.
    pub fn reset(&mut self) {
        self.classifier.reset();
        self.finished = false;
        self.bytes_analyzed = 0;
    }

    /// Returns `true` once [`finish`](Self::finish) was called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns the number of bytes fed since the last reset.
    pub fn bytes_analyzed(&self) -> u64 {
        self.bytes_analyzed
    }

    /// Returns the wrapped classifier.
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Consumes the session and returns the classifier.
    pub fn into_inner(self) -> C {
        self.classifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records calls; reports the concatenated input as its verdict.
    #[derive(Default)]
    struct Echo {
        seen: Vec<u8>,
        resets: usize,
        fail: bool,
    }

    impl Classifier for Echo {
        fn reset(&mut self) {
            self.seen.clear();
            self.resets += 1;
        }

        fn analyze(&mut self, chunk: &[u8]) -> bool {
            self.seen.extend_from_slice(chunk);
            !self.fail
        }

        fn finish(&mut self) -> Option<String> {
            Some(String::from_utf8_lossy(&self.seen).into_owned())
        }
    }

    #[test]
    fn test_new_resets_classifier() {
        let session = ClassifierSession::new(Echo::default());
        assert_eq!(session.classifier().resets, 1);
        assert!(!session.is_finished());
    }

    #[test]
    fn test_finish_marks_finished() {
        let mut session = ClassifierSession::new(Echo::default());
        session.analyze(b"abc");
        assert_eq!(session.finish().as_deref(), Some("abc"));
        assert!(session.is_finished());
        assert_eq!(session.bytes_analyzed(), 3);
    }

    #[test]
    fn test_empty_identifier_is_none() {
        let mut session = ClassifierSession::new(Echo::default());
        assert_eq!(session.finish(), None);
    }

    #[test]
    fn test_reset_isolates_sessions() {
        let mut session = ClassifierSession::new(Echo::default());
        session.analyze(b"first");
        session.finish();

        session.reset();
        session.analyze(b"second");
        assert_eq!(session.finish().as_deref(), Some("second"));
    }

    #[test]
    fn test_failure_still_allows_finish() {
        let mut session = ClassifierSession::new(Echo {
            fail: true,
            ..Echo::default()
        });
        assert!(!session.analyze(b"partial"));
        assert_eq!(session.finish().as_deref(), Some("partial"));
    }

    #[test]
    #[should_panic(expected = "finish called twice")]
    fn test_double_finish_panics() {
        let mut session = ClassifierSession::new(Echo::default());
        session.finish();
        session.finish();
    }

    #[test]
    #[should_panic(expected = "analyze called after finish")]
    fn test_analyze_after_finish_panics() {
        let mut session = ClassifierSession::new(Echo::default());
        session.finish();
        session.analyze(b"late");
    }
}
