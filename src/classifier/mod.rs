//! Incremental classification.
//!
//! - [`Classifier`] - The external classification capability
//! - [`ClassifierSession`] - Lifecycle-checked wrapper (analyzing → finished → reset)
//! - [`CandidateClassifier`] - Built-in classifier on `encoding_rs` decoders

mod candidate;
mod session;

pub use candidate::CandidateClassifier;
pub use session::ClassifierSession;

/// An incremental character-encoding classifier.
///
/// Implementations accumulate state across [`analyze`](Classifier::analyze)
/// calls and report a verdict from [`finish`](Classifier::finish). The verdict
/// must not depend on how the input was split into chunks.
///
/// Lifecycle rules are enforced by [`ClassifierSession`], not by
/// implementations.
pub trait Classifier {
    /// Clears all accumulated state.
    fn reset(&mut self);

    /// Feeds the next bytes of the input.
    ///
    /// Returns `false` on an unrecoverable internal failure; `finish` may
    /// still be called for a best-effort verdict.
    fn analyze(&mut self, chunk: &[u8]) -> bool;

    /// Returns the best verdict for everything analyzed so far.
    ///
    /// `None` or an empty string means no verdict.
    fn finish(&mut self) -> Option<String>;
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn reset(&mut self) {
        (**self).reset()
    }

    fn analyze(&mut self, chunk: &[u8]) -> bool {
        (**self).analyze(chunk)
    }

    fn finish(&mut self) -> Option<String> {
        (**self).finish()
    }
}
