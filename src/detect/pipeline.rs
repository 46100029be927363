//! Executor-driven detection: one read-and-analyze step per task.

use std::io::Read;
use std::sync::Arc;
use std::thread;

use crate::DetectionResult;
use crate::classifier::Classifier;
use crate::executor::Executor;
use crate::reader::ChunkReader;

use super::machine::{Detection, Step};

/// Completion callback of one operation.
pub(crate) type Callback = Box<dyn FnOnce(DetectionResult) + Send + 'static>;

/// State of one operation, moved from task to task.
///
/// Owns the reader (and so the source), the detection and the callback. Only
/// one task holds it at a time, so chunk handlers never overlap and
/// finalization happens after the last of them. The source is dropped right
/// after the terminal handler, before the result is dispatched.
///
/// If the pipeline is dropped before completing (the analysis executor
/// discarded a task, or a step panicked) its destructor still delivers a
/// result, so the callback fires exactly once on every path.
pub(crate) struct Pipeline<R, C: Classifier> {
    reader: Option<ChunkReader<R>>,
    detection: Detection<C>,
    analysis: Arc<dyn Executor>,
    completion: Arc<dyn Executor>,
    on_complete: Option<Callback>,
}

impl<R, C> Pipeline<R, C>
where
    R: Read + Send + 'static,
    C: Classifier + Send + 'static,
{
    pub(crate) fn new(
        reader: ChunkReader<R>,
        detection: Detection<C>,
        analysis: Arc<dyn Executor>,
        completion: Arc<dyn Executor>,
        on_complete: Callback,
    ) -> Self {
        Self {
            reader: Some(reader),
            detection,
            analysis,
            completion,
            on_complete: Some(on_complete),
        }
    }

    /// Enters `Reading` and submits the first step.
    pub(crate) fn start(mut self) {
        self.detection.start();
        self.schedule();
    }

    fn schedule(self) {
        let analysis = Arc::clone(&self.analysis);
        analysis.execute(Box::new(move || self.step()));
    }

    fn step(mut self) {
        let event = match self.reader.as_mut() {
            Some(reader) => reader.next_event(self.detection.token()),
            None => None,
        };

        match event {
            Some(event) => match self.detection.on_event(event) {
                Step::Continue => self.schedule(),
                Step::Finalize => self.complete(),
            },
            None => self.complete(),
        }
    }

    fn complete(mut self) {
        self.release();
        let result = self.detection.finalize();
        self.dispatch(result);
    }
}

impl<R, C: Classifier> Pipeline<R, C> {
    fn release(&mut self) {
        if let Some(reader) = self.reader.take() {
            tracing::trace!(bytes = reader.bytes_read(), "releasing byte source");
        }
    }

    fn dispatch(&mut self, result: DetectionResult) {
        if let Some(on_complete) = self.on_complete.take() {
            let delivery = Delivery(Some((on_complete, result)));
            self.completion.execute(Box::new(move || drop(delivery)));
        }
    }
}

/// Calls the callback when dropped, whether or not the completion task ran.
struct Delivery(Option<(Callback, DetectionResult)>);

impl Drop for Delivery {
    fn drop(&mut self) {
        if let Some((on_complete, result)) = self.0.take() {
            on_complete(result);
        }
    }
}

impl<R, C: Classifier> Drop for Pipeline<R, C> {
    fn drop(&mut self) {
        if self.on_complete.is_none() {
            return;
        }

        self.release();
        let result = if thread::panicking() {
            tracing::warn!("detection step panicked, completing without a result");
            None
        } else {
            tracing::warn!("detection dropped before completing, finalizing early");
            self.detection.finalize()
        };
        self.dispatch(result);
    }
}
