//! Where detection work and completion callbacks run.
//!
//! - [`Executor`] - Accepts boxed tasks
//! - [`InlineExecutor`] - Runs tasks on the calling thread, trampolined
//! - [`SerialExecutor`] - One worker thread draining a FIFO queue
//!
//! With the `tokio` feature, `tokio::runtime::Handle` is an executor too
//! (tasks go to the blocking pool, since reads and analysis block).

use std::cell::RefCell;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, mpsc};
use std::thread;

/// A unit of work submitted to an [`Executor`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs submitted tasks.
///
/// Detection uses two executors: the *analysis* executor runs reads and
/// classification one chunk per task, the *completion* executor runs the
/// completion callback. They may be the same.
///
/// An executor that drops a task without running it does not lose the
/// completion callback: the detection delivers a best-effort result from the
/// task's destructor instead.
pub trait Executor: Send + Sync {
    /// Submits `task` for execution.
    fn execute(&self, task: Task);
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute(&self, task: Task) {
        (**self).execute(task)
    }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn execute(&self, task: Task) {
        (**self).execute(task)
    }
}

// Tasks submitted from inside an inline task, per thread.
thread_local! {
    static INLINE_QUEUE: RefCell<Option<VecDeque<Task>>> = const { RefCell::new(None) };
}

/// Runs tasks immediately on the submitting thread.
///
/// Tasks submitted while an inline task is running are queued and run after
/// it returns, so a chain of resubmitting tasks runs in a loop instead of
/// growing the stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

/// Clears the inline queue when the outermost inline task ends, even by panic.
struct InlineDrain;

impl Drop for InlineDrain {
    fn drop(&mut self) {
        let rest = INLINE_QUEUE.with(|queue| queue.borrow_mut().take());
        drop(rest);
    }
}

impl Executor for InlineExecutor {
    fn execute(&self, task: Task) {
        let first = INLINE_QUEUE.with(|queue| {
            let mut queue = queue.borrow_mut();
            match queue.as_mut() {
                Some(pending) => {
                    pending.push_back(task);
                    None
                }
                None => {
                    *queue = Some(VecDeque::new());
                    Some(task)
                }
            }
        });

        let Some(first) = first else {
            return;
        };

        let _drain = InlineDrain;
        first();
        while let Some(next) =
            INLINE_QUEUE.with(|queue| queue.borrow_mut().as_mut().and_then(VecDeque::pop_front))
        {
            next();
        }
    }
}

/// A serial queue backed by one named worker thread.
///
/// Tasks run one at a time in submission order. A panicking task is logged
/// and the worker moves on to the next one. Dropping the executor lets the
/// worker finish the queued tasks and exit.
///
/// # Example
///
/// ```
/// use std::sync::mpsc;
/// use encsniff::{Executor, SerialExecutor};
///
/// let queue = SerialExecutor::new("analysis")?;
/// let (tx, rx) = mpsc::channel();
/// queue.execute(Box::new(move || tx.send(42).unwrap()));
/// assert_eq!(rx.recv().unwrap(), 42);
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct SerialExecutor {
    name: String,
    sender: mpsc::Sender<Task>,
}

impl SerialExecutor {
    /// Spawns the worker thread.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    pub fn new(name: impl Into<String>) -> std::io::Result<Self> {
        let name = name.into();
        let (sender, receiver) = mpsc::channel::<Task>();
        let worker = name.clone();

        thread::Builder::new().name(name.clone()).spawn(move || {
            for task in receiver {
                if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                    tracing::error!(executor = %worker, "task panicked");
                }
            }
        })?;

        Ok(Self { name, sender })
    }

    /// Returns the worker thread name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Executor for SerialExecutor {
    fn execute(&self, task: Task) {
        if self.sender.send(task).is_err() {
            tracing::warn!(executor = %self.name, "worker gone, task dropped");
        }
    }
}

#[cfg(feature = "tokio")]
impl Executor for tokio::runtime::Handle {
    fn execute(&self, task: Task) {
        drop(self.spawn_blocking(task));
    }
}
