use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use gleaner_core::Result;
use gleaner_progress::{Reporter, TaskState};

/// Handle passed into a running task for progress reporting.
///
/// Updates are fire-and-forget: they mutate reporter state and return
/// immediately, so a task never blocks on rendering.
#[derive(Clone)]
pub struct TaskHandle {
    index: usize,
    reporter: Arc<Reporter>,
}

impl TaskHandle {
    pub(crate) fn new(index: usize, reporter: Arc<Reporter>) -> Self {
        Self { index, reporter }
    }

    /// Report fractional completion in `[0, 1]`.
    pub fn progress(&self, fraction: f64) {
        self.reporter
            .update(self.index, TaskState::Running(fraction));
    }

    /// Name this task in rendered output and failure logs.
    pub fn label(&self, label: impl Into<String>) {
        self.reporter.set_label(self.index, label);
    }
}

/// One independent unit of work submitted to the batch runner.
///
/// The runner borrows the task for the duration of execution and never
/// retains it after completion.
pub struct Task<T> {
    run: Box<dyn FnOnce(TaskHandle) -> BoxFuture<'static, Result<T>> + Send>,
}

impl<T> Task<T> {
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: FnOnce(TaskHandle) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            run: Box::new(move |handle| Box::pin(func(handle))),
        }
    }

    pub(crate) fn run(self, handle: TaskHandle) -> BoxFuture<'static, Result<T>> {
        (self.run)(handle)
    }
}
