//! Progress reporting for long-running normalization operations.

/// An event emitted while the engine works through a normalization run.
#[derive(Debug, Clone)]
pub enum Progress {
    /// A new phase of a workflow has started.
    PhaseStart { name: &'static str },
    /// The current phase has finished.
    PhaseFinish,

    /// A task with a known number of steps has started.
    TaskStart { total_steps: u64 },
    /// One step of the current task has completed.
    TaskIncrement,
    /// The current task has finished.
    TaskFinish,

    /// The description of the current step changed.
    StatusUpdate { text: String },
    /// A free-form informational message.
    Message(String),
}

/// A callback invoked with [`Progress`] events as they occur.
pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards progress events to an optional callback.
///
/// A reporter without a callback swallows every event, so engine code can
/// report unconditionally.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    /// Creates a reporter that discards all events.
    pub fn new() -> Self {
        Self { callback: None }
    }

    /// Creates a reporter that forwards events to the given callback.
    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    /// Reports a progress event.
    #[inline]
    pub fn report(&self, progress: Progress) {
        if let Some(callback) = &self.callback {
            callback(progress);
        }
    }
}
