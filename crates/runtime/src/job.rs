use crate::event_bus::EventBus;
use crate::frame::Frame;

/// Signature of a per-frame phase over a mutable context `C`.
pub type JobFn<C> = fn(ctx: &mut C, frame: Frame, bus: &mut EventBus);

/// A deterministic unit of work executed by the [`Scheduler`](crate::Scheduler).
///
/// Jobs are run in a stable order based on their `(priority, id)`.
pub struct Job<C> {
    pub id: &'static str,
    /// Smaller values run earlier.
    pub priority: i32,
    pub run: JobFn<C>,
}

impl<C> Job<C> {
    pub fn new(id: &'static str, run: JobFn<C>) -> Self {
        Self {
            id,
            priority: 0,
            run,
        }
    }

    pub fn with_priority(id: &'static str, priority: i32, run: JobFn<C>) -> Self {
        Self { id, priority, run }
    }
}

impl<C> std::fmt::Debug for Job<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .finish()
    }
}
