use crate::event_bus::EventBus;
use crate::frame::Frame;
use crate::job::Job;

/// Ordered per-frame phase runner over a context `C`.
///
/// Jobs are kept sorted by `(priority, id, insertion_order)` when added, so
/// running a frame never reorders or allocates.
pub struct Scheduler<C> {
    next_order: u64,
    jobs: Vec<(u64, Job<C>)>,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Scheduler<C> {
    pub fn new() -> Self {
        Self {
            next_order: 0,
            jobs: Vec::new(),
        }
    }

    pub fn add_job(&mut self, job: Job<C>) {
        let order = self.next_order;
        self.next_order = self.next_order.wrapping_add(1);
        self.jobs.push((order, job));
        // Total ordering: (priority, id, insertion_order). This stays deterministic even if
        // callers accidentally register duplicate job ids.
        self.jobs.sort_by(|(oa, a), (ob, b)| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.id.cmp(b.id))
                .then_with(|| oa.cmp(ob))
        });
    }

    /// Job ids in execution order.
    pub fn job_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.jobs.iter().map(|(_, job)| job.id)
    }

    /// Run all jobs in a deterministic order for the given frame.
    pub fn run_frame(&self, ctx: &mut C, frame: Frame, bus: &mut EventBus) {
        for (_order, job) in &self.jobs {
            (job.run)(ctx, frame, bus);
        }
    }
}

impl<C> std::fmt::Debug for Scheduler<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.jobs.iter().map(|(_, job)| job))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Scheduler;
    use crate::event_bus::EventBus;
    use crate::frame::Frame;
    use crate::job::Job;

    #[derive(Default)]
    struct Trace(Vec<&'static str>);

    fn job_a(ctx: &mut Trace, frame: Frame, bus: &mut EventBus) {
        ctx.0.push("a");
        bus.emit(frame, "job", "a");
    }

    fn job_b(ctx: &mut Trace, frame: Frame, bus: &mut EventBus) {
        ctx.0.push("b");
        bus.emit(frame, "job", "b");
    }

    #[test]
    fn runs_jobs_in_stable_id_order() {
        let mut sched = Scheduler::new();
        sched.add_job(Job::new("b", job_b));
        sched.add_job(Job::new("a", job_a));

        let mut bus = EventBus::new();
        let mut trace = Trace::default();
        sched.run_frame(&mut trace, Frame::new(0, 1.0), &mut bus);
        let msgs: Vec<_> = bus.events().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(msgs, vec!["a", "b"]);
        assert_eq!(trace.0, vec!["a", "b"]);
    }

    #[test]
    fn runs_duplicate_ids_in_insertion_order() {
        let mut sched = Scheduler::new();
        sched.add_job(Job::new("a", job_a));
        sched.add_job(Job::new("a", job_b));

        let mut bus = EventBus::new();
        let mut trace = Trace::default();
        sched.run_frame(&mut trace, Frame::new(0, 1.0), &mut bus);
        assert_eq!(trace.0, vec!["a", "b"]);
    }

    #[test]
    fn runs_lower_priority_value_first() {
        let mut sched = Scheduler::new();
        sched.add_job(Job::with_priority("a", 10, job_a));
        sched.add_job(Job::with_priority("b", -1, job_b));

        let mut bus = EventBus::new();
        let mut trace = Trace::default();
        sched.run_frame(&mut trace, Frame::new(0, 1.0), &mut bus);
        assert_eq!(trace.0, vec!["b", "a"]);
        assert_eq!(sched.job_ids().collect::<Vec<_>>(), vec!["b", "a"]);
    }
}
