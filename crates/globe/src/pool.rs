//! Fixed-capacity pools of short-lived visual actors.
//!
//! An actor is checked out with `acquire`, animated by polling its envelope in
//! `advance`, and returned automatically when the envelope completes. A full
//! pool drops the request; it never grows and never queues.

use foundation::arena::SlotArena;
use foundation::handles::Handle;
use foundation::math::Vec3;
use foundation::time::Time;
use runtime::{EventBus, Frame, Metrics};
use tracing::warn;

use crate::config::{LabelEnvelopeConfig, RippleEnvelopeConfig};

pub type ActorHandle = Handle;

/// Fade-in, hold, fade-out.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LabelEnvelope {
    pub start: Time,
    pub fade_in_s: f64,
    pub hold_s: f64,
    pub fade_out_s: f64,
}

impl LabelEnvelope {
    pub fn new(start: Time, cfg: &LabelEnvelopeConfig) -> Self {
        Self {
            start,
            fade_in_s: cfg.fade_in_s,
            hold_s: cfg.hold_s,
            fade_out_s: cfg.fade_out_s,
        }
    }

    pub fn total_s(&self) -> f64 {
        self.fade_in_s + self.hold_s + self.fade_out_s
    }

    /// Opacity at `now`, or `None` once the last stage has finished.
    pub fn opacity_at(&self, now: Time) -> Option<f64> {
        let t = now.since(self.start);
        if t >= self.total_s() {
            return None;
        }
        let opacity = if t < self.fade_in_s {
            t / self.fade_in_s
        } else if t < self.fade_in_s + self.hold_s {
            1.0
        } else {
            let out = t - self.fade_in_s - self.hold_s;
            1.0 - out / self.fade_out_s
        };
        Some(opacity.clamp(0.0, 1.0))
    }
}

/// Linear expansion with decaying opacity.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RippleEnvelope {
    pub start: Time,
    pub initial_scale: f64,
    pub max_scale: f64,
    pub duration_s: f64,
    pub initial_opacity: f64,
}

impl RippleEnvelope {
    pub fn new(start: Time, cfg: &RippleEnvelopeConfig) -> Self {
        Self {
            start,
            initial_scale: cfg.initial_scale,
            max_scale: cfg.max_scale,
            duration_s: cfg.duration_s,
            initial_opacity: cfg.initial_opacity,
        }
    }

    /// `(scale, opacity)` at `now`, or `None` at the end of the duration.
    pub fn sample(&self, now: Time) -> Option<(f64, f64)> {
        let t = now.since(self.start);
        if t >= self.duration_s {
            return None;
        }
        let k = t / self.duration_s;
        let scale = self.initial_scale + (self.max_scale - self.initial_scale) * k;
        let opacity = self.initial_opacity * (1.0 - k);
        Some((scale, opacity))
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Envelope {
    Label(LabelEnvelope),
    Ripple(RippleEnvelope),
}

impl Envelope {
    /// `(scale, opacity)` at `now`, or `None` once complete.
    pub fn sample(&self, now: Time) -> Option<(f64, f64)> {
        match self {
            Envelope::Label(env) => env.opacity_at(now).map(|o| (1.0, o)),
            Envelope::Ripple(env) => env.sample(now),
        }
    }
}

/// Per-actor data that survives release so its buffers can be reused.
pub trait ActorPayload: Default {
    fn clear(&mut self);
}

impl ActorPayload for String {
    fn clear(&mut self) {
        String::clear(self);
    }
}

impl ActorPayload for () {
    fn clear(&mut self) {}
}

#[derive(Debug, Default)]
pub struct Actor<P> {
    pub payload: P,
    pub anchor: Vec3,
    pub envelope: Option<Envelope>,
    pub scale: f64,
    pub opacity: f64,
    /// Camera-facing factor written by the culling phase.
    pub occlusion: f64,
}

impl<P: ActorPayload> Actor<P> {
    fn reset(&mut self) {
        self.payload.clear();
        self.envelope = None;
        self.scale = 0.0;
        self.opacity = 0.0;
        self.occlusion = 0.0;
    }

    /// Opacity after camera-facing fade.
    pub fn visible_opacity(&self) -> f64 {
        self.opacity * self.occlusion
    }
}

/// Names used for diagnostics of one pool.
#[derive(Debug, Copy, Clone)]
pub struct PoolLabels {
    pub name: &'static str,
    pub dropped_metric: &'static str,
    pub active_metric: &'static str,
}

pub struct ActorPool<P> {
    labels: PoolLabels,
    arena: SlotArena<Actor<P>>,
    finished: Vec<ActorHandle>,
}

pub type LabelPool = ActorPool<String>;
pub type RipplePool = ActorPool<()>;

pub const LABEL_POOL: PoolLabels = PoolLabels {
    name: "labels",
    dropped_metric: "pool.labels.dropped",
    active_metric: "pool.labels.active",
};

pub const RIPPLE_POOL: PoolLabels = PoolLabels {
    name: "ripples",
    dropped_metric: "pool.ripples.dropped",
    active_metric: "pool.ripples.active",
};

impl<P: ActorPayload> ActorPool<P> {
    pub fn new(labels: PoolLabels, capacity: usize) -> Self {
        Self {
            labels,
            arena: SlotArena::new(capacity, |_| Actor::default()),
            finished: Vec::with_capacity(capacity),
        }
    }

    pub fn name(&self) -> &'static str {
        self.labels.name
    }

    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    pub fn active_count(&self) -> usize {
        self.arena.len()
    }

    /// Checks out an idle actor and starts its envelope.
    ///
    /// On exhaustion the effect is dropped: a warning is logged, the pool's
    /// drop counter is bumped and a `pool` event is recorded.
    pub fn acquire(
        &mut self,
        anchor: Vec3,
        envelope: Envelope,
        diag: &mut PoolDiagnostics<'_>,
    ) -> Option<ActorHandle> {
        let Some(handle) = self.arena.acquire() else {
            warn!(
                pool = self.labels.name,
                capacity = self.capacity(),
                "actor pool exhausted; effect dropped"
            );
            diag.metrics.inc_counter(self.labels.dropped_metric, 1);
            diag.bus.emit(diag.frame, "pool", self.labels.name);
            return None;
        };
        let actor = self.arena.get_mut(handle)?;
        actor.anchor = anchor;
        actor.envelope = Some(envelope);
        if let Some((scale, opacity)) = envelope.sample(diag.frame.time) {
            actor.scale = scale;
            actor.opacity = opacity;
        }
        Some(handle)
    }

    /// Returns the actor to the pool. Stale or repeated handles are ignored.
    pub fn release(&mut self, handle: ActorHandle) -> bool {
        let Some(actor) = self.arena.get_mut(handle) else {
            return false;
        };
        actor.reset();
        self.arena.release(handle)
    }

    pub fn get(&self, handle: ActorHandle) -> Option<&Actor<P>> {
        self.arena.get(handle)
    }

    pub fn get_mut(&mut self, handle: ActorHandle) -> Option<&mut Actor<P>> {
        self.arena.get_mut(handle)
    }

    pub fn is_active(&self, handle: ActorHandle) -> bool {
        self.arena.contains(handle)
    }

    /// Evaluates every active envelope and releases the finished ones.
    pub fn advance(&mut self, now: Time) {
        self.finished.clear();
        for (handle, actor) in self.arena.iter_mut() {
            match actor.envelope.and_then(|env| env.sample(now)) {
                Some((scale, opacity)) => {
                    actor.scale = scale;
                    actor.opacity = opacity;
                }
                None => self.finished.push(handle),
            }
        }
        for i in 0..self.finished.len() {
            let handle = self.finished[i];
            self.release(handle);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActorHandle, &Actor<P>)> {
        self.arena.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ActorHandle, &mut Actor<P>)> {
        self.arena.iter_mut()
    }

    pub fn record_gauges(&self, metrics: &mut Metrics) {
        metrics.set_gauge(self.labels.active_metric, self.active_count() as i64);
    }
}

impl LabelPool {
    /// Acquires a label and copies `text` into its reused buffer.
    pub fn acquire_label(
        &mut self,
        text: &str,
        anchor: Vec3,
        envelope: LabelEnvelope,
        diag: &mut PoolDiagnostics<'_>,
    ) -> Option<ActorHandle> {
        let handle = self.acquire(anchor, Envelope::Label(envelope), diag)?;
        if let Some(actor) = self.arena.get_mut(handle) {
            actor.payload.push_str(text);
        }
        Some(handle)
    }

    pub fn text(&self, handle: ActorHandle) -> Option<&str> {
        self.get(handle).map(|a| a.payload.as_str())
    }
}

impl<P> std::fmt::Debug for ActorPool<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorPool")
            .field("name", &self.labels.name)
            .field("capacity", &self.arena.capacity())
            .field("active", &self.arena.len())
            .finish()
    }
}

/// Where pool exhaustion is reported.
pub struct PoolDiagnostics<'a> {
    pub frame: Frame,
    pub metrics: &'a mut Metrics,
    pub bus: &'a mut EventBus,
}

#[cfg(test)]
mod tests {
    use super::{
        Envelope, LABEL_POOL, LabelEnvelope, LabelPool, PoolDiagnostics, RIPPLE_POOL,
        RippleEnvelope, RipplePool,
    };
    use crate::config::{LabelEnvelopeConfig, RippleEnvelopeConfig};
    use foundation::math::Vec3;
    use foundation::time::Time;
    use runtime::{EventBus, Frame, Metrics};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn label_env(start: f64) -> LabelEnvelope {
        LabelEnvelope::new(
            Time(start),
            &LabelEnvelopeConfig {
                fade_in_s: 1.0,
                hold_s: 2.0,
                fade_out_s: 1.0,
                font_size_px: 12.0,
            },
        )
    }

    fn ripple_env(start: f64) -> RippleEnvelope {
        RippleEnvelope::new(
            Time(start),
            &RippleEnvelopeConfig {
                initial_scale: 1.0,
                max_scale: 3.0,
                duration_s: 2.0,
                initial_opacity: 0.9,
            },
        )
    }

    #[test]
    fn label_envelope_stages() {
        let env = label_env(10.0);
        assert_close(env.opacity_at(Time(10.0)).expect("live"), 0.0, 1e-12);
        assert_close(env.opacity_at(Time(10.5)).expect("live"), 0.5, 1e-12);
        assert_close(env.opacity_at(Time(12.0)).expect("live"), 1.0, 1e-12);
        assert_close(env.opacity_at(Time(13.75)).expect("live"), 0.25, 1e-12);
        assert_eq!(env.opacity_at(Time(14.0)), None);
    }

    #[test]
    fn zero_length_stages_do_not_divide_by_zero() {
        let env = LabelEnvelope {
            start: Time(0.0),
            fade_in_s: 0.0,
            hold_s: 1.0,
            fade_out_s: 0.0,
        };
        assert_eq!(env.opacity_at(Time(0.0)), Some(1.0));
        assert_eq!(env.opacity_at(Time(1.0)), None);
    }

    #[test]
    fn ripple_envelope_expands_and_fades() {
        let env = ripple_env(0.0);
        let (s0, o0) = env.sample(Time(0.0)).expect("live");
        assert_close(s0, 1.0, 1e-12);
        assert_close(o0, 0.9, 1e-12);
        let (s1, o1) = env.sample(Time(1.0)).expect("live");
        assert_close(s1, 2.0, 1e-12);
        assert_close(o1, 0.45, 1e-12);
        assert_eq!(env.sample(Time(2.0)), None);
    }

    #[test]
    fn exhaustion_drops_and_reports() {
        let mut metrics = Metrics::new();
        let mut bus = EventBus::new();
        let frame = Frame::new(0, 0.0);
        let mut diag = PoolDiagnostics {
            frame,
            metrics: &mut metrics,
            bus: &mut bus,
        };
        let mut pool = RipplePool::new(RIPPLE_POOL, 2);
        let env = Envelope::Ripple(ripple_env(0.0));
        let a = pool.acquire(Vec3::X, env, &mut diag).expect("a");
        let b = pool.acquire(Vec3::Y, env, &mut diag).expect("b");
        assert_ne!(a, b);
        assert_eq!(pool.acquire(Vec3::Z, env, &mut diag), None);
        assert_eq!(pool.active_count(), 2);
        assert_eq!(pool.capacity(), 2);

        assert_eq!(metrics.counter("pool.ripples.dropped"), 1);
        assert_eq!(bus.of_kind("pool").count(), 1);
    }

    #[test]
    fn release_resets_and_is_idempotent() {
        let mut metrics = Metrics::new();
        let mut bus = EventBus::new();
        let mut diag = PoolDiagnostics {
            frame: Frame::new(0, 0.0),
            metrics: &mut metrics,
            bus: &mut bus,
        };
        let mut pool = LabelPool::new(LABEL_POOL, 1);
        let h = pool
            .acquire_label("Paris", Vec3::X, label_env(0.0), &mut diag)
            .expect("label");
        assert_eq!(pool.text(h), Some("Paris"));

        assert!(pool.release(h));
        assert!(!pool.release(h));
        assert!(!pool.is_active(h));
        assert_eq!(pool.active_count(), 0);

        let again = pool
            .acquire_label("Tokyo", Vec3::Y, label_env(0.0), &mut diag)
            .expect("reused");
        assert_eq!(again.index(), h.index());
        assert_eq!(pool.text(again), Some("Tokyo"));
        let actor = pool.get(again).expect("live");
        assert_eq!(actor.anchor, Vec3::Y);
    }

    #[test]
    fn advance_releases_finished_actors() {
        let mut metrics = Metrics::new();
        let mut bus = EventBus::new();
        let mut diag = PoolDiagnostics {
            frame: Frame::new(0, 0.0),
            metrics: &mut metrics,
            bus: &mut bus,
        };
        let mut pool = LabelPool::new(LABEL_POOL, 4);
        let short = pool
            .acquire_label("a", Vec3::X, label_env(0.0), &mut diag)
            .expect("a");
        let late = pool
            .acquire_label("b", Vec3::X, label_env(2.0), &mut diag)
            .expect("b");

        pool.advance(Time(2.5));
        assert!(pool.is_active(short));
        assert_close(pool.get(short).expect("live").opacity, 1.0, 1e-12);

        pool.advance(Time(4.0));
        assert!(!pool.is_active(short));
        assert!(pool.is_active(late));
        assert_eq!(pool.active_count(), 1);

        pool.record_gauges(&mut metrics);
        assert_eq!(metrics.gauge("pool.labels.active"), Some(1));
    }

    #[test]
    fn active_count_never_exceeds_capacity() {
        let mut metrics = Metrics::new();
        let mut bus = EventBus::new();
        let mut diag = PoolDiagnostics {
            frame: Frame::new(0, 0.0),
            metrics: &mut metrics,
            bus: &mut bus,
        };
        let mut pool = RipplePool::new(RIPPLE_POOL, 3);
        let env = Envelope::Ripple(ripple_env(0.0));
        let mut live = Vec::new();
        for i in 0..20 {
            if i % 3 == 2
                && let Some(h) = live.pop()
            {
                pool.release(h);
            }
            if let Some(h) = pool.acquire(Vec3::X, env, &mut diag) {
                assert!(!live.contains(&h));
                live.push(h);
            }
            assert!(pool.active_count() <= pool.capacity());
            assert_eq!(pool.active_count(), live.len());
        }
    }
}
