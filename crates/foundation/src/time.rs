/// Engine clock time in seconds.
///
/// This is the render clock that animation envelopes are evaluated against.
/// It is unrelated to the simulated calendar instant shown on the globe.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Default)]
pub struct Time(pub f64);

impl Time {
    pub const ZERO: Self = Time(0.0);

    pub fn seconds(self) -> f64 {
        self.0
    }

    /// Seconds elapsed since `start`, never negative.
    pub fn since(self, start: Time) -> f64 {
        (self.0 - start.0).max(0.0)
    }

    pub fn advanced_by(self, dt_s: f64) -> Self {
        Time(self.0 + dt_s)
    }
}
