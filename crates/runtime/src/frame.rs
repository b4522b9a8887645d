use foundation::time::Time;

/// Per-tick timing handed to every phase.
///
/// Display refresh drives the tick, so `dt_s` may vary between frames. Engine
/// time is the running sum of accepted deltas, which keeps a recorded sequence
/// of deltas replayable.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Delta since the previous frame (seconds, never negative).
    pub dt_s: f64,
    /// Engine time at the end of this frame's delta (seconds).
    pub time: Time,
}

impl Frame {
    /// Frame `index` of a fixed-step sequence.
    pub fn new(index: u64, dt_s: f64) -> Self {
        let dt_s = sanitize_dt(dt_s);
        Self {
            index,
            dt_s,
            time: Time(index as f64 * dt_s),
        }
    }

    /// The frame after `self`, `dt_s` seconds later.
    pub fn next(self, dt_s: f64) -> Self {
        let dt_s = sanitize_dt(dt_s);
        Self {
            index: self.index + 1,
            dt_s,
            time: self.time.advanced_by(dt_s),
        }
    }
}

fn sanitize_dt(dt_s: f64) -> f64 {
    if dt_s.is_finite() { dt_s.max(0.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::Frame;
    use foundation::time::Time;

    #[test]
    fn frame_time_is_deterministic() {
        let a = Frame::new(10, 1.0 / 60.0);
        let b = Frame::new(10, 1.0 / 60.0);
        assert_eq!(a, b);
        assert_eq!(a.time, Time(10.0 / 60.0));
    }

    #[test]
    fn next_accumulates_variable_deltas() {
        let f0 = Frame::new(0, 0.5);
        let f1 = f0.next(0.25);
        let f2 = f1.next(1.0);
        assert_eq!(f2.index, 2);
        assert_eq!(f2.dt_s, 1.0);
        assert_eq!(f2.time, Time(1.25));
    }

    #[test]
    fn bad_deltas_are_zeroed() {
        let f = Frame::new(0, 0.0).next(-3.0).next(f64::NAN);
        assert_eq!(f.dt_s, 0.0);
        assert_eq!(f.time, Time(0.0));
    }
}
