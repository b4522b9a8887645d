use foundation::math::Vec3;

/// Quadratic Bézier curve.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct QuadraticCurve {
    pub start: Vec3,
    pub control: Vec3,
    pub end: Vec3,
}

/// Chords shorter than this are treated as degenerate.
const MIN_CHORD: f64 = 1e-9;

impl QuadraticCurve {
    pub fn new(start: Vec3, control: Vec3, end: Vec3) -> Self {
        Self {
            start,
            control,
            end,
        }
    }

    /// Curve between two surface points bulging away from the globe centre.
    ///
    /// The control point sits `chord_length * height_factor` outward from the
    /// chord midpoint. Returns `None` for a zero-length chord.
    pub fn arc(from: Vec3, to: Vec3, height_factor: f64) -> Option<Self> {
        let chord = to - from;
        let len = chord.length();
        if !len.is_finite() || len < MIN_CHORD {
            return None;
        }
        let mid = (from + to) * 0.5;
        // Antipodal endpoints have a midpoint at the centre; bulge sideways instead.
        let outward = mid
            .normalize()
            .or_else(|| from.cross(Vec3::Y).normalize())
            .or_else(|| from.cross(Vec3::X).normalize())?;
        let control = mid + outward * (len * height_factor);
        Some(Self::new(from, control, to))
    }

    pub fn point_at(&self, t: f64) -> Vec3 {
        let u = 1.0 - t;
        self.start * (u * u) + self.control * (2.0 * u * t) + self.end * (t * t)
    }

    pub fn derivative_at(&self, t: f64) -> Vec3 {
        (self.control - self.start) * (2.0 * (1.0 - t)) + (self.end - self.control) * (2.0 * t)
    }

    /// Unit tangent; falls back to the chord direction where the derivative vanishes.
    pub fn tangent_at(&self, t: f64) -> Vec3 {
        self.derivative_at(t)
            .normalize()
            .or_else(|| (self.end - self.start).normalize())
            .unwrap_or(Vec3::X)
    }

    /// Writes `segments + 1` evenly spaced samples (by parameter) into `out`.
    pub fn sample_into(&self, segments: usize, out: &mut Vec<Vec3>) {
        out.clear();
        let segments = segments.max(1);
        out.reserve(segments + 1);
        for i in 0..=segments {
            out.push(self.point_at(i as f64 / segments as f64));
        }
    }
}
