//! Deterministic float ordering.
//!
//! Sorting and tie-breaking on floats (pick distances, resolver ordering) goes
//! through these helpers so results never depend on NaN payloads or signed zero.

use core::cmp::Ordering;

/// Canonicalize a floating-point value for deterministic ordering.
///
/// Rules:
/// - `-0.0` becomes `0.0`
/// - all NaNs become a single canonical NaN
pub fn canonical_f64(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

/// Deterministic total ordering for floats.
pub fn stable_total_cmp_f64(a: f64, b: f64) -> Ordering {
    canonical_f64(a).total_cmp(&canonical_f64(b))
}

/// Linear ramp of `x` from 0 at `edge0` to 1 at `edge1`, clamped.
///
/// Degenerate ranges (`edge1 <= edge0`) act as a hard step at `edge0`.
pub fn linear_step(edge0: f64, edge1: f64, x: f64) -> f64 {
    if edge1 <= edge0 {
        return if x > edge0 { 1.0 } else { 0.0 };
    }
    ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0)
}
