//! Camera-facing fade for surface-anchored objects.
//!
//! `d = n̂(position) · n̂(camera)`. At or below `fade_start` the object is on
//! the far side and fully transparent; at or above `fade_end` it is fully
//! opaque; in between the opacity ramps linearly so nothing pops at the horizon.

use foundation::math::Vec3;
use foundation::math::precision::linear_step;

use crate::config::CullingConfig;

/// Cosine between the object's outward direction and the camera direction.
///
/// Zero vectors have no direction and report -1 (far side).
pub fn facing_dot(position: Vec3, camera_position: Vec3) -> f64 {
    match (position.normalize(), camera_position.normalize()) {
        (Some(p), Some(c)) => p.dot(c),
        _ => -1.0,
    }
}

pub fn occlusion_opacity(position: Vec3, camera_position: Vec3, cfg: &CullingConfig) -> f64 {
    linear_step(cfg.fade_start, cfg.fade_end, facing_dot(position, camera_position))
}

/// The filter shared by drawing and hit-testing.
pub fn is_front_facing(position: Vec3, camera_position: Vec3, cfg: &CullingConfig) -> bool {
    occlusion_opacity(position, camera_position, cfg) > 0.0
}

/// Writes per-point opacity into `out` (same length as `points`).
pub fn cull_points(points: &[Vec3], camera_position: Vec3, cfg: &CullingConfig, out: &mut [f64]) {
    for (o, p) in out.iter_mut().zip(points) {
        *o = occlusion_opacity(*p, camera_position, cfg);
    }
}
