use foundation::math::precision::stable_total_cmp_f64;
use foundation::math::{GeoPoint, Vec3, angular_distance_rad, from_surface_hit};

use crate::config::CullingConfig;
use crate::culling::is_front_facing;
use crate::markers::{CityMarker, MarkerToggles};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.dir * t
    }
}

/// Nearest non-negative hit distance of a ray against a centred sphere.
///
/// The distance is measured along the normalized direction. A ray starting
/// inside the sphere reports its exit point.
pub fn intersect_sphere(ray: Ray, radius: f64) -> Option<f64> {
    let dir = ray.dir.normalize()?;
    let b = ray.origin.dot(dir);
    let c = ray.origin.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let root = disc.sqrt();
    let t0 = -b - root;
    let t1 = -b + root;
    if t0 >= 0.0 {
        Some(t0)
    } else if t1 >= 0.0 {
        Some(t1)
    } else {
        None
    }
}

/// World-space point where the ray first meets the globe.
pub fn surface_point(ray: Ray, radius: f64) -> Option<Vec3> {
    let t = intersect_sphere(ray, radius)?;
    let dir = ray.dir.normalize()?;
    Some(ray.origin + dir * t)
}

/// Geographic position under the ray, if it hits the globe.
pub fn surface_hit(ray: Ray, radius: f64) -> Option<GeoPoint> {
    from_surface_hit(surface_point(ray, radius)?)
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarkerHit {
    pub index: usize,
    pub angular_distance_rad: f64,
}

/// Deterministic marker picking.
///
/// Ordering contract:
/// - Only markers whose class is enabled and that face the camera are candidates.
/// - The candidate closest (great-circle) to the surface hit wins, within `tolerance_deg`.
/// - Equal distances resolve to the lower marker index.
pub fn pick_marker(
    ray: Ray,
    radius: f64,
    markers: &[CityMarker],
    toggles: MarkerToggles,
    culling: &CullingConfig,
    tolerance_deg: f64,
) -> Option<MarkerHit> {
    let hit = surface_hit(ray, radius)?;
    let tolerance = tolerance_deg.to_radians();

    let mut best: Option<MarkerHit> = None;
    for (index, m) in markers.iter().enumerate() {
        if !toggles.is_enabled(m.city.class) || !is_front_facing(m.position, ray.origin, culling) {
            continue;
        }
        let d = angular_distance_rad(hit, m.city.location);
        if d > tolerance {
            continue;
        }
        let candidate = MarkerHit {
            index,
            angular_distance_rad: d,
        };
        best = match best {
            None => Some(candidate),
            Some(b) => {
                let ord = stable_total_cmp_f64(d, b.angular_distance_rad)
                    .then_with(|| index.cmp(&b.index));
                if ord.is_lt() { Some(candidate) } else { Some(b) }
            }
        };
    }
    best
}
