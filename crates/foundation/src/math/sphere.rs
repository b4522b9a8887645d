//! Spherical projection used by every globe-anchored object.
//!
//! Convention (right-handed, y up):
//! - phi = (90 - lat) in radians, theta = (lon + 180) in radians
//! - x = -r sin(phi) cos(theta), y = r cos(phi), z = r sin(phi) sin(theta)
//!
//! Under this convention (lat 0, lon 0) lands on +x and (lat 0, lon 90) on -z.

use core::f64::consts::PI;

use super::Vec3;

/// A geographic position in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct GeoPoint {
    pub lat_deg: f64,
    pub lon_deg: f64,
}

impl GeoPoint {
    /// Latitude is clamped to [-90, 90]; longitude is wrapped to [-180, 180].
    pub fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self {
            lat_deg: lat_deg.clamp(-90.0, 90.0),
            lon_deg: wrap_longitude_deg(lon_deg),
        }
    }

    pub fn to_surface(self, radius: f64) -> Vec3 {
        to_surface(self.lat_deg, self.lon_deg, radius)
    }
}

/// Wrap a longitude into [-180, 180]. Values already in range are untouched.
pub fn wrap_longitude_deg(lon_deg: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon_deg) {
        return lon_deg;
    }
    let wrapped = (lon_deg + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lon_deg > 0.0 {
        180.0
    } else {
        wrapped
    }
}

pub fn to_surface(lat_deg: f64, lon_deg: f64, radius: f64) -> Vec3 {
    let phi = (90.0 - lat_deg) * PI / 180.0;
    let theta = (lon_deg + 180.0) * PI / 180.0;
    let (sin_phi, cos_phi) = phi.sin_cos();
    let (sin_theta, cos_theta) = theta.sin_cos();
    Vec3::new(
        -radius * sin_phi * cos_theta,
        radius * cos_phi,
        radius * sin_phi * sin_theta,
    )
}

/// Inverse of [`to_surface`] for a ray/sphere hit point.
///
/// The point is normalized first, so hits slightly off the sphere still map to
/// the right coordinates. Only the zero vector has no answer.
pub fn from_surface_hit(point: Vec3) -> Option<GeoPoint> {
    let n = point.normalize()?;
    let phi = n.y.clamp(-1.0, 1.0).acos();
    let theta = n.z.atan2(-n.x);

    let lat_deg = 90.0 - phi.to_degrees();
    let mut lon_deg = theta.to_degrees() - 180.0;
    if lon_deg < -180.0 {
        lon_deg += 360.0;
    }
    Some(GeoPoint {
        lat_deg,
        lon_deg: lon_deg.clamp(-180.0, 180.0),
    })
}

/// Great-circle angle between two geographic points (radians).
pub fn angular_distance_rad(a: GeoPoint, b: GeoPoint) -> f64 {
    let ua = a.to_surface(1.0);
    let ub = b.to_surface(1.0);
    ua.dot(ub).clamp(-1.0, 1.0).acos()
}
