use foundation::math::{Vec3, to_surface, wrap_longitude_deg};

use crate::config::CameraConfig;
use crate::picking::Ray;

/// Camera orbiting the globe centre at a fixed distance.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrbitCamera {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub distance: f64,
    pub fov_y_deg: f64,
    /// Degrees of longitude per second; 0 stops auto-rotation.
    pub rotation_speed_deg_s: f64,
}

/// Orthonormal view basis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraBasis {
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl OrbitCamera {
    pub fn from_config(cfg: &CameraConfig) -> Self {
        Self {
            lat_deg: cfg.lat_deg.clamp(-89.0, 89.0),
            lon_deg: wrap_longitude_deg(cfg.lon_deg),
            distance: cfg.distance,
            fov_y_deg: cfg.fov_y_deg,
            rotation_speed_deg_s: cfg.rotation_speed_deg_s,
        }
    }

    pub fn position(&self) -> Vec3 {
        to_surface(self.lat_deg, self.lon_deg, self.distance)
    }

    pub fn advance(&mut self, dt_s: f64) {
        self.lon_deg = wrap_longitude_deg(self.lon_deg + self.rotation_speed_deg_s * dt_s);
    }

    pub fn basis(&self) -> CameraBasis {
        let position = self.position();
        let forward = (-position).normalize().unwrap_or(-Vec3::Z);
        let right = forward
            .cross(Vec3::Y)
            .normalize()
            .unwrap_or(Vec3::X);
        let up = right.cross(forward);
        CameraBasis { forward, right, up }
    }

    fn half_extent(&self) -> f64 {
        (self.fov_y_deg.to_radians() * 0.5).tan()
    }

    /// Ray through normalized device coordinates (`x`, `y` in [-1, 1], y up).
    pub fn ray_from_ndc(&self, x: f64, y: f64, aspect: f64) -> Ray {
        let b = self.basis();
        let h = self.half_extent();
        let dir = b.forward + b.right * (x * h * aspect) + b.up * (y * h);
        Ray::new(self.position(), dir)
    }

    /// Projects a world point to normalized device coordinates. `None` when behind the camera.
    pub fn project(&self, point: Vec3, aspect: f64) -> Option<(f64, f64)> {
        let b = self.basis();
        let v = point - self.position();
        let depth = v.dot(b.forward);
        if depth <= 1e-9 {
            return None;
        }
        let h = self.half_extent();
        Some((
            v.dot(b.right) / (depth * h * aspect),
            v.dot(b.up) / (depth * h),
        ))
    }
}
