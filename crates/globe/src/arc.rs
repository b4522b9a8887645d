//! Looping traveled-route arcs.
//!
//! Each route is an explicit state machine: `Waiting` until its start delay
//! elapses, then `Playing` forever. The head sweeps 0 → 1 once per loop, and
//! two one-shot flags gate the origin and destination effects for the current
//! loop. Both flags reset when the head wraps.

use foundation::math::{GeoPoint, Vec3};

use crate::config::{ArcConfig, CullingConfig};
use crate::culling::cull_points;
use crate::curve::QuadraticCurve;

/// Palette slot for a route.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ColorTag(pub u8);

pub const ROUTE_PALETTE_LEN: u8 = 6;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ArcPhase {
    Waiting { remaining_s: f64 },
    Playing,
}

/// One-shot effects requested by a single `advance`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ArcTriggers {
    /// The head started a new loop: label at the origin.
    pub origin: bool,
    /// The head reached the destination threshold: ripple and label at the destination.
    pub destination: bool,
}

/// Home base plus the cities visited from it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TraveledCities {
    pub home: String,
    pub visited: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArcRoute {
    pub from_name: String,
    pub to_name: String,
    pub from: GeoPoint,
    pub to: GeoPoint,
}

#[derive(Debug, Clone)]
pub struct TravelArc {
    pub route: ArcRoute,
    pub color: ColorTag,
    curve: QuadraticCurve,
    phase: ArcPhase,
    head: f64,
    origin_fired: bool,
    destination_fired: bool,
    vertices: Vec<Vec3>,
    params: Vec<f64>,
    intensities: Vec<f64>,
    occlusion: Vec<f64>,
}

impl TravelArc {
    /// Builds route number `index`. Returns `None` for degenerate geometry.
    pub fn new(route: ArcRoute, index: usize, radius: f64, cfg: &ArcConfig) -> Option<Self> {
        let from = route.from.to_surface(radius);
        let to = route.to.to_surface(radius);
        let curve = QuadraticCurve::arc(from, to, cfg.height_factor)?;

        let mut vertices = Vec::new();
        curve.sample_into(cfg.segments, &mut vertices);
        let n = vertices.len();
        let last = (n - 1).max(1) as f64;
        let params = (0..n).map(|i| i as f64 / last).collect();

        Some(Self {
            route,
            color: ColorTag((index % usize::from(ROUTE_PALETTE_LEN)) as u8),
            curve,
            phase: ArcPhase::Waiting {
                remaining_s: index as f64 * cfg.stagger_s,
            },
            head: 0.0,
            origin_fired: false,
            destination_fired: false,
            vertices,
            params,
            intensities: vec![0.0; n],
            occlusion: vec![0.0; n],
        })
    }

    pub fn phase(&self) -> ArcPhase {
        self.phase
    }

    /// Head parameter in [0, 1).
    pub fn head(&self) -> f64 {
        self.head
    }

    pub fn curve(&self) -> &QuadraticCurve {
        &self.curve
    }

    pub fn origin(&self) -> Vec3 {
        self.curve.start
    }

    pub fn destination(&self) -> Vec3 {
        self.curve.end
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn intensities(&self) -> &[f64] {
        &self.intensities
    }

    pub fn occlusion(&self) -> &[f64] {
        &self.occlusion
    }

    /// Refreshes per-vertex camera-facing opacity.
    pub fn cull(&mut self, camera_position: Vec3, cfg: &CullingConfig) {
        cull_points(&self.vertices, camera_position, cfg, &mut self.occlusion);
    }

    pub fn is_lit(&self) -> bool {
        self.intensities.iter().any(|i| *i > 0.0)
    }

    /// Steps the state machine by `dt_s` and refreshes vertex intensities.
    pub fn advance(&mut self, dt_s: f64, cfg: &ArcConfig) -> ArcTriggers {
        let mut triggers = ArcTriggers::default();

        if let ArcPhase::Waiting { remaining_s } = self.phase {
            let remaining_s = remaining_s - dt_s;
            if remaining_s > 0.0 {
                self.phase = ArcPhase::Waiting { remaining_s };
                self.intensities.fill(0.0);
                return triggers;
            }
            self.phase = ArcPhase::Playing;
            self.head = 0.0;
            self.origin_fired = false;
            self.destination_fired = false;
        } else {
            self.head += dt_s / cfg.loop_duration_s;
        }

        if !self.origin_fired {
            self.origin_fired = true;
            triggers.origin = true;
        }
        if self.head >= cfg.destination_threshold && !self.destination_fired {
            self.destination_fired = true;
            triggers.destination = true;
        }
        if self.head >= 1.0 {
            self.head = 0.0;
            self.origin_fired = false;
            self.destination_fired = false;
        }

        self.write_intensities(cfg);
        triggers
    }

    fn write_intensities(&mut self, cfg: &ArcConfig) {
        let head = self.head;
        for (out, p) in self.intensities.iter_mut().zip(&self.params) {
            *out = window_intensity(*p, head, cfg.tail_window, cfg.head_window);
        }
    }
}

/// Comet-style highlight: full at the head, fading linearly over `tail`
/// behind it and over `lead` ahead of it.
pub fn window_intensity(p: f64, head: f64, tail: f64, lead: f64) -> f64 {
    if p <= head {
        let behind = head - p;
        if tail > 0.0 && behind <= tail {
            1.0 - behind / tail
        } else if behind == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        let ahead = p - head;
        if lead > 0.0 && ahead <= lead {
            1.0 - ahead / lead
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ArcPhase, ArcRoute, ArcTriggers, ColorTag, TravelArc, window_intensity};
    use crate::config::{ArcConfig, CullingConfig};
    use foundation::math::GeoPoint;

    fn cfg() -> ArcConfig {
        ArcConfig {
            segments: 10,
            height_factor: 0.3,
            loop_duration_s: 1.0,
            stagger_s: 0.5,
            tail_window: 0.2,
            head_window: 0.05,
            destination_threshold: 0.99,
        }
    }

    fn route() -> ArcRoute {
        ArcRoute {
            from_name: "London".into(),
            to_name: "Tokyo".into(),
            from: GeoPoint::new(51.5, -0.12),
            to: GeoPoint::new(35.68, 139.69),
        }
    }

    #[test]
    fn start_delay_staggers_routes() {
        let cfg = cfg();
        let mut arc = TravelArc::new(route(), 2, 1.0, &cfg).expect("arc");
        assert_eq!(arc.color, ColorTag(2));
        assert_eq!(arc.phase(), ArcPhase::Waiting { remaining_s: 1.0 });

        assert_eq!(arc.advance(0.6, &cfg), ArcTriggers::default());
        assert!(!arc.is_lit());
        let fired = arc.advance(0.6, &cfg);
        assert_eq!(arc.phase(), ArcPhase::Playing);
        assert!(fired.origin);
        assert!(!fired.destination);
        assert_eq!(arc.head(), 0.0);
        assert!(arc.is_lit());
    }

    #[test]
    fn triggers_fire_once_per_loop() {
        let cfg = cfg();
        let mut arc = TravelArc::new(route(), 0, 1.0, &cfg).expect("arc");
        // Exact in binary, so eight steps make one loop.
        let dt = 0.125;
        let mut origin = 0;
        let mut destination = 0;
        let mut wraps = 0;
        let mut prev_head = 0.0;
        // Arming frame, three full loops, then one step into the fourth.
        for _ in 0..26 {
            let t = arc.advance(dt, &cfg);
            origin += usize::from(t.origin);
            destination += usize::from(t.destination);
            let head = arc.head();
            assert!((0.0..1.0).contains(&head), "head {head}");
            if head < prev_head {
                wraps += 1;
            }
            prev_head = head;
        }
        assert_eq!(wraps, 3);
        assert_eq!(destination, 3);
        // The fourth loop has started, so its origin label has fired too.
        assert_eq!(origin, 4);
    }

    #[test]
    fn large_step_still_fires_destination_before_wrap() {
        let cfg = cfg();
        let mut arc = TravelArc::new(route(), 0, 1.0, &cfg).expect("arc");
        assert!(arc.advance(0.0, &cfg).origin);
        let t = arc.advance(5.0, &cfg);
        assert!(t.destination);
        assert!(!t.origin);
        assert_eq!(arc.head(), 0.0);
        assert!(arc.advance(0.01, &cfg).origin);
    }

    #[test]
    fn degenerate_route_is_not_created() {
        let same = ArcRoute {
            from_name: "Paris".into(),
            to_name: "Paris".into(),
            from: GeoPoint::new(48.85, 2.35),
            to: GeoPoint::new(48.85, 2.35),
        };
        assert!(TravelArc::new(same, 0, 1.0, &cfg()).is_none());
    }

    #[test]
    fn vertex_buffers_are_preallocated() {
        let cfg = cfg();
        let mut arc = TravelArc::new(route(), 0, 1.0, &cfg).expect("arc");
        assert_eq!(arc.vertices().len(), 11);
        assert_eq!(arc.intensities().len(), 11);
        assert_eq!(arc.occlusion().len(), 11);
        let ptr = arc.intensities().as_ptr();
        for _ in 0..100 {
            arc.advance(0.05, &cfg);
        }
        assert_eq!(arc.intensities().as_ptr(), ptr);
    }

    #[test]
    fn culling_fills_vertex_occlusion() {
        let cfg = cfg();
        let mut arc = TravelArc::new(route(), 0, 1.0, &cfg).expect("arc");
        let camera = GeoPoint::new(51.5, -0.12).to_surface(3.0);
        arc.cull(camera, &CullingConfig::default());
        assert_eq!(arc.occlusion()[0], 1.0);
        arc.cull(-camera, &CullingConfig::default());
        assert_eq!(arc.occlusion()[0], 0.0);
    }

    #[test]
    fn window_has_bright_head_and_fading_tail() {
        assert_eq!(window_intensity(0.5, 0.5, 0.2, 0.05), 1.0);
        assert!((window_intensity(0.4, 0.5, 0.2, 0.05) - 0.5).abs() < 1e-12);
        assert_eq!(window_intensity(0.2, 0.5, 0.2, 0.05), 0.0);
        assert!(window_intensity(0.52, 0.5, 0.2, 0.05) > 0.0);
        assert_eq!(window_intensity(0.6, 0.5, 0.2, 0.05), 0.0);
        assert_eq!(window_intensity(0.3, 0.3, 0.0, 0.0), 1.0);
    }
}
