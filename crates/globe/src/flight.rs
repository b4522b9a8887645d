//! User-triggered point-to-point flight.
//!
//! `Idle → Playing(A)` on a trigger, `Playing(A) → Idle` on a second trigger
//! with the same journey key, and `Playing(A) → Playing(B)` on a trigger with a
//! different key. Replacing tears the old flight down before the new one is
//! built.

use foundation::math::{GeoPoint, Vec3};
use runtime::{EventBus, Frame};
use tracing::{info, warn};

use crate::config::FlightConfig;
use crate::curve::QuadraticCurve;

#[derive(Debug, Clone, PartialEq)]
pub struct FlightRequest {
    pub from_city: String,
    pub to_city: String,
    pub from: Option<GeoPoint>,
    pub to: Option<GeoPoint>,
}

impl FlightRequest {
    pub fn new(
        from_city: impl Into<String>,
        to_city: impl Into<String>,
        from: Option<GeoPoint>,
        to: Option<GeoPoint>,
    ) -> Self {
        Self {
            from_city: from_city.into(),
            to_city: to_city.into(),
            from,
            to,
        }
    }

    pub fn journey_key(&self) -> String {
        format!("{}->{}", self.from_city, self.to_city)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlightRejection {
    MissingCoordinates { city: String },
    DegenerateGeometry,
}

impl std::fmt::Display for FlightRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlightRejection::MissingCoordinates { city } => {
                write!(f, "no coordinates for {city}")
            }
            FlightRejection::DegenerateGeometry => write!(f, "endpoints coincide"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlightOutcome {
    Started { key: String },
    Stopped { key: String },
    Replaced { previous: String, key: String },
    Rejected(FlightRejection),
}

/// Orientation frame of the moving object.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FlightPose {
    pub position: Vec3,
    /// Unit path tangent (nose direction).
    pub forward: Vec3,
    /// Outward surface normal made orthogonal to `forward`.
    pub up: Vec3,
    pub right: Vec3,
}

impl FlightPose {
    pub fn on_curve(curve: &QuadraticCurve, progress: f64) -> Self {
        let position = curve.point_at(progress);
        let forward = curve.tangent_at(progress);
        let normal = position.normalize().unwrap_or(Vec3::Y);
        let up = (normal - forward * normal.dot(forward))
            .normalize()
            .unwrap_or(normal);
        Self {
            position,
            forward,
            up,
            right: forward.cross(up),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndpointLabel {
    pub text: String,
    pub position: Vec3,
}

/// A playing flight and every object it owns.
#[derive(Debug, Clone)]
pub struct Flight {
    key: String,
    curve: QuadraticCurve,
    path: Vec<Vec3>,
    progress: f64,
    pose: FlightPose,
    origin_label: EndpointLabel,
    destination_label: EndpointLabel,
}

impl Flight {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn curve(&self) -> &QuadraticCurve {
        &self.curve
    }

    pub fn path(&self) -> &[Vec3] {
        &self.path
    }

    /// Progress in [0, 1).
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn pose(&self) -> FlightPose {
        self.pose
    }

    pub fn labels(&self) -> [&EndpointLabel; 2] {
        [&self.origin_label, &self.destination_label]
    }
}

#[derive(Debug, Default)]
enum FlightState {
    #[default]
    Idle,
    Playing(Box<Flight>),
}

#[derive(Debug, Default)]
pub struct FlightAnimator {
    state: FlightState,
}

impl FlightAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, FlightState::Playing(_))
    }

    pub fn current(&self) -> Option<&Flight> {
        match &self.state {
            FlightState::Playing(flight) => Some(flight.as_ref()),
            FlightState::Idle => None,
        }
    }

    /// Path line, moving object and two endpoint labels while playing.
    pub fn owned_objects(&self) -> usize {
        if self.is_playing() { 4 } else { 0 }
    }

    pub fn trigger(
        &mut self,
        request: &FlightRequest,
        radius: f64,
        cfg: &FlightConfig,
        frame: Frame,
        bus: &mut EventBus,
    ) -> FlightOutcome {
        let key = request.journey_key();
        if self.current().is_some_and(|f| f.key == key) {
            self.teardown(frame, bus);
            info!(journey = %key, "flight stopped");
            return FlightOutcome::Stopped { key };
        }

        let curve = match flight_curve(request, radius, cfg) {
            Ok(curve) => curve,
            Err(rejection) => {
                warn!(journey = %key, reason = %rejection, "flight rejected");
                bus.emit(frame, "flight", format!("rejected {key}"));
                return FlightOutcome::Rejected(rejection);
            }
        };

        let previous = self.teardown(frame, bus);

        let mut path = Vec::new();
        curve.sample_into(cfg.path_segments, &mut path);
        let flight = Flight {
            key: key.clone(),
            curve,
            path,
            progress: 0.0,
            pose: FlightPose::on_curve(&curve, 0.0),
            origin_label: EndpointLabel {
                text: request.from_city.clone(),
                position: curve.start,
            },
            destination_label: EndpointLabel {
                text: request.to_city.clone(),
                position: curve.end,
            },
        };
        self.state = FlightState::Playing(Box::new(flight));
        bus.emit(frame, "flight", format!("build {key}"));

        match previous {
            Some(previous) => {
                info!(from = %previous, to = %key, "flight replaced");
                FlightOutcome::Replaced { previous, key }
            }
            None => {
                info!(journey = %key, "flight started");
                FlightOutcome::Started { key }
            }
        }
    }

    /// Drops the current flight and everything it owns. Returns its key.
    pub fn teardown(&mut self, frame: Frame, bus: &mut EventBus) -> Option<String> {
        match std::mem::take(&mut self.state) {
            FlightState::Playing(flight) => {
                bus.emit(frame, "flight", format!("teardown {}", flight.key));
                Some(flight.key)
            }
            FlightState::Idle => None,
        }
    }

    /// Advances progress by the fixed step, wrapping to 0 at the end.
    pub fn advance(&mut self, cfg: &FlightConfig) {
        let FlightState::Playing(flight) = &mut self.state else {
            return;
        };
        flight.progress += cfg.step;
        if flight.progress >= 1.0 {
            flight.progress = 0.0;
        }
        flight.pose = FlightPose::on_curve(&flight.curve, flight.progress);
    }
}

fn flight_curve(
    request: &FlightRequest,
    radius: f64,
    cfg: &FlightConfig,
) -> Result<QuadraticCurve, FlightRejection> {
    let from = request.from.ok_or_else(|| FlightRejection::MissingCoordinates {
        city: request.from_city.clone(),
    })?;
    let to = request.to.ok_or_else(|| FlightRejection::MissingCoordinates {
        city: request.to_city.clone(),
    })?;
    QuadraticCurve::arc(
        from.to_surface(radius),
        to.to_surface(radius),
        cfg.height_factor,
    )
    .ok_or(FlightRejection::DegenerateGeometry)
}
