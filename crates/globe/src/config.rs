use serde::{Deserialize, Serialize};

/// Tunables for every engine subsystem.
///
/// Every section is `#[serde(default)]`, so a config file only needs the keys
/// it overrides.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub frame: FrameConfig,
    pub globe: GlobeConfig,
    pub pools: PoolConfig,
    pub label: LabelEnvelopeConfig,
    pub ripple: RippleEnvelopeConfig,
    pub arcs: ArcConfig,
    pub flight: FlightConfig,
    pub culling: CullingConfig,
    pub camera: CameraConfig,
    pub picking: PickingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Deltas above this are clamped (tab switches, debugger pauses).
    pub max_dt_s: f64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self { max_dt_s: 0.25 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeConfig {
    pub radius: f64,
    /// Height of markers and labels above the surface, as a fraction of the radius.
    pub marker_lift: f64,
    pub light_distance: f64,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            marker_lift: 0.01,
            light_distance: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub label_capacity: usize,
    pub ripple_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            label_capacity: 50,
            ripple_capacity: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelEnvelopeConfig {
    pub fade_in_s: f64,
    pub hold_s: f64,
    pub fade_out_s: f64,
    pub font_size_px: f64,
}

impl Default for LabelEnvelopeConfig {
    fn default() -> Self {
        Self {
            fade_in_s: 0.3,
            hold_s: 1.5,
            fade_out_s: 0.7,
            font_size_px: 14.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RippleEnvelopeConfig {
    pub initial_scale: f64,
    pub max_scale: f64,
    pub duration_s: f64,
    pub initial_opacity: f64,
}

impl Default for RippleEnvelopeConfig {
    fn default() -> Self {
        Self {
            initial_scale: 1.0,
            max_scale: 4.0,
            duration_s: 1.2,
            initial_opacity: 0.9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcConfig {
    /// Curve samples per route (vertex count is `segments + 1`).
    pub segments: usize,
    pub height_factor: f64,
    pub loop_duration_s: f64,
    /// Route `i` starts `i * stagger_s` seconds after the scene is armed.
    pub stagger_s: f64,
    pub tail_window: f64,
    pub head_window: f64,
    pub destination_threshold: f64,
}

impl Default for ArcConfig {
    fn default() -> Self {
        Self {
            segments: 64,
            height_factor: 0.35,
            loop_duration_s: 3.0,
            stagger_s: 0.6,
            tail_window: 0.3,
            head_window: 0.04,
            destination_threshold: 0.99,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    pub height_factor: f64,
    /// Progress added per tick.
    pub step: f64,
    pub path_segments: usize,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            height_factor: 0.5,
            step: 0.003,
            path_segments: 96,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CullingConfig {
    /// Dot products at or below this are fully transparent.
    pub fade_start: f64,
    /// Dot products at or above this are fully opaque.
    pub fade_end: f64,
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self {
            fade_start: 0.0,
            fade_end: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub distance: f64,
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub fov_y_deg: f64,
    pub rotation_speed_deg_s: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: 3.0,
            lat_deg: 20.0,
            lon_deg: 0.0,
            fov_y_deg: 45.0,
            rotation_speed_deg_s: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickingConfig {
    /// Great-circle tolerance around a surface hit when picking markers.
    pub marker_tolerance_deg: f64,
}

impl Default for PickingConfig {
    fn default() -> Self {
        Self {
            marker_tolerance_deg: 1.5,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Parse(err) => write!(f, "config parse error: {err}"),
            ConfigError::Invalid { field, reason } => write!(f, "invalid config `{field}`: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(err) => Some(err),
            ConfigError::Invalid { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

impl EngineConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: EngineConfig = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, v: f64) -> Result<(), ConfigError> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: "must be a positive number",
                })
            }
        }
        fn non_negative(field: &'static str, v: f64) -> Result<(), ConfigError> {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: "must be zero or positive",
                })
            }
        }

        positive("frame.max_dt_s", self.frame.max_dt_s)?;
        positive("globe.radius", self.globe.radius)?;
        non_negative("globe.marker_lift", self.globe.marker_lift)?;
        positive("globe.light_distance", self.globe.light_distance)?;
        non_negative("label.fade_in_s", self.label.fade_in_s)?;
        non_negative("label.hold_s", self.label.hold_s)?;
        non_negative("label.fade_out_s", self.label.fade_out_s)?;
        positive("label.font_size_px", self.label.font_size_px)?;
        positive("ripple.duration_s", self.ripple.duration_s)?;
        positive("arcs.loop_duration_s", self.arcs.loop_duration_s)?;
        non_negative("arcs.stagger_s", self.arcs.stagger_s)?;
        non_negative("arcs.tail_window", self.arcs.tail_window)?;
        non_negative("arcs.head_window", self.arcs.head_window)?;
        positive("flight.step", self.flight.step)?;
        positive("camera.fov_y_deg", self.camera.fov_y_deg)?;
        non_negative("picking.marker_tolerance_deg", self.picking.marker_tolerance_deg)?;

        if self.arcs.segments == 0 {
            return Err(ConfigError::Invalid {
                field: "arcs.segments",
                reason: "must be at least 1",
            });
        }
        if self.flight.path_segments == 0 {
            return Err(ConfigError::Invalid {
                field: "flight.path_segments",
                reason: "must be at least 1",
            });
        }
        if !(self.arcs.destination_threshold > 0.0 && self.arcs.destination_threshold < 1.0) {
            return Err(ConfigError::Invalid {
                field: "arcs.destination_threshold",
                reason: "must lie strictly between 0 and 1",
            });
        }
        if self.flight.step >= 1.0 {
            return Err(ConfigError::Invalid {
                field: "flight.step",
                reason: "must be below 1",
            });
        }
        if self.culling.fade_end < self.culling.fade_start {
            return Err(ConfigError::Invalid {
                field: "culling.fade_end",
                reason: "must not be below culling.fade_start",
            });
        }
        if self.camera.distance <= self.globe.radius {
            return Err(ConfigError::Invalid {
                field: "camera.distance",
                reason: "camera must sit outside the globe",
            });
        }
        Ok(())
    }
}
