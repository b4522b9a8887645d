use chrono::{DateTime, Utc};
use foundation::math::Vec3;

use crate::arc::{ColorTag, TravelArc};
use crate::camera::OrbitCamera;
use crate::ephemeris::{ShadingToggles, SolarState, SunLight};
use crate::flight::{Flight, FlightPose};
use crate::markers::{CityClass, CityMarker};
use crate::pool::{ActorHandle, LabelPool};
use crate::timezone::{TimezonePolygon, UtcOffset};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ZoneHighlight {
    /// Under the pointer.
    Hover,
    /// Shares the selected UTC offset.
    Band,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum RenderCommand {
    /// The shaded sphere; shading comes from the frame's solar state and toggles.
    Globe { radius: f64 },
    Marker {
        index: u32,
        class: CityClass,
        position: Vec3,
        opacity: f64,
    },
    Label {
        handle: ActorHandle,
        position: Vec3,
        opacity: f64,
        font_size_px: f64,
    },
    Ripple {
        handle: ActorHandle,
        position: Vec3,
        scale: f64,
        opacity: f64,
    },
    /// Per-vertex data is looked up through [`SceneView::arc`].
    Arc { index: u32, color: ColorTag },
    FlightPath,
    FlightCraft { pose: FlightPose, opacity: f64 },
    FlightLabel {
        endpoint: u8,
        position: Vec3,
        opacity: f64,
    },
    Zone { index: u32, highlight: ZoneHighlight },
}

/// Draw list for one tick. The command buffer is reused across ticks.
#[derive(Debug, Clone)]
pub struct RenderFrame {
    pub frame_index: u64,
    pub instant: DateTime<Utc>,
    pub solar: SolarState,
    pub light: SunLight,
    pub shading: ShadingToggles,
    pub camera: OrbitCamera,
    pub selected_offset: Option<UtcOffset>,
    pub commands: Vec<RenderCommand>,
}

impl RenderFrame {
    pub fn new(instant: DateTime<Utc>, solar: SolarState, light: SunLight, camera: OrbitCamera) -> Self {
        Self {
            frame_index: 0,
            instant,
            solar,
            light,
            shading: ShadingToggles::default(),
            camera,
            selected_offset: None,
            commands: Vec::new(),
        }
    }

    pub fn push(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }

    pub fn markers(&self) -> impl Iterator<Item = u32> + '_ {
        self.commands.iter().filter_map(|c| match c {
            RenderCommand::Marker { index, .. } => Some(*index),
            _ => None,
        })
    }

    pub fn labels(&self) -> impl Iterator<Item = ActorHandle> + '_ {
        self.commands.iter().filter_map(|c| match c {
            RenderCommand::Label { handle, .. } => Some(*handle),
            _ => None,
        })
    }

    pub fn ripples(&self) -> impl Iterator<Item = ActorHandle> + '_ {
        self.commands.iter().filter_map(|c| match c {
            RenderCommand::Ripple { handle, .. } => Some(*handle),
            _ => None,
        })
    }

    pub fn zones(&self, highlight: ZoneHighlight) -> impl Iterator<Item = u32> + '_ {
        self.commands.iter().filter_map(move |c| match c {
            RenderCommand::Zone { index, highlight: h } if *h == highlight => Some(*index),
            _ => None,
        })
    }
}

/// Per-vertex arc data for drawing.
#[derive(Debug, Copy, Clone)]
pub struct ArcVertices<'a> {
    pub positions: &'a [Vec3],
    pub intensities: &'a [f64],
    pub occlusion: &'a [f64],
}

/// Read-only scene handed to the rasterizer after the tick.
#[derive(Debug, Copy, Clone)]
pub struct SceneView<'a> {
    pub frame: &'a RenderFrame,
    pub markers: &'a [CityMarker],
    pub labels: &'a LabelPool,
    pub arcs: &'a [TravelArc],
    pub flight: Option<&'a Flight>,
    pub zones: &'a [TimezonePolygon],
}

impl<'a> SceneView<'a> {
    pub fn label_text(&self, handle: ActorHandle) -> Option<&'a str> {
        self.labels.text(handle)
    }

    pub fn marker(&self, index: u32) -> Option<&'a CityMarker> {
        self.markers.get(index as usize)
    }

    pub fn arc(&self, index: u32) -> Option<ArcVertices<'a>> {
        let arc = self.arcs.get(index as usize)?;
        Some(ArcVertices {
            positions: arc.vertices(),
            intensities: arc.intensities(),
            occlusion: arc.occlusion(),
        })
    }

    pub fn zone(&self, index: u32) -> Option<&'a TimezonePolygon> {
        self.zones.get(index as usize)
    }

    pub fn flight_label(&self, endpoint: u8) -> Option<&'a str> {
        let [from, to] = self.flight?.labels();
        match endpoint {
            0 => Some(from.text.as_str()),
            1 => Some(to.text.as_str()),
            _ => None,
        }
    }
}

/// Consumer of a finished tick.
pub trait Rasterizer {
    fn rasterize(&mut self, scene: &SceneView<'_>);
}

/// Rasterizer that only counts what it was given.
#[derive(Debug, Default)]
pub struct CountingRasterizer {
    pub frames: u64,
    pub last_command_count: usize,
}

impl Rasterizer for CountingRasterizer {
    fn rasterize(&mut self, scene: &SceneView<'_>) {
        self.frames += 1;
        self.last_command_count = scene.frame.commands.len();
    }
}
