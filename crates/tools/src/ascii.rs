//! Text rasterizer: one ray per character cell.
//!
//! The sphere is shaded from the frame's solar state; overlays are drawn on
//! top in command order, so later commands win a shared cell.

use foundation::math::{Vec3, from_surface_hit};
use globe::ephemeris::{daylight, sun_angle_deg};
use globe::markers::CityClass;
use globe::picking::surface_point;
use globe::render::{Rasterizer, RenderCommand, SceneView, ZoneHighlight};

/// Night to noon.
const SHADE_RAMP: &[u8] = b".,:-=+*#%@";
/// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: f64 = 0.5;
const ARC_MIN_LEVEL: f64 = 0.2;
const TEXT_MIN_OPACITY: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct AsciiRasterizer {
    width: usize,
    height: usize,
    cells: Vec<u8>,
    frames: u64,
}

impl AsciiRasterizer {
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            cells: vec![b' '; width * height],
            frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64 * CELL_ASPECT
    }

    fn ndc(&self, col: usize, row: usize) -> (f64, f64) {
        let x = (col as f64 + 0.5) / self.width as f64 * 2.0 - 1.0;
        let y = 1.0 - (row as f64 + 0.5) / self.height as f64 * 2.0;
        (x, y)
    }

    fn cell_of(&self, ndc: (f64, f64)) -> Option<(usize, usize)> {
        let (x, y) = ndc;
        if !(-1.0..1.0).contains(&x) || !(-1.0..1.0).contains(&y) {
            return None;
        }
        let col = ((x + 1.0) * 0.5 * self.width as f64) as usize;
        let row = ((1.0 - y) * 0.5 * self.height as f64) as usize;
        (col < self.width && row < self.height).then_some((col, row))
    }

    fn put(&mut self, col: usize, row: usize, glyph: u8) {
        self.cells[row * self.width + col] = glyph;
    }

    fn plot(&mut self, scene: &SceneView<'_>, point: Vec3, glyph: u8) -> Option<(usize, usize)> {
        let (col, row) = self.cell_of(scene.frame.camera.project(point, self.aspect())?)?;
        self.put(col, row, glyph);
        Some((col, row))
    }

    fn write_text(&mut self, col: usize, row: usize, text: &str) {
        for (i, ch) in text.bytes().enumerate() {
            let c = col + i;
            if c >= self.width {
                break;
            }
            self.put(c, row, if ch.is_ascii_graphic() || ch == b' ' { ch } else { b'?' });
        }
    }

    fn shade_globe(&mut self, scene: &SceneView<'_>, radius: f64) {
        let frame = scene.frame;
        let sun = frame.solar.sun_direction();
        let aspect = self.aspect();

        let mut hovered = Vec::new();
        let mut band = Vec::new();
        for cmd in &frame.commands {
            if let RenderCommand::Zone { index, highlight } = cmd
                && let Some(zone) = scene.zone(*index)
            {
                match highlight {
                    ZoneHighlight::Hover => hovered.push(zone),
                    ZoneHighlight::Band => band.push(zone),
                }
            }
        }

        for row in 0..self.height {
            for col in 0..self.width {
                let (x, y) = self.ndc(col, row);
                let ray = frame.camera.ray_from_ndc(x, y, aspect);
                let Some(point) = surface_point(ray, radius) else {
                    continue;
                };
                let level = daylight(sun_angle_deg(point, sun), frame.shading);
                let idx = (level * (SHADE_RAMP.len() - 1) as f64).round() as usize;
                let mut glyph = SHADE_RAMP[idx.min(SHADE_RAMP.len() - 1)];

                if (!hovered.is_empty() || !band.is_empty())
                    && let Some(geo) = from_surface_hit(point)
                {
                    if hovered.iter().any(|z| z.contains(geo.lat_deg, geo.lon_deg)) {
                        glyph = b'&';
                    } else if band.iter().any(|z| z.contains(geo.lat_deg, geo.lon_deg)) {
                        glyph = b'|';
                    }
                }
                self.put(col, row, glyph);
            }
        }
    }

    /// Current buffer, one line per row.
    pub fn render_to_string(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in self.cells.chunks(self.width) {
            out.extend(row.iter().map(|b| *b as char));
            out.push('\n');
        }
        out
    }
}

fn marker_glyph(class: CityClass, opacity: f64) -> u8 {
    let glyph = match class {
        CityClass::Capital => b'C',
        CityClass::GlobalCity => b'G',
        CityClass::MajorCity => b'M',
    };
    if opacity < 0.5 { glyph.to_ascii_lowercase() } else { glyph }
}

impl Rasterizer for AsciiRasterizer {
    fn rasterize(&mut self, scene: &SceneView<'_>) {
        self.frames += 1;
        self.cells.fill(b' ');

        for cmd in &scene.frame.commands {
            match *cmd {
                RenderCommand::Globe { radius } => self.shade_globe(scene, radius),
                RenderCommand::Zone { .. } => {}
                RenderCommand::Marker {
                    class,
                    position,
                    opacity,
                    ..
                } => {
                    self.plot(scene, position, marker_glyph(class, opacity));
                }
                RenderCommand::Arc { index, .. } => {
                    let Some(arc) = scene.arc(index) else { continue };
                    for ((p, lit), occ) in arc
                        .positions
                        .iter()
                        .zip(arc.intensities)
                        .zip(arc.occlusion)
                    {
                        if lit * occ >= ARC_MIN_LEVEL {
                            self.plot(scene, *p, b'~');
                        }
                    }
                }
                RenderCommand::Ripple { position, .. } => {
                    self.plot(scene, position, b'o');
                }
                RenderCommand::Label {
                    handle,
                    position,
                    opacity,
                    ..
                } => {
                    if opacity >= TEXT_MIN_OPACITY
                        && let Some(text) = scene.label_text(handle)
                        && let Some((col, row)) = scene
                            .frame
                            .camera
                            .project(position, self.aspect())
                            .and_then(|ndc| self.cell_of(ndc))
                    {
                        self.write_text(col + 1, row, text);
                    }
                }
                RenderCommand::FlightPath => {
                    if let Some(flight) = scene.flight {
                        for p in flight.path() {
                            self.plot(scene, *p, b'-');
                        }
                    }
                }
                RenderCommand::FlightCraft { pose, .. } => {
                    self.plot(scene, pose.position, b'>');
                }
                RenderCommand::FlightLabel {
                    endpoint,
                    position,
                    opacity,
                } => {
                    if opacity >= TEXT_MIN_OPACITY
                        && let Some(text) = scene.flight_label(endpoint)
                        && let Some((col, row)) = scene
                            .frame
                            .camera
                            .project(position, self.aspect())
                            .and_then(|ndc| self.cell_of(ndc))
                    {
                        self.write_text(col + 1, row, text);
                    }
                }
            }
        }
    }
}
