//! Engine context and per-frame tick.
//!
//! All mutable scene state lives in [`EngineContext`]. Every phase is a
//! scheduler job over that context, and the job priorities fix the order:
//! clock, ephemeris, lighting, camera, hover, animators, pools, culling, render.
//! The rasterizer runs after the last phase.

use chrono::{DateTime, Utc};
use foundation::math::GeoPoint;
use runtime::{EventBus, Frame, Job, Metrics, Scheduler};
use tracing::{info, warn};

use crate::arc::{ArcRoute, TravelArc, TraveledCities};
use crate::camera::OrbitCamera;
use crate::clock::SimClock;
use crate::config::{ConfigError, EngineConfig};
use crate::culling::occlusion_opacity;
use crate::ephemeris::{ShadingToggles, SolarState, SunLight};
use crate::flight::{FlightAnimator, FlightOutcome, FlightRequest};
use crate::hover::{HoverOutcome, HoverResolver, HoverToken};
use crate::markers::{City, CityClass, CityMarker, MarkerSet, MarkerToggles};
use crate::picking::{Ray, pick_marker, surface_hit};
use crate::pool::{
    Envelope, LABEL_POOL, LabelEnvelope, LabelPool, PoolDiagnostics, RIPPLE_POOL,
    RippleEnvelope, RipplePool,
};
use crate::render::{Rasterizer, RenderCommand, RenderFrame, SceneView, ZoneHighlight};
use crate::timezone::{TimezoneSet, UtcOffset, select_by_offset};

pub mod phase {
    pub const CLOCK: i32 = 0;
    pub const EPHEMERIS: i32 = 10;
    pub const LIGHTING: i32 = 20;
    pub const CAMERA: i32 = 30;
    pub const HOVER: i32 = 40;
    pub const ANIMATORS: i32 = 50;
    pub const POOLS: i32 = 60;
    pub const CULLING: i32 = 70;
    pub const RENDER: i32 = 80;
}

pub mod metric {
    pub const ARCS_SKIPPED: &str = "arcs.skipped";
    pub const HOVER_RESOLVED: &str = "hover.resolved";
    pub const HOVER_UNCHANGED: &str = "hover.unchanged";
    pub const MARKERS_VISIBLE: &str = "markers.visible";
    pub const RENDER_COMMANDS: &str = "render.commands";
    pub const RENDER_COMMANDS_PER_FRAME: &str = "render.commands.per_frame";
}

/// Camera-facing opacity of the flight's objects.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct FlightVisibility {
    pub craft: f64,
    pub labels: [f64; 2],
}

/// Everything a phase may read or write.
#[derive(Debug)]
pub struct EngineContext {
    pub config: EngineConfig,
    pub clock: SimClock,
    pub solar: SolarState,
    pub light: SunLight,
    pub shading: ShadingToggles,
    pub camera: OrbitCamera,
    pub markers: MarkerSet,
    pub marker_toggles: MarkerToggles,
    pub traveled: Option<TraveledCities>,
    pub arcs: Vec<TravelArc>,
    pub labels: LabelPool,
    pub ripples: RipplePool,
    pub flight: FlightAnimator,
    pub flight_visibility: FlightVisibility,
    pub timezones: TimezoneSet,
    pub timezone_overlay: bool,
    pub selected_offset: Option<UtcOffset>,
    pub hover: HoverResolver,
    pub hovered_zone: Option<usize>,
    /// Set when the hovered zone changed and the overlay needs redrawing.
    pub overlay_dirty: bool,
    pub label_font_size_px: f64,
    pub render: RenderFrame,
    pub metrics: Metrics,
}

impl EngineContext {
    pub fn new(config: EngineConfig, start: DateTime<Utc>) -> Self {
        let solar = SolarState::at(start);
        let light = SunLight::place(&solar, config.globe.light_distance);
        let camera = OrbitCamera::from_config(&config.camera);
        Self {
            clock: SimClock::new(start),
            solar,
            light,
            shading: ShadingToggles::default(),
            camera,
            markers: MarkerSet::default(),
            marker_toggles: MarkerToggles::default(),
            traveled: None,
            arcs: Vec::new(),
            labels: LabelPool::new(LABEL_POOL, config.pools.label_capacity),
            ripples: RipplePool::new(RIPPLE_POOL, config.pools.ripple_capacity),
            flight: FlightAnimator::new(),
            flight_visibility: FlightVisibility::default(),
            timezones: TimezoneSet::default(),
            timezone_overlay: false,
            selected_offset: None,
            hover: HoverResolver::new(),
            hovered_zone: None,
            overlay_dirty: false,
            label_font_size_px: config.label.font_size_px,
            render: RenderFrame::new(start, solar, light, camera),
            metrics: Metrics::new(),
            config,
        }
    }

    /// Rebuilds the route arcs from the traveled list and current markers.
    ///
    /// Routes whose cities have no coordinates, or whose endpoints coincide,
    /// are skipped with a warning.
    fn rebuild_arcs(&mut self, frame: Frame, bus: &mut EventBus) {
        self.arcs.clear();
        let Some(traveled) = &self.traveled else {
            return;
        };
        let Some(home) = self.markers.location_of(&traveled.home) else {
            warn!(home = %traveled.home, "home city has no coordinates; no arcs built");
            self.metrics.inc_counter(metric::ARCS_SKIPPED, traveled.visited.len() as u64);
            bus.emit(frame, "arc", format!("skipped all: unknown home {}", traveled.home));
            return;
        };

        for name in &traveled.visited {
            let Some(to) = self.markers.location_of(name) else {
                warn!(city = %name, "visited city has no coordinates; arc skipped");
                self.metrics.inc_counter(metric::ARCS_SKIPPED, 1);
                bus.emit(frame, "arc", format!("skipped {name}"));
                continue;
            };
            let route = ArcRoute {
                from_name: traveled.home.clone(),
                to_name: name.clone(),
                from: home,
                to,
            };
            let index = self.arcs.len();
            match TravelArc::new(route, index, self.config.globe.radius, &self.config.arcs) {
                Some(arc) => self.arcs.push(arc),
                None => {
                    warn!(city = %name, "degenerate route; arc skipped");
                    self.metrics.inc_counter(metric::ARCS_SKIPPED, 1);
                    bus.emit(frame, "arc", format!("skipped {name}"));
                }
            }
        }
    }
}

fn run_clock(ctx: &mut EngineContext, frame: Frame, _bus: &mut EventBus) {
    ctx.clock.advance(frame.dt_s);
}

fn run_ephemeris(ctx: &mut EngineContext, _frame: Frame, _bus: &mut EventBus) {
    ctx.solar = SolarState::at(ctx.clock.instant());
}

fn run_lighting(ctx: &mut EngineContext, _frame: Frame, _bus: &mut EventBus) {
    ctx.light = SunLight::place(&ctx.solar, ctx.config.globe.light_distance);
}

fn run_camera(ctx: &mut EngineContext, frame: Frame, _bus: &mut EventBus) {
    ctx.camera.advance(frame.dt_s);
}

fn run_hover(ctx: &mut EngineContext, frame: Frame, bus: &mut EventBus) {
    let polygons = ctx.timezones.polygons();
    match ctx.hover.resolve(polygons) {
        Some(HoverOutcome::Changed { zone }) => {
            ctx.hovered_zone = zone;
            ctx.overlay_dirty = true;
            ctx.metrics.inc_counter(metric::HOVER_RESOLVED, 1);
            let id = zone.map_or("none", |i| polygons[i].id.as_str());
            bus.emit(frame, "hover", id);
        }
        Some(HoverOutcome::Unchanged) => {
            ctx.metrics.inc_counter(metric::HOVER_UNCHANGED, 1);
        }
        None => {}
    }
}

fn run_animators(ctx: &mut EngineContext, frame: Frame, bus: &mut EventBus) {
    let lift = 1.0 + ctx.config.globe.marker_lift;
    let EngineContext {
        config,
        arcs,
        labels,
        ripples,
        flight,
        metrics,
        ..
    } = ctx;
    let mut diag = PoolDiagnostics {
        frame,
        metrics,
        bus,
    };

    for arc in arcs.iter_mut() {
        let triggers = arc.advance(frame.dt_s, &config.arcs);
        if triggers.origin {
            let envelope = LabelEnvelope::new(frame.time, &config.label);
            labels.acquire_label(&arc.route.from_name, arc.origin() * lift, envelope, &mut diag);
        }
        if triggers.destination {
            let anchor = arc.destination() * lift;
            let ripple = RippleEnvelope::new(frame.time, &config.ripple);
            ripples.acquire(anchor, Envelope::Ripple(ripple), &mut diag);
            let envelope = LabelEnvelope::new(frame.time, &config.label);
            labels.acquire_label(&arc.route.to_name, anchor, envelope, &mut diag);
        }
    }

    flight.advance(&config.flight);
}

fn run_pools(ctx: &mut EngineContext, frame: Frame, _bus: &mut EventBus) {
    ctx.labels.advance(frame.time);
    ctx.ripples.advance(frame.time);
    ctx.labels.record_gauges(&mut ctx.metrics);
    ctx.ripples.record_gauges(&mut ctx.metrics);
}

fn run_culling(ctx: &mut EngineContext, _frame: Frame, _bus: &mut EventBus) {
    let camera = ctx.camera.position();
    let cfg = &ctx.config.culling;

    let visible = ctx.markers.cull(camera, ctx.marker_toggles, cfg);
    ctx.metrics.set_gauge(metric::MARKERS_VISIBLE, visible as i64);

    for (_, actor) in ctx.labels.iter_mut() {
        actor.occlusion = occlusion_opacity(actor.anchor, camera, cfg);
    }
    for (_, actor) in ctx.ripples.iter_mut() {
        actor.occlusion = occlusion_opacity(actor.anchor, camera, cfg);
    }
    for arc in &mut ctx.arcs {
        arc.cull(camera, cfg);
    }

    ctx.flight_visibility = match ctx.flight.current() {
        Some(flight) => {
            let [from, to] = flight.labels();
            FlightVisibility {
                craft: occlusion_opacity(flight.pose().position, camera, cfg),
                labels: [
                    occlusion_opacity(from.position, camera, cfg),
                    occlusion_opacity(to.position, camera, cfg),
                ],
            }
        }
        None => FlightVisibility::default(),
    };
}

fn run_render(ctx: &mut EngineContext, frame: Frame, _bus: &mut EventBus) {
    let out = &mut ctx.render;
    out.commands.clear();
    out.frame_index = frame.index;
    out.instant = ctx.clock.instant();
    out.solar = ctx.solar;
    out.light = ctx.light;
    out.shading = ctx.shading;
    out.camera = ctx.camera;
    out.selected_offset = ctx.selected_offset.filter(|_| ctx.timezone_overlay);

    out.push(RenderCommand::Globe {
        radius: ctx.config.globe.radius,
    });

    if ctx.timezone_overlay {
        let polygons = ctx.timezones.polygons();
        if let Some(offset) = ctx.selected_offset {
            for (index, _) in select_by_offset(polygons, offset) {
                out.push(RenderCommand::Zone {
                    index: index as u32,
                    highlight: ZoneHighlight::Band,
                });
            }
        }
        if let Some(index) = ctx.hovered_zone.filter(|i| *i < polygons.len()) {
            out.push(RenderCommand::Zone {
                index: index as u32,
                highlight: ZoneHighlight::Hover,
            });
        }
    }
    ctx.overlay_dirty = false;

    for (index, m) in ctx.markers.as_slice().iter().enumerate() {
        if m.visible {
            out.push(RenderCommand::Marker {
                index: index as u32,
                class: m.city.class,
                position: m.position,
                opacity: m.opacity,
            });
        }
    }

    for (index, arc) in ctx.arcs.iter().enumerate() {
        if arc.is_lit() && arc.occlusion().iter().any(|o| *o > 0.0) {
            out.push(RenderCommand::Arc {
                index: index as u32,
                color: arc.color,
            });
        }
    }

    for (handle, actor) in ctx.ripples.iter() {
        let opacity = actor.visible_opacity();
        if opacity > 0.0 {
            out.push(RenderCommand::Ripple {
                handle,
                position: actor.anchor,
                scale: actor.scale,
                opacity,
            });
        }
    }

    for (handle, actor) in ctx.labels.iter() {
        let opacity = actor.visible_opacity();
        if opacity > 0.0 {
            out.push(RenderCommand::Label {
                handle,
                position: actor.anchor,
                opacity,
                font_size_px: ctx.label_font_size_px,
            });
        }
    }

    if let Some(flight) = ctx.flight.current() {
        let vis = ctx.flight_visibility;
        out.push(RenderCommand::FlightPath);
        if vis.craft > 0.0 {
            out.push(RenderCommand::FlightCraft {
                pose: flight.pose(),
                opacity: vis.craft,
            });
        }
        for (endpoint, label) in flight.labels().into_iter().enumerate() {
            if vis.labels[endpoint] > 0.0 {
                out.push(RenderCommand::FlightLabel {
                    endpoint: endpoint as u8,
                    position: label.position,
                    opacity: vis.labels[endpoint],
                });
            }
        }
    }

    let count = out.commands.len() as i64;
    ctx.metrics.set_gauge(metric::RENDER_COMMANDS, count);
    ctx.metrics.record_histogram(metric::RENDER_COMMANDS_PER_FRAME, count);
}

fn build_scheduler() -> Scheduler<EngineContext> {
    let mut scheduler = Scheduler::new();
    scheduler.add_job(Job::with_priority("clock", phase::CLOCK, run_clock));
    scheduler.add_job(Job::with_priority("ephemeris", phase::EPHEMERIS, run_ephemeris));
    scheduler.add_job(Job::with_priority("lighting", phase::LIGHTING, run_lighting));
    scheduler.add_job(Job::with_priority("camera", phase::CAMERA, run_camera));
    scheduler.add_job(Job::with_priority("hover", phase::HOVER, run_hover));
    scheduler.add_job(Job::with_priority("animators", phase::ANIMATORS, run_animators));
    scheduler.add_job(Job::with_priority("pools", phase::POOLS, run_pools));
    scheduler.add_job(Job::with_priority("culling", phase::CULLING, run_culling));
    scheduler.add_job(Job::with_priority("render", phase::RENDER, run_render));
    scheduler
}

/// The globe engine: context, phase scheduler and the controls exposed to a UI.
pub struct GlobeEngine {
    ctx: EngineContext,
    scheduler: Scheduler<EngineContext>,
    bus: EventBus,
    frame: Frame,
}

impl GlobeEngine {
    /// Fails when `config` does not pass [`EngineConfig::validate`].
    pub fn new(config: EngineConfig, start: DateTime<Utc>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            ctx: EngineContext::new(config, start),
            scheduler: build_scheduler(),
            bus: EventBus::new(),
            frame: Frame::new(0, 0.0),
        })
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn scheduler(&self) -> &Scheduler<EngineContext> {
        &self.scheduler
    }

    /// Events recorded since the start of the last tick.
    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn metrics(&self) -> &Metrics {
        &self.ctx.metrics
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn render_frame(&self) -> &RenderFrame {
        &self.ctx.render
    }

    /// Runs every phase for a frame `dt_s` seconds after the previous one.
    pub fn step(&mut self, dt_s: f64) -> &RenderFrame {
        let dt_s = dt_s.min(self.ctx.config.frame.max_dt_s);
        self.frame = self.frame.next(dt_s);
        self.bus.clear();
        self.scheduler.run_frame(&mut self.ctx, self.frame, &mut self.bus);
        &self.ctx.render
    }

    /// [`step`](Self::step), then hands the finished scene to `rasterizer`.
    pub fn tick(&mut self, dt_s: f64, rasterizer: &mut dyn Rasterizer) {
        self.step(dt_s);
        rasterizer.rasterize(&self.scene());
    }

    pub fn scene(&self) -> SceneView<'_> {
        SceneView {
            frame: &self.ctx.render,
            markers: self.ctx.markers.as_slice(),
            labels: &self.ctx.labels,
            arcs: &self.ctx.arcs,
            flight: self.ctx.flight.current(),
            zones: self.ctx.timezones.polygons(),
        }
    }

    // Data loading.

    pub fn set_cities(&mut self, cities: Vec<City>) {
        let g = &self.ctx.config.globe;
        self.ctx.markers = MarkerSet::new(cities, g.radius, g.marker_lift);
        info!(count = self.ctx.markers.len(), "city markers loaded");
        self.ctx.rebuild_arcs(self.frame, &mut self.bus);
    }

    pub fn set_traveled(&mut self, traveled: TraveledCities) {
        self.ctx.traveled = Some(traveled);
        self.ctx.rebuild_arcs(self.frame, &mut self.bus);
        info!(arcs = self.ctx.arcs.len(), "traveled routes built");
    }

    /// Installs boundary data. Returns `false` when the set has the same
    /// fingerprint as the loaded one and was skipped.
    pub fn set_timezones(&mut self, set: TimezoneSet) -> bool {
        if self.ctx.timezones.same_source(&set) {
            return false;
        }
        info!(zones = set.len(), "timezone boundaries loaded");
        self.ctx.timezones = set;
        self.ctx.hover.invalidate();
        self.ctx.hovered_zone = None;
        true
    }

    // Simulated time.

    pub fn simulated_instant(&self) -> DateTime<Utc> {
        self.ctx.clock.instant()
    }

    pub fn play(&mut self) {
        self.ctx.clock.play();
    }

    pub fn pause(&mut self) {
        self.ctx.clock.pause();
    }

    pub fn sync_to_realtime(&mut self) {
        self.ctx.clock.sync_to(Utc::now());
    }

    pub fn scrub_to_day_of_year(&mut self, day: u32) {
        self.ctx.clock.scrub_to_day_of_year(day);
    }

    pub fn set_time_speed(&mut self, speed: f64) {
        self.ctx.clock.set_speed(speed);
    }

    // Display toggles.

    pub fn set_terminator(&mut self, on: bool) {
        self.ctx.shading.terminator = on;
    }

    pub fn set_twilight(&mut self, on: bool) {
        self.ctx.shading.twilight = on;
    }

    pub fn set_marker_class_visible(&mut self, class: CityClass, on: bool) {
        self.ctx.marker_toggles.set(class, on);
    }

    /// Turning the overlay off clears the hover memo and cancels any pending lookup.
    pub fn set_timezone_overlay(&mut self, on: bool) {
        self.ctx.timezone_overlay = on;
        if on {
            self.ctx.hover.enable();
        } else {
            self.ctx.hover.disable();
            self.ctx.hovered_zone = None;
        }
        self.ctx.overlay_dirty = true;
    }

    pub fn set_rotation_speed(&mut self, deg_per_s: f64) {
        if deg_per_s.is_finite() {
            self.ctx.camera.rotation_speed_deg_s = deg_per_s;
        }
    }

    pub fn set_label_font_size(&mut self, px: f64) {
        if px.is_finite() && px > 0.0 {
            self.ctx.label_font_size_px = px;
        }
    }

    /// Selects the highlighted offset band from the slider table.
    pub fn set_utc_offset_index(&mut self, index: Option<usize>) {
        self.ctx.selected_offset = index.map(UtcOffset::from_index);
        self.ctx.overlay_dirty = true;
    }

    // Interaction.

    /// Starts, stops or replaces the flight. The outcome is also passed to `on_complete`.
    pub fn trigger_flight(
        &mut self,
        request: FlightRequest,
        on_complete: impl FnOnce(&FlightOutcome),
    ) -> FlightOutcome {
        let outcome = self.ctx.flight.trigger(
            &request,
            self.ctx.config.globe.radius,
            &self.ctx.config.flight,
            self.frame,
            &mut self.bus,
        );
        on_complete(&outcome);
        outcome
    }

    /// Looks up both endpoints by city name and triggers the flight.
    pub fn trigger_flight_between(
        &mut self,
        from_city: &str,
        to_city: &str,
        on_complete: impl FnOnce(&FlightOutcome),
    ) -> FlightOutcome {
        let from = self.ctx.markers.location_of(from_city);
        let to = self.ctx.markers.location_of(to_city);
        self.trigger_flight(FlightRequest::new(from_city, to_city, from, to), on_complete)
    }

    /// Stages a hover lookup for the next tick. `None` while the overlay is off.
    pub fn pointer_moved(&mut self, ray: Ray) -> Option<HoverToken> {
        if !self.ctx.timezone_overlay {
            return None;
        }
        let hit = surface_hit(ray, self.ctx.config.globe.radius);
        self.ctx.hover.stage(hit)
    }

    /// Front-facing, enabled marker under the ray.
    pub fn pick(&self, ray: Ray) -> Option<&CityMarker> {
        let cfg = &self.ctx.config;
        let hit = pick_marker(
            ray,
            cfg.globe.radius,
            self.ctx.markers.as_slice(),
            self.ctx.marker_toggles,
            &cfg.culling,
            cfg.picking.marker_tolerance_deg,
        )?;
        self.ctx.markers.get(hit.index)
    }

    /// Geographic point under the ray.
    pub fn geo_at(&self, ray: Ray) -> Option<GeoPoint> {
        surface_hit(ray, self.ctx.config.globe.radius)
    }
}

impl std::fmt::Debug for GlobeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobeEngine")
            .field("frame", &self.frame)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}
