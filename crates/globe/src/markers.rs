use foundation::math::{GeoPoint, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::CullingConfig;
use crate::culling::occlusion_opacity;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CityClass {
    Capital,
    GlobalCity,
    MajorCity,
}

impl CityClass {
    /// Accepts the spellings seen in city exports (`capital`, `Global City`, `major_city`, ...).
    pub fn parse(text: &str) -> Option<Self> {
        let key: String = text
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "capital" | "capitalcity" => Some(CityClass::Capital),
            "global" | "globalcity" => Some(CityClass::GlobalCity),
            "major" | "majorcity" => Some(CityClass::MajorCity),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct City {
    pub name: String,
    pub country: String,
    pub class: CityClass,
    pub location: GeoPoint,
}

/// Per-class marker visibility toggles.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MarkerToggles {
    pub capitals: bool,
    pub global_cities: bool,
    pub major_cities: bool,
}

impl Default for MarkerToggles {
    fn default() -> Self {
        Self {
            capitals: true,
            global_cities: true,
            major_cities: true,
        }
    }
}

impl MarkerToggles {
    pub fn is_enabled(&self, class: CityClass) -> bool {
        match class {
            CityClass::Capital => self.capitals,
            CityClass::GlobalCity => self.global_cities,
            CityClass::MajorCity => self.major_cities,
        }
    }

    pub fn set(&mut self, class: CityClass, on: bool) {
        match class {
            CityClass::Capital => self.capitals = on,
            CityClass::GlobalCity => self.global_cities = on,
            CityClass::MajorCity => self.major_cities = on,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CityMarker {
    pub city: City,
    pub position: Vec3,
    /// Camera-facing opacity from the last culling pass.
    pub opacity: f64,
    pub visible: bool,
}

/// City markers, created once per data load.
#[derive(Debug, Clone, Default)]
pub struct MarkerSet {
    markers: Vec<CityMarker>,
}

impl MarkerSet {
    /// Places every city `lift` above a globe of `radius`.
    pub fn new(cities: Vec<City>, radius: f64, lift: f64) -> Self {
        let r = radius * (1.0 + lift);
        let markers = cities
            .into_iter()
            .map(|city| CityMarker {
                position: city.location.to_surface(r),
                city,
                opacity: 0.0,
                visible: false,
            })
            .collect();
        Self { markers }
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn as_slice(&self) -> &[CityMarker] {
        &self.markers
    }

    pub fn get(&self, index: usize) -> Option<&CityMarker> {
        self.markers.get(index)
    }

    /// Case-insensitive lookup; the first match wins.
    pub fn find(&self, name: &str) -> Option<&CityMarker> {
        let name = name.trim();
        self.markers
            .iter()
            .find(|m| m.city.name.eq_ignore_ascii_case(name))
    }

    pub fn location_of(&self, name: &str) -> Option<GeoPoint> {
        self.find(name).map(|m| m.city.location)
    }

    /// Recomputes opacity and visibility. Returns the number of visible markers.
    ///
    /// A marker is visible only when its class is enabled and it faces the camera.
    pub fn cull(&mut self, camera_position: Vec3, toggles: MarkerToggles, cfg: &CullingConfig) -> usize {
        let mut visible = 0;
        for m in &mut self.markers {
            m.opacity = occlusion_opacity(m.position, camera_position, cfg);
            m.visible = toggles.is_enabled(m.city.class) && m.opacity > 0.0;
            visible += usize::from(m.visible);
        }
        visible
    }
}
