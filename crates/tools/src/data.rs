//! Loads the three data files into an engine.
//!
//! Each file is independent: a failure is logged and that feature stays
//! disabled while the rest of the scene still loads.

use std::fs;
use std::path::{Path, PathBuf};

use formats::{CityDataError, TimezoneDataError, TraveledDataError};
use globe::GlobeEngine;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub cities: PathBuf,
    pub traveled: PathBuf,
    pub timezones: PathBuf,
}

impl DataPaths {
    /// `cities.json`, `traveled.json` and `timezones.geojson` under `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            cities: dir.join("cities.json"),
            traveled: dir.join("traveled.json"),
            timezones: dir.join("timezones.geojson"),
        }
    }
}

#[derive(Debug)]
pub enum DataError {
    Io { path: PathBuf, source: std::io::Error },
    Cities(CityDataError),
    Traveled(TraveledDataError),
    Timezones(TimezoneDataError),
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::Io { path, source } => write!(f, "read {}: {source}", path.display()),
            DataError::Cities(e) => write!(f, "{e}"),
            DataError::Traveled(e) => write!(f, "{e}"),
            DataError::Timezones(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Io { source, .. } => Some(source),
            DataError::Cities(e) => Some(e),
            DataError::Traveled(e) => Some(e),
            DataError::Timezones(e) => Some(e),
        }
    }
}

/// What made it into the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub cities: usize,
    pub routes: usize,
    pub zones: usize,
}

fn read(path: &Path) -> Result<String, DataError> {
    fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_cities(path: &Path) -> Result<Vec<globe::markers::City>, DataError> {
    formats::parse_cities(&read(path)?).map_err(DataError::Cities)
}

pub fn load_traveled(path: &Path) -> Result<globe::arc::TraveledCities, DataError> {
    formats::parse_traveled(&read(path)?).map_err(DataError::Traveled)
}

pub fn load_timezones(path: &Path) -> Result<globe::timezone::TimezoneSet, DataError> {
    formats::parse_timezones(&read(path)?).map_err(DataError::Timezones)
}

/// Cities go in first so traveled routes can resolve their coordinates.
pub fn load_into(engine: &mut GlobeEngine, paths: &DataPaths) -> LoadReport {
    let mut report = LoadReport::default();

    match load_cities(&paths.cities) {
        Ok(cities) => {
            report.cities = cities.len();
            engine.set_cities(cities);
        }
        Err(e) => warn!(error = %e, "city markers disabled"),
    }

    match load_traveled(&paths.traveled) {
        Ok(traveled) => {
            engine.set_traveled(traveled);
            report.routes = engine.context().arcs.len();
        }
        Err(e) => warn!(error = %e, "travel arcs disabled"),
    }

    match load_timezones(&paths.timezones) {
        Ok(set) => {
            report.zones = set.len();
            engine.set_timezones(set);
        }
        Err(e) => warn!(error = %e, "timezone overlay disabled"),
    }

    info!(
        cities = report.cities,
        routes = report.routes,
        zones = report.zones,
        "scene data loaded"
    );
    report
}
