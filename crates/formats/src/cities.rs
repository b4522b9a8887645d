//! City list ingestion.
//!
//! Input is a JSON array of `{name, country, classification, latitude, longitude}`.
//! `lat`/`lng`/`lon` are accepted as short aliases.

use foundation::math::GeoPoint;
use globe::markers::{City, CityClass};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct CityRecord {
    pub name: String,
    #[serde(default)]
    pub country: String,
    pub classification: String,
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lng", alias = "lon")]
    pub longitude: f64,
}

#[derive(Debug)]
pub enum CityDataError {
    Json(serde_json::Error),
    InvalidRecord { index: usize, reason: String },
}

impl std::fmt::Display for CityDataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CityDataError::Json(e) => write!(f, "city data is not valid JSON: {e}"),
            CityDataError::InvalidRecord { index, reason } => {
                write!(f, "invalid city record at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for CityDataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CityDataError::Json(e) => Some(e),
            CityDataError::InvalidRecord { .. } => None,
        }
    }
}

impl CityRecord {
    pub fn into_city(self, index: usize) -> Result<City, CityDataError> {
        let invalid = |reason: String| CityDataError::InvalidRecord { index, reason };
        let name = self.name.trim();
        if name.is_empty() {
            return Err(invalid("empty name".to_string()));
        }
        let class = CityClass::parse(&self.classification)
            .ok_or_else(|| invalid(format!("unknown classification: {}", self.classification)))?;
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(invalid(format!("latitude out of range: {}", self.latitude)));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(invalid(format!("longitude out of range: {}", self.longitude)));
        }
        Ok(City {
            name: name.to_string(),
            country: self.country.trim().to_string(),
            class,
            location: GeoPoint::new(self.latitude, self.longitude),
        })
    }
}

pub fn parse_cities(payload: &str) -> Result<Vec<City>, CityDataError> {
    let records: Vec<CityRecord> = serde_json::from_str(payload).map_err(CityDataError::Json)?;
    let cities = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| record.into_city(index))
        .collect::<Result<Vec<_>, _>>()?;
    info!(count = cities.len(), "city list parsed");
    Ok(cities)
}

#[cfg(test)]
mod tests {
    use super::{CityDataError, parse_cities};
    use globe::markers::CityClass;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_fixture_cities() {
        let payload = include_str!("../../tools/assets/cities.json");
        let cities = parse_cities(payload).expect("cities");
        assert!(cities.len() >= 8);
        let paris = cities.iter().find(|c| c.name == "Paris").expect("paris");
        assert_eq!(paris.class, CityClass::Capital);
        assert_eq!(paris.country, "France");
        assert!((paris.location.lat_deg - 48.8566).abs() < 1e-9);
    }

    #[test]
    fn accepts_short_coordinate_aliases() {
        let payload = r#"[{"name":" Oslo ","country":"Norway","classification":"capital","lat":59.91,"lng":10.75}]"#;
        let cities = parse_cities(payload).expect("aliases");
        assert_eq!(cities[0].name, "Oslo");
        assert_eq!(cities[0].location.lon_deg, 10.75);
    }

    #[test]
    fn reports_bad_record_index() {
        let payload = r#"[
            {"name":"A","country":"X","classification":"Capital","latitude":1,"longitude":2},
            {"name":"B","country":"X","classification":"village","latitude":1,"longitude":2}
        ]"#;
        let err = parse_cities(payload).expect_err("classification");
        assert!(matches!(err, CityDataError::InvalidRecord { index: 1, .. }));

        let payload = r#"[{"name":"C","classification":"Capital","latitude":95,"longitude":2}]"#;
        let err = parse_cities(payload).expect_err("latitude");
        assert!(err.to_string().contains("latitude out of range"));
    }

    #[test]
    fn malformed_json_is_a_typed_error() {
        assert!(matches!(parse_cities("[{"), Err(CityDataError::Json(_))));
    }
}
