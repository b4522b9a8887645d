//! Timezone boundary ingestion from a GeoJSON FeatureCollection.
//!
//! Offset lookup order: `zone`, `utc_offset`, `offset`. Each may be a number of
//! hours (`5.75`) or a string (`"+05:45"`, `"UTC-3"`, `"-3.5"`).
//! Id lookup order: `tz_name1st`, `time_zone`, `id`, then the feature id.

use globe::timezone::{MAX_OFFSET_MINUTES, TimezonePolygon, TimezoneSet, UtcOffset};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::fingerprint::fingerprint;
use crate::geojson::{FeatureCollection, GeoJsonError};

const OFFSET_KEYS: [&str; 3] = ["zone", "utc_offset", "offset"];
const ID_KEYS: [&str; 3] = ["tz_name1st", "time_zone", "id"];

#[derive(Debug)]
pub enum TimezoneDataError {
    GeoJson(GeoJsonError),
    MissingOffset { index: usize },
    InvalidOffset { index: usize, raw: String },
}

impl std::fmt::Display for TimezoneDataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimezoneDataError::GeoJson(e) => write!(f, "timezone boundaries: {e}"),
            TimezoneDataError::MissingOffset { index } => {
                write!(f, "timezone feature {index} has no offset property")
            }
            TimezoneDataError::InvalidOffset { index, raw } => {
                write!(f, "timezone feature {index} has invalid offset {raw}")
            }
        }
    }
}

impl std::error::Error for TimezoneDataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TimezoneDataError::GeoJson(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GeoJsonError> for TimezoneDataError {
    fn from(e: GeoJsonError) -> Self {
        TimezoneDataError::GeoJson(e)
    }
}

/// Parses boundary data and fingerprints the raw bytes.
///
/// Features with `null` geometry are skipped with a warning. A feature with
/// geometry but no usable offset fails the whole load.
pub fn parse_timezones(payload: &str) -> Result<TimezoneSet, TimezoneDataError> {
    let collection = FeatureCollection::from_geojson_str(payload)?;
    let mut polygons = Vec::with_capacity(collection.features.len());

    for (index, feature) in collection.features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            warn!(index, "timezone feature without geometry skipped");
            continue;
        };
        let offset = feature_offset(&feature.properties, index)?;
        let id = feature_id(&feature.properties)
            .or(feature.id)
            .unwrap_or_else(|| format!("zone-{index}"));
        polygons.push(TimezonePolygon::new(id, offset, geometry.into_polygons()));
    }

    info!(zones = polygons.len(), "timezone boundaries parsed");
    Ok(TimezoneSet::new(polygons, Some(fingerprint(payload.as_bytes()))))
}

fn feature_offset(
    props: &Map<String, Value>,
    index: usize,
) -> Result<UtcOffset, TimezoneDataError> {
    let raw = OFFSET_KEYS
        .iter()
        .find_map(|key| props.get(*key).filter(|v| !v.is_null()))
        .ok_or(TimezoneDataError::MissingOffset { index })?;
    let parsed = match raw {
        Value::Number(n) => n.as_f64().and_then(UtcOffset::from_hours_f64),
        Value::String(s) => parse_offset_text(s),
        _ => None,
    };
    parsed.ok_or_else(|| TimezoneDataError::InvalidOffset {
        index,
        raw: raw.to_string(),
    })
}

fn feature_id(props: &Map<String, Value>) -> Option<String> {
    ID_KEYS.iter().find_map(|key| match props.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Accepts `+05:45`, `-3`, `UTC+1`, `GMT-03:30`, `5.75`.
pub fn parse_offset_text(text: &str) -> Option<UtcOffset> {
    let mut s = text.trim();
    for prefix in ["UTC", "GMT", "utc", "gmt"] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest.trim_start();
            break;
        }
    }
    if s.is_empty() {
        return Some(UtcOffset::UTC);
    }

    let (sign, body) = match s.as_bytes()[0] {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => (1, s),
    };

    if let Some((h, m)) = body.split_once(':') {
        let hours: i32 = h.trim().parse().ok()?;
        let minutes: i32 = m.trim().parse().ok()?;
        if hours < 0 || !(0..60).contains(&minutes) {
            return None;
        }
        let total = hours.checked_mul(60)?.checked_add(minutes)?;
        if total > MAX_OFFSET_MINUTES {
            return None;
        }
        return Some(UtcOffset::from_minutes(sign * total));
    }

    let hours: f64 = body.trim().parse().ok()?;
    UtcOffset::from_hours_f64(f64::from(sign) * hours)
}

#[cfg(test)]
mod tests {
    use super::{TimezoneDataError, parse_offset_text, parse_timezones};
    use globe::timezone::{UtcOffset, offset_at, zone_at};
    use pretty_assertions::assert_eq;

    #[test]
    fn offset_text_forms() {
        assert_eq!(parse_offset_text("+05:45"), Some(UtcOffset::from_minutes(345)));
        assert_eq!(parse_offset_text("UTC-3"), Some(UtcOffset::from_hours(-3)));
        assert_eq!(parse_offset_text("GMT-03:30"), Some(UtcOffset::from_minutes(-210)));
        assert_eq!(parse_offset_text("5.75"), Some(UtcOffset::from_minutes(345)));
        assert_eq!(parse_offset_text("UTC"), Some(UtcOffset::UTC));
        assert_eq!(parse_offset_text("+5:75"), None);
        assert_eq!(parse_offset_text("east"), None);
    }

    #[test]
    fn colon_and_decimal_forms_share_the_offset_limit() {
        assert_eq!(parse_offset_text("14"), Some(UtcOffset::from_hours(14)));
        assert_eq!(parse_offset_text("+14:00"), Some(UtcOffset::from_hours(14)));
        assert_eq!(parse_offset_text("-14:00"), Some(UtcOffset::from_hours(-14)));
        assert_eq!(parse_offset_text("+15"), None);
        assert_eq!(parse_offset_text("15:00"), None);
        assert_eq!(parse_offset_text("+14:30"), None);
        assert_eq!(parse_offset_text("UTC-20"), None);

        let payload = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"zone":20},
             "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}}
        ]}"#;
        assert!(matches!(
            parse_timezones(payload),
            Err(TimezoneDataError::InvalidOffset { index: 0, .. })
        ));
    }

    #[test]
    fn fixture_resolves_known_points() {
        let payload = include_str!("../../tools/assets/timezones.geojson");
        let set = parse_timezones(payload).expect("timezones");
        assert!(!set.is_empty());
        assert_eq!(offset_at(set.polygons(), 10.0, 7.0), Some(UtcOffset::from_hours(1)));
        assert_eq!(offset_at(set.polygons(), 10.0, 50.0), None);

        let nepal = zone_at(set.polygons(), 28.0, 84.0).expect("nepal");
        assert_eq!(set.polygons()[nepal].id, "Asia/Kathmandu");
        assert_eq!(set.polygons()[nepal].offset, UtcOffset::from_minutes(345));
    }

    #[test]
    fn id_falls_back_through_properties_and_feature_id() {
        let payload = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","id":"f-1","properties":{"offset":"+2"},
             "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}},
            {"type":"Feature","properties":{"utc_offset":-1,"time_zone":"Atlantic/Azores"},
             "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}},
            {"type":"Feature","properties":{"zone":0},
             "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}},
            {"type":"Feature","properties":{"zone":3},"geometry":null}
        ]}"#;
        let set = parse_timezones(payload).expect("timezones");
        let ids: Vec<&str> = set.polygons().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["f-1", "Atlantic/Azores", "zone-2"]);
    }

    #[test]
    fn identical_payloads_share_a_fingerprint() {
        let payload = include_str!("../../tools/assets/timezones.geojson");
        let a = parse_timezones(payload).expect("a");
        let b = parse_timezones(payload).expect("b");
        assert!(a.same_source(&b));
    }

    #[test]
    fn missing_or_bad_offset_is_reported() {
        let payload = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"name":"x"},
             "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}}
        ]}"#;
        assert!(matches!(
            parse_timezones(payload),
            Err(TimezoneDataError::MissingOffset { index: 0 })
        ));
        let payload = payload.replace(r#""name":"x""#, r#""zone":"soon""#);
        assert!(matches!(
            parse_timezones(&payload),
            Err(TimezoneDataError::InvalidOffset { index: 0, .. })
        ));
    }
}
