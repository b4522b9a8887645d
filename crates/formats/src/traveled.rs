use globe::arc::TraveledCities;
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
struct TraveledRecord {
    home: String,
    #[serde(default)]
    visited: Vec<String>,
}

#[derive(Debug)]
pub enum TraveledDataError {
    Json(serde_json::Error),
    MissingHome,
}

impl std::fmt::Display for TraveledDataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TraveledDataError::Json(e) => write!(f, "traveled list is not valid JSON: {e}"),
            TraveledDataError::MissingHome => write!(f, "traveled list has an empty home city"),
        }
    }
}

impl std::error::Error for TraveledDataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TraveledDataError::Json(e) => Some(e),
            TraveledDataError::MissingHome => None,
        }
    }
}

/// Parses `{home, visited: [names]}`.
///
/// Blank entries and repeats of the home city are dropped; order is kept so
/// arc stagger follows the file.
pub fn parse_traveled(payload: &str) -> Result<TraveledCities, TraveledDataError> {
    let record: TraveledRecord =
        serde_json::from_str(payload).map_err(TraveledDataError::Json)?;
    let home = record.home.trim().to_string();
    if home.is_empty() {
        return Err(TraveledDataError::MissingHome);
    }

    let mut visited = Vec::with_capacity(record.visited.len());
    for name in record.visited {
        let name = name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case(&home) {
            warn!(entry = name, "ignoring traveled entry");
            continue;
        }
        visited.push(name.to_string());
    }
    info!(home = %home, visited = visited.len(), "traveled list parsed");
    Ok(TraveledCities { home, visited })
}

#[cfg(test)]
mod tests {
    use super::{TraveledDataError, parse_traveled};
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_fixture() {
        let payload = include_str!("../../tools/assets/traveled.json");
        let traveled = parse_traveled(payload).expect("traveled");
        assert_eq!(traveled.home, "Paris");
        assert_eq!(traveled.visited.first().map(String::as_str), Some("Tokyo"));
    }

    #[test]
    fn drops_blank_and_home_entries() {
        let traveled =
            parse_traveled(r#"{"home":"Lima","visited":["Quito"," ","lima","Bogota"]}"#)
                .expect("traveled");
        assert_eq!(traveled.visited, vec!["Quito".to_string(), "Bogota".to_string()]);
    }

    #[test]
    fn empty_home_is_rejected() {
        assert!(matches!(
            parse_traveled(r#"{"home":"  ","visited":[]}"#),
            Err(TraveledDataError::MissingHome)
        ));
        assert!(matches!(parse_traveled("nope"), Err(TraveledDataError::Json(_))));
    }
}
