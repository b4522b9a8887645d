//! Timezone membership over boundary polygons.
//!
//! Polygons are tested with the even-odd rule in plain (lon, lat) space. A
//! point inside a hole crosses two rings and therefore counts as outside.

use foundation::math::GeoPoint;

/// A UTC offset in whole minutes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UtcOffset(i32);

/// Real-world offsets in ascending order, backing the offset slider.
pub const UTC_OFFSETS: [UtcOffset; 38] = [
    UtcOffset(-720),
    UtcOffset(-660),
    UtcOffset(-600),
    UtcOffset(-570),
    UtcOffset(-540),
    UtcOffset(-480),
    UtcOffset(-420),
    UtcOffset(-360),
    UtcOffset(-300),
    UtcOffset(-240),
    UtcOffset(-210),
    UtcOffset(-180),
    UtcOffset(-120),
    UtcOffset(-60),
    UtcOffset(0),
    UtcOffset(60),
    UtcOffset(120),
    UtcOffset(180),
    UtcOffset(210),
    UtcOffset(240),
    UtcOffset(270),
    UtcOffset(300),
    UtcOffset(330),
    UtcOffset(345),
    UtcOffset(360),
    UtcOffset(390),
    UtcOffset(420),
    UtcOffset(480),
    UtcOffset(525),
    UtcOffset(540),
    UtcOffset(570),
    UtcOffset(600),
    UtcOffset(630),
    UtcOffset(660),
    UtcOffset(720),
    UtcOffset(765),
    UtcOffset(780),
    UtcOffset(840),
];

/// Largest civil offset magnitude, UTC+14 (Line Islands).
pub const MAX_OFFSET_MINUTES: i32 = 14 * 60;

impl UtcOffset {
    pub const UTC: Self = Self(0);

    pub const fn from_minutes(minutes: i32) -> Self {
        Self(minutes)
    }

    pub const fn from_hours(hours: i32) -> Self {
        Self(hours * 60)
    }

    /// Fractional hours, rounded to the nearest minute. Non-finite input and
    /// magnitudes beyond [`MAX_OFFSET_MINUTES`] are rejected.
    pub fn from_hours_f64(hours: f64) -> Option<Self> {
        if !hours.is_finite() {
            return None;
        }
        let minutes = (hours * 60.0).round();
        if minutes.abs() > f64::from(MAX_OFFSET_MINUTES) {
            return None;
        }
        Some(Self(minutes as i32))
    }

    pub const fn minutes(self) -> i32 {
        self.0
    }

    pub fn hours_f64(self) -> f64 {
        f64::from(self.0) / 60.0
    }

    /// Slider lookup; out-of-range indices clamp to the table ends.
    pub fn from_index(index: usize) -> Self {
        UTC_OFFSETS[index.min(UTC_OFFSETS.len() - 1)]
    }

    pub fn index(self) -> Option<usize> {
        UTC_OFFSETS.binary_search(&self).ok()
    }
}

impl std::fmt::Display for UtcOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { '-' } else { '+' };
        let abs = self.0.unsigned_abs();
        write!(f, "UTC{sign}{:02}:{:02}", abs / 60, abs % 60)
    }
}

pub type Ring = Vec<GeoPoint>;

#[derive(Debug, Copy, Clone, PartialEq)]
struct GeoBounds {
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
}

impl GeoBounds {
    const EMPTY: Self = Self {
        min_lat: f64::INFINITY,
        max_lat: f64::NEG_INFINITY,
        min_lon: f64::INFINITY,
        max_lon: f64::NEG_INFINITY,
    };

    fn include(&mut self, p: GeoPoint) {
        self.min_lat = self.min_lat.min(p.lat_deg);
        self.max_lat = self.max_lat.max(p.lat_deg);
        self.min_lon = self.min_lon.min(p.lon_deg);
        self.max_lon = self.max_lon.max(p.lon_deg);
    }

    fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

/// One timezone: a multipolygon tagged with an offset.
///
/// Each entry of `polygons` is a list of rings; the first ring is the outer
/// boundary and the rest are holes.
#[derive(Debug, Clone, PartialEq)]
pub struct TimezonePolygon {
    pub id: String,
    pub offset: UtcOffset,
    pub polygons: Vec<Vec<Ring>>,
    bounds: GeoBounds,
}

impl TimezonePolygon {
    pub fn new(id: impl Into<String>, offset: UtcOffset, polygons: Vec<Vec<Ring>>) -> Self {
        let mut bounds = GeoBounds::EMPTY;
        for ring in polygons.iter().flat_map(|rings| rings.first()) {
            for p in ring {
                bounds.include(*p);
            }
        }
        Self {
            id: id.into(),
            offset,
            polygons,
            bounds,
        }
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        if !self.bounds.contains(lat, lon) {
            return false;
        }
        self.polygons.iter().any(|rings| {
            rings
                .iter()
                .filter(|ring| ring_contains(ring, lat, lon))
                .count()
                % 2
                == 1
        })
    }

    /// Pure-ocean or `Etc/*` zones carry no place name worth hovering.
    pub fn is_ocean_or_etc(&self) -> bool {
        let id = self.id.as_str();
        id.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("etc/"))
            || id.to_ascii_lowercase().contains("ocean")
    }
}

/// Even-odd crossing test with longitude as x and latitude as y.
fn ring_contains(ring: &[GeoPoint], lat: f64, lon: f64) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (ring[i].lon_deg, ring[i].lat_deg);
        let (xj, yj) = (ring[j].lon_deg, ring[j].lat_deg);
        if (yi > lat) != (yj > lat) {
            let x_cross = xj + (lat - yj) * (xi - xj) / (yi - yj);
            if lon < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Index of the first polygon containing the point.
pub fn zone_at(polygons: &[TimezonePolygon], lat: f64, lon: f64) -> Option<usize> {
    polygons.iter().position(|p| p.contains(lat, lon))
}

pub fn offset_at(polygons: &[TimezonePolygon], lat: f64, lon: f64) -> Option<UtcOffset> {
    zone_at(polygons, lat, lon).map(|i| polygons[i].offset)
}

/// Like [`zone_at`] but skips ocean and `Etc` zones.
pub fn hover_zone_at(polygons: &[TimezonePolygon], lat: f64, lon: f64) -> Option<usize> {
    polygons
        .iter()
        .position(|p| !p.is_ocean_or_etc() && p.contains(lat, lon))
}

/// Every zone sharing `offset`, with its index.
pub fn select_by_offset(
    polygons: &[TimezonePolygon],
    offset: UtcOffset,
) -> impl Iterator<Item = (usize, &TimezonePolygon)> + '_ {
    polygons
        .iter()
        .enumerate()
        .filter(move |(_, p)| p.offset == offset)
}

/// Loaded boundary data plus the fingerprint of the blob it came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimezoneSet {
    polygons: Vec<TimezonePolygon>,
    fingerprint: Option<[u8; 32]>,
}

impl TimezoneSet {
    pub fn new(polygons: Vec<TimezonePolygon>, fingerprint: Option<[u8; 32]>) -> Self {
        Self {
            polygons,
            fingerprint,
        }
    }

    pub fn polygons(&self) -> &[TimezonePolygon] {
        &self.polygons
    }

    pub fn fingerprint(&self) -> Option<[u8; 32]> {
        self.fingerprint
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    /// True when both sets carry the same known fingerprint.
    pub fn same_source(&self, other: &TimezoneSet) -> bool {
        matches!((self.fingerprint, other.fingerprint), (Some(a), Some(b)) if a == b)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        TimezonePolygon, TimezoneSet, UTC_OFFSETS, UtcOffset, hover_zone_at, offset_at,
        select_by_offset, zone_at,
    };
    use foundation::math::GeoPoint;

    fn rect(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(min_lat, min_lon),
            GeoPoint::new(min_lat, max_lon),
            GeoPoint::new(max_lat, max_lon),
            GeoPoint::new(max_lat, min_lon),
            GeoPoint::new(min_lat, min_lon),
        ]
    }

    fn zone(id: &str, hours: i32, rings: Vec<Vec<GeoPoint>>) -> TimezonePolygon {
        TimezonePolygon::new(id, UtcOffset::from_hours(hours), vec![rings])
    }

    #[test]
    fn offset_at_finds_containing_band() {
        let polys = vec![zone("Europe/Paris", 1, vec![rect(0.0, -90.0, 15.0, 90.0)])];
        assert_eq!(offset_at(&polys, 10.0, 7.0), Some(UtcOffset::from_hours(1)));
        assert_eq!(offset_at(&polys, 10.0, 50.0), None);
    }

    #[test]
    fn holes_are_excluded() {
        let polys = vec![zone(
            "Africa/Johannesburg",
            2,
            vec![rect(0.0, 0.0, 10.0, 10.0), rect(4.0, 4.0, 6.0, 6.0)],
        )];
        assert!(polys[0].contains(2.0, 2.0));
        assert!(!polys[0].contains(5.0, 5.0));
    }

    #[test]
    fn first_containing_polygon_wins() {
        let polys = vec![
            zone("A", 3, vec![rect(0.0, 0.0, 10.0, 10.0)]),
            zone("B", 4, vec![rect(0.0, 0.0, 20.0, 20.0)]),
        ];
        assert_eq!(zone_at(&polys, 5.0, 5.0), Some(0));
        assert_eq!(offset_at(&polys, 15.0, 15.0), Some(UtcOffset::from_hours(4)));
    }

    #[test]
    fn hover_skips_ocean_and_etc_zones() {
        let polys = vec![
            zone("Etc/GMT-1", 1, vec![rect(0.0, 0.0, 10.0, 10.0)]),
            zone("Atlantic Ocean", 0, vec![rect(0.0, 0.0, 10.0, 10.0)]),
            zone("Europe/Berlin", 1, vec![rect(0.0, 0.0, 10.0, 10.0)]),
        ];
        assert_eq!(zone_at(&polys, 5.0, 5.0), Some(0));
        assert_eq!(hover_zone_at(&polys, 5.0, 5.0), Some(2));
    }

    #[test]
    fn select_by_offset_filters_in_order() {
        let polys = vec![
            zone("A", 1, vec![rect(0.0, 0.0, 1.0, 1.0)]),
            zone("B", 2, vec![rect(0.0, 0.0, 1.0, 1.0)]),
            zone("C", 1, vec![rect(0.0, 0.0, 1.0, 1.0)]),
        ];
        let ids: Vec<&str> = select_by_offset(&polys, UtcOffset::from_hours(1))
            .map(|(_, p)| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["A", "C"]);
    }

    #[test]
    fn degenerate_rings_contain_nothing() {
        let polys = vec![zone(
            "X",
            0,
            vec![vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0)]],
        )];
        assert_eq!(offset_at(&polys, 0.5, 0.5), None);
        assert_eq!(offset_at(&[], 0.5, 0.5), None);
    }

    #[test]
    fn offset_formatting_and_slider_table() {
        assert_eq!(UtcOffset::from_minutes(345).to_string(), "UTC+05:45");
        assert_eq!(UtcOffset::from_minutes(-210).to_string(), "UTC-03:30");
        assert_eq!(UtcOffset::UTC.to_string(), "UTC+00:00");

        assert!(UTC_OFFSETS.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(UtcOffset::from_index(0), UtcOffset::from_hours(-12));
        assert_eq!(UtcOffset::from_index(999), UtcOffset::from_hours(14));
        assert_eq!(UtcOffset::from_hours(1).index(), Some(15));
        assert_eq!(UtcOffset::from_minutes(7).index(), None);
        assert_eq!(UtcOffset::from_hours_f64(5.75), Some(UtcOffset::from_minutes(345)));
        assert_eq!(UtcOffset::from_hours_f64(f64::NAN), None);
        assert_eq!(UtcOffset::from_hours_f64(14.0), Some(UtcOffset::from_hours(14)));
        assert_eq!(UtcOffset::from_hours_f64(-14.0), Some(UtcOffset::from_hours(-14)));
        assert_eq!(UtcOffset::from_hours_f64(14.5), None);
    }

    #[test]
    fn sets_compare_by_fingerprint() {
        let a = TimezoneSet::new(Vec::new(), Some([1; 32]));
        let b = TimezoneSet::new(Vec::new(), Some([1; 32]));
        let c = TimezoneSet::new(Vec::new(), None);
        assert!(a.same_source(&b));
        assert!(!a.same_source(&c));
        assert!(!c.same_source(&c.clone()));
    }
}
