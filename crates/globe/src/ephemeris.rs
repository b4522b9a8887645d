//! Solar position and day/night shading.
//!
//! Declination uses the cosine approximation
//! `δ = -23.44° · cos(2π · (d + 10) / 365.2422)` on a continuous day count, so
//! it is smooth across year boundaries. The sun's hour angle at Greenwich is
//! `(h - 12) · 15°` for the UTC hour fraction `h`; the subsolar longitude is
//! its negation.

use core::f64::consts::{PI, TAU};

use chrono::{DateTime, Timelike, Utc};
use foundation::math::{GeoPoint, Vec3, to_surface};

pub const OBLIQUITY_DEG: f64 = 23.44;
pub const TROPICAL_YEAR_DAYS: f64 = 365.2422;

/// 2000-01-01T12:00:00Z.
const J2000_UNIX_S: f64 = 946_728_000.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SolarState {
    pub declination_rad: f64,
    /// Geographic longitude of the subsolar point, in (-π, π].
    ///
    /// This is the negated Greenwich hour angle: the sun moves west as UTC
    /// advances, so at 18:00 UTC it stands over 90° W, not 90° E. Feeding
    /// the unnegated `(h - 12) · 15°` here mirrors day and night across the
    /// prime meridian.
    pub subsolar_longitude_rad: f64,
    /// `(h - 12) · 15°` in radians, in [-π, π).
    pub greenwich_hour_angle_rad: f64,
}

impl SolarState {
    pub fn at(instant: DateTime<Utc>) -> Self {
        let gha = greenwich_hour_angle_rad(instant);
        Self {
            declination_rad: declination_rad(instant),
            subsolar_longitude_rad: wrap_pi(-gha),
            greenwich_hour_angle_rad: gha,
        }
    }

    pub fn subsolar_point(&self) -> GeoPoint {
        GeoPoint::new(
            self.declination_rad.to_degrees(),
            self.subsolar_longitude_rad.to_degrees(),
        )
    }

    /// Unit vector from the globe centre toward the sun.
    pub fn sun_direction(&self) -> Vec3 {
        let p = self.subsolar_point();
        to_surface(p.lat_deg, p.lon_deg, 1.0)
    }
}

/// Directional light placement.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SunLight {
    pub position: Vec3,
    /// Unit vector from the light toward the globe centre.
    pub direction: Vec3,
}

impl SunLight {
    pub fn place(state: &SolarState, distance: f64) -> Self {
        let toward_sun = state.sun_direction();
        Self {
            position: toward_sun * distance,
            direction: -toward_sun,
        }
    }
}

/// Days since J2000 shifted so that 0.0 is 2000-01-01T00:00Z.
pub fn day_count(instant: DateTime<Utc>) -> f64 {
    let unix_s = instant.timestamp() as f64 + f64::from(instant.timestamp_subsec_nanos()) * 1e-9;
    (unix_s - J2000_UNIX_S) / SECONDS_PER_DAY + 0.5
}

pub fn declination_rad(instant: DateTime<Utc>) -> f64 {
    let d = day_count(instant);
    let angle = TAU * (d + 10.0) / TROPICAL_YEAR_DAYS;
    -OBLIQUITY_DEG.to_radians() * angle.cos()
}

/// UTC hour of day in [0, 24).
pub fn utc_hour_fraction(instant: DateTime<Utc>) -> f64 {
    let secs = f64::from(instant.num_seconds_from_midnight());
    // Leap-second nanos can exceed 1e9; cap so the hour stays below 24.
    let nanos = f64::from(instant.nanosecond().min(999_999_999));
    (secs + nanos * 1e-9) / 3600.0
}

pub fn greenwich_hour_angle_rad(instant: DateTime<Utc>) -> f64 {
    ((utc_hour_fraction(instant) - 12.0) * 15.0).to_radians()
}

fn wrap_pi(rad: f64) -> f64 {
    let wrapped = (rad + PI).rem_euclid(TAU) - PI;
    if wrapped == -PI { PI } else { wrapped }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ShadingBand {
    Day,
    CivilTwilight,
    NauticalTwilight,
    AstronomicalTwilight,
    Night,
}

/// Independent toggles for day/night shading.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ShadingToggles {
    /// Off means constant full daylight.
    pub terminator: bool,
    /// Off means a hard day/night step at 90°.
    pub twilight: bool,
}

impl Default for ShadingToggles {
    fn default() -> Self {
        Self {
            terminator: true,
            twilight: true,
        }
    }
}

/// Band edges in degrees from the subsolar direction and the light level at each edge.
const BAND_EDGES: [(f64, f64); 4] = [(90.0, 1.0), (96.0, 0.6), (102.0, 0.3), (108.0, 0.0)];

/// Angle (degrees) between a surface normal and the sun direction.
pub fn sun_angle_deg(normal: Vec3, sun_direction: Vec3) -> f64 {
    match (normal.normalize(), sun_direction.normalize()) {
        (Some(n), Some(s)) => n.dot(s).clamp(-1.0, 1.0).acos().to_degrees(),
        _ => 180.0,
    }
}

pub fn band(angle_deg: f64) -> ShadingBand {
    if angle_deg < 90.0 {
        ShadingBand::Day
    } else if angle_deg < 96.0 {
        ShadingBand::CivilTwilight
    } else if angle_deg < 102.0 {
        ShadingBand::NauticalTwilight
    } else if angle_deg < 108.0 {
        ShadingBand::AstronomicalTwilight
    } else {
        ShadingBand::Night
    }
}

/// Light level in [0, 1] for a point `angle_deg` away from the subsolar point.
pub fn daylight(angle_deg: f64, toggles: ShadingToggles) -> f64 {
    if !toggles.terminator {
        return 1.0;
    }
    if !toggles.twilight {
        return if angle_deg < 90.0 { 1.0 } else { 0.0 };
    }
    if angle_deg < BAND_EDGES[0].0 {
        return 1.0;
    }
    for pair in BAND_EDGES.windows(2) {
        let (a0, l0) = pair[0];
        let (a1, l1) = pair[1];
        if angle_deg < a1 {
            let t = (angle_deg - a0) / (a1 - a0);
            return l0 + (l1 - l0) * t;
        }
    }
    0.0
}

#[cfg(test)]
mod tests {
    use super::{
        ShadingBand, ShadingToggles, SolarState, SunLight, band, day_count, daylight,
        declination_rad, sun_angle_deg,
    };
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use foundation::math::Vec3;
    use proptest::prelude::*;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).single().expect("valid date")
    }

    #[test]
    fn day_count_starts_at_midnight_j2000() {
        assert_close(day_count(utc(2000, 1, 1, 0, 0)), 0.0, 1e-9);
        assert_close(day_count(utc(2000, 1, 2, 12, 0)), 1.5, 1e-9);
    }

    #[test]
    fn solstices_reach_extreme_declination() {
        let june = declination_rad(utc(2024, 6, 21, 12, 0)).to_degrees();
        let december = declination_rad(utc(2024, 12, 21, 12, 0)).to_degrees();
        assert!(june > 23.0, "june declination {june}");
        assert!(december < -23.0, "december declination {december}");
    }

    #[test]
    fn noon_utc_puts_sun_over_greenwich() {
        let s = SolarState::at(utc(2024, 3, 20, 12, 0));
        assert_close(s.subsolar_longitude_rad, 0.0, 1e-12);
        assert_close(s.greenwich_hour_angle_rad, 0.0, 1e-12);
    }

    #[test]
    fn evening_utc_puts_sun_over_americas() {
        let s = SolarState::at(utc(2024, 3, 20, 18, 0));
        assert_close(s.greenwich_hour_angle_rad.to_degrees(), 90.0, 1e-9);
        assert_close(s.subsolar_longitude_rad.to_degrees(), -90.0, 1e-9);
        let p = s.subsolar_point();
        assert_close(p.lon_deg, -90.0, 1e-9);
    }

    #[test]
    fn morning_utc_puts_sun_over_asia() {
        let s = SolarState::at(utc(2024, 3, 20, 6, 0));
        assert_close(s.greenwich_hour_angle_rad.to_degrees(), -90.0, 1e-9);
        assert_close(s.subsolar_point().lon_deg, 90.0, 1e-9);
    }

    #[test]
    fn midnight_wraps_to_antimeridian() {
        let s = SolarState::at(utc(2024, 3, 20, 0, 0));
        assert_close(s.subsolar_longitude_rad, core::f64::consts::PI, 1e-12);
    }

    #[test]
    fn light_points_at_globe_centre() {
        let s = SolarState::at(utc(2024, 8, 1, 7, 30));
        let light = SunLight::place(&s, 5.0);
        assert_close(light.position.length(), 5.0, 1e-9);
        let toward_centre = (-light.position).normalize().expect("non-zero");
        assert_close(toward_centre.dot(light.direction), 1.0, 1e-12);
        assert_close(s.sun_direction().length(), 1.0, 1e-12);
    }

    #[test]
    fn bands_follow_twilight_boundaries() {
        assert_eq!(band(45.0), ShadingBand::Day);
        assert_eq!(band(90.0), ShadingBand::CivilTwilight);
        assert_eq!(band(97.0), ShadingBand::NauticalTwilight);
        assert_eq!(band(107.9), ShadingBand::AstronomicalTwilight);
        assert_eq!(band(108.0), ShadingBand::Night);
    }

    #[test]
    fn daylight_blends_through_twilight() {
        let on = ShadingToggles::default();
        assert_eq!(daylight(10.0, on), 1.0);
        assert_close(daylight(93.0, on), 0.8, 1e-12);
        assert_close(daylight(99.0, on), 0.45, 1e-12);
        assert_close(daylight(105.0, on), 0.15, 1e-12);
        assert_eq!(daylight(120.0, on), 0.0);
    }

    #[test]
    fn toggles_force_daylight_or_hard_edge() {
        let no_terminator = ShadingToggles {
            terminator: false,
            twilight: true,
        };
        assert_eq!(daylight(170.0, no_terminator), 1.0);

        let hard = ShadingToggles {
            terminator: true,
            twilight: false,
        };
        assert_eq!(daylight(89.9, hard), 1.0);
        assert_eq!(daylight(90.1, hard), 0.0);
    }

    #[test]
    fn sun_angle_of_opposite_vectors() {
        assert_close(sun_angle_deg(Vec3::X, -Vec3::X), 180.0, 1e-9);
        assert_close(sun_angle_deg(Vec3::X, Vec3::Y), 90.0, 1e-9);
        assert_eq!(sun_angle_deg(Vec3::ZERO, Vec3::Y), 180.0);
    }

    proptest! {
        #[test]
        fn subsolar_longitude_repeats_daily(secs in 0i64..2_000_000_000) {
            let t = Utc.timestamp_opt(secs, 0).single().expect("valid");
            let a = SolarState::at(t).subsolar_longitude_rad.to_degrees();
            let b = SolarState::at(t + Duration::hours(24)).subsolar_longitude_rad.to_degrees();
            let d = (a - b).rem_euclid(360.0);
            prop_assert!(d.min(360.0 - d) < 1e-9);
        }

        #[test]
        fn declination_is_bounded_and_continuous(secs in 0i64..2_000_000_000) {
            let t = Utc.timestamp_opt(secs, 0).single().expect("valid");
            let a = declination_rad(t).to_degrees();
            let b = declination_rad(t + Duration::hours(1)).to_degrees();
            prop_assert!(a.abs() <= 23.44 + 1e-9);
            // Maximum slope is about 0.4°/day.
            prop_assert!((a - b).abs() < 0.02);
        }
    }
}
