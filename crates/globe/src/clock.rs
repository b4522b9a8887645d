//! Simulated calendar clock shown on the globe.
//!
//! Engine ticks advance it by `dt · speed` while playing. It can be paused,
//! scrubbed to a day of the year, or snapped back to wall-clock time.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct SimClock {
    instant: DateTime<Utc>,
    playing: bool,
    speed: f64,
    realtime: bool,
}

impl SimClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            instant: start,
            playing: true,
            speed: 1.0,
            realtime: false,
        }
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// True after a sync until the clock is scrubbed or sped up.
    pub fn is_realtime(&self) -> bool {
        self.realtime
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
        self.realtime = false;
    }

    /// Simulated seconds per real second. Non-finite values are ignored.
    pub fn set_speed(&mut self, speed: f64) {
        if !speed.is_finite() {
            return;
        }
        self.speed = speed;
        if speed != 1.0 {
            self.realtime = false;
        }
    }

    /// Jump to `now`, play at 1x and follow real time.
    pub fn sync_to(&mut self, now: DateTime<Utc>) {
        self.instant = now;
        self.speed = 1.0;
        self.playing = true;
        self.realtime = true;
    }

    /// Moves to `day` (1-based, clamped to the year) keeping the year and time of day.
    pub fn scrub_to_day_of_year(&mut self, day: u32) {
        let year = self.instant.year();
        let last = if NaiveDate::from_ymd_opt(year, 2, 29).is_some() { 366 } else { 365 };
        let Some(date) = NaiveDate::from_yo_opt(year, day.clamp(1, last)) else {
            return;
        };
        self.instant = Utc.from_utc_datetime(&date.and_time(self.instant.time()));
        self.realtime = false;
    }

    pub fn day_of_year(&self) -> u32 {
        self.instant.ordinal()
    }

    pub fn advance(&mut self, dt_s: f64) {
        if !self.playing || dt_s <= 0.0 {
            return;
        }
        let nanos = (dt_s * self.speed * 1e9).round();
        if !nanos.is_finite() {
            return;
        }
        if let Some(next) = self
            .instant
            .checked_add_signed(Duration::nanoseconds(nanos as i64))
        {
            self.instant = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SimClock;
    use chrono::{DateTime, TimeZone, Timelike, Utc};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 6, 30, 0).single().expect("valid")
    }

    #[test]
    fn advances_only_while_playing() {
        let mut clock = SimClock::new(start());
        clock.set_speed(3600.0);
        clock.advance(1.0);
        assert_eq!(clock.instant().hour(), 7);

        clock.pause();
        clock.advance(10.0);
        assert_eq!(clock.instant().hour(), 7);
        clock.play();
        clock.advance(0.5);
        assert_eq!(clock.instant().minute(), 0);
        assert_eq!(clock.instant().hour(), 8);
    }

    #[test]
    fn scrub_keeps_time_of_day_and_clamps() {
        let mut clock = SimClock::new(start());
        clock.scrub_to_day_of_year(172);
        assert_eq!(clock.day_of_year(), 172);
        assert_eq!(clock.instant().hour(), 6);
        assert_eq!(clock.instant().minute(), 30);

        clock.scrub_to_day_of_year(999);
        assert_eq!(clock.day_of_year(), 366);
        clock.scrub_to_day_of_year(0);
        assert_eq!(clock.day_of_year(), 1);
    }

    #[test]
    fn sync_follows_real_time_until_changed() {
        let mut clock = SimClock::new(start());
        clock.pause();
        clock.set_speed(100.0);
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().expect("valid");
        clock.sync_to(now);
        assert!(clock.is_realtime());
        assert!(clock.is_playing());
        assert_eq!(clock.speed(), 1.0);
        assert_eq!(clock.instant(), now);

        clock.scrub_to_day_of_year(10);
        assert!(!clock.is_realtime());
    }

    #[test]
    fn ignores_non_finite_speed() {
        let mut clock = SimClock::new(start());
        clock.set_speed(f64::NAN);
        assert_eq!(clock.speed(), 1.0);
    }
}
