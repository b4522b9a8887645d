use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use globe::ephemeris::{ShadingBand, SolarState, band, sun_angle_deg};
use globe::markers::CityClass;
use globe::timezone::{hover_zone_at, zone_at};
use globe::{EngineConfig, GlobeEngine};
use tools::{AsciiRasterizer, DataPaths, data, load_into};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "journey-globe")]
#[command(version = "0.1.0")]
#[command(
    about = "Headless travel-journal globe: sunlight, timezones, arcs and flights",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the engine for a number of frames and print the globe as text
    Run {
        /// Directory holding cities.json, traveled.json and timezones.geojson
        #[arg(short, long, default_value = "crates/tools/assets")]
        data: PathBuf,

        /// Engine config (JSON); missing sections use defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Frames to simulate
        #[arg(short, long, default_value = "90")]
        frames: u32,

        /// Seconds per frame
        #[arg(long, default_value = "0.0333")]
        dt: f64,

        /// Print every Nth frame (0 prints only the last one)
        #[arg(long, default_value = "0")]
        every: u32,

        #[arg(long, default_value = "80")]
        width: usize,

        #[arg(long, default_value = "36")]
        height: usize,

        /// Simulated start instant (RFC 3339); defaults to now
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<Utc>>,

        /// Simulated seconds per real second
        #[arg(long)]
        speed: Option<f64>,

        /// Scrub to a day of the year (1-366) keeping the time of day
        #[arg(long)]
        day: Option<u32>,

        /// Start a flight between two city names
        #[arg(long, num_args = 2, value_names = ["FROM", "TO"])]
        flight: Vec<String>,

        /// Highlight the zones at this slider index of the UTC offset table
        #[arg(long)]
        offset_index: Option<usize>,

        /// Hide a marker class (capital, global, major); repeatable
        #[arg(long)]
        hide: Vec<String>,

        #[arg(long)]
        no_terminator: bool,

        #[arg(long)]
        no_twilight: bool,
    },

    /// Report the timezone at a coordinate
    Zone {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        #[arg(short, long, default_value = "crates/tools/assets/timezones.geojson")]
        timezones: PathBuf,
    },

    /// Print the solar state for an instant
    Sun {
        /// RFC 3339 instant; defaults to now
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<Utc>>,

        /// Also report the shading band at this coordinate
        #[arg(long, num_args = 2, value_names = ["LAT", "LON"], allow_negative_numbers = true)]
        point: Vec<f64>,
    },
}

fn parse_instant(text: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected RFC 3339 instant: {e}"))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    match Cli::parse().command {
        Commands::Run {
            data,
            config,
            frames,
            dt,
            every,
            width,
            height,
            at,
            speed,
            day,
            flight,
            offset_index,
            hide,
            no_terminator,
            no_twilight,
        } => {
            let config = match config {
                Some(path) => {
                    let text =
                        fs::read_to_string(&path).map_err(|e| format!("read {path:?}: {e}"))?;
                    EngineConfig::from_json_str(&text).map_err(|e| format!("{path:?}: {e}"))?
                }
                None => EngineConfig::default(),
            };

            let mut engine = GlobeEngine::new(config, at.unwrap_or_else(Utc::now))
                .map_err(|e| e.to_string())?;
            load_into(&mut engine, &DataPaths::in_dir(&data));

            if let Some(speed) = speed {
                engine.set_time_speed(speed);
            }
            if let Some(day) = day {
                engine.scrub_to_day_of_year(day);
            }
            engine.set_terminator(!no_terminator);
            engine.set_twilight(!no_twilight);
            for name in &hide {
                let class = CityClass::parse(name).ok_or_else(|| format!("unknown class {name}"))?;
                engine.set_marker_class_visible(class, false);
            }
            if offset_index.is_some() {
                engine.set_timezone_overlay(true);
                engine.set_utc_offset_index(offset_index);
            }
            if let [from, to] = flight.as_slice() {
                let outcome = engine.trigger_flight_between(from, to, |outcome| {
                    info!(?outcome, "flight trigger");
                });
                if let globe::flight::FlightOutcome::Rejected(reason) = outcome {
                    warn!(%reason, "flight not started");
                }
            }

            let mut ascii = AsciiRasterizer::new(width, height);
            for i in 1..=frames.max(1) {
                engine.tick(dt, &mut ascii);
                if every > 0 && i % every == 0 && i != frames {
                    println!("frame {i}\n{}", ascii.render_to_string());
                }
            }

            println!("{}", ascii.render_to_string());
            println!("simulated {}", engine.simulated_instant().to_rfc3339());
            let snapshot = engine.metrics().snapshot();
            for (name, value) in snapshot.counters {
                println!("{name} = {value}");
            }
            for (name, value) in snapshot.gauges {
                println!("{name} = {value}");
            }
            for (name, hist) in snapshot.histograms {
                if let Some(mean) = hist.mean() {
                    println!("{name} = mean {mean:.1} min {} max {}", hist.min, hist.max);
                }
            }
            Ok(())
        }

        Commands::Zone {
            lat,
            lon,
            timezones,
        } => {
            let set = data::load_timezones(&timezones).map_err(|e| e.to_string())?;
            let polygons = set.polygons();
            match zone_at(polygons, lat, lon) {
                Some(i) => {
                    let zone = &polygons[i];
                    let hoverable = hover_zone_at(polygons, lat, lon).is_some();
                    println!("{} {} (hoverable: {hoverable})", zone.id, zone.offset);
                }
                None => println!("no zone at ({lat}, {lon})"),
            }
            Ok(())
        }

        Commands::Sun { at, point } => {
            let instant = at.unwrap_or_else(Utc::now);
            let solar = SolarState::at(instant);
            let sub = solar.subsolar_point();
            println!("instant        {}", instant.to_rfc3339());
            println!("declination    {:.3} deg", solar.declination_rad.to_degrees());
            println!("hour angle     {:.3} deg", solar.greenwich_hour_angle_rad.to_degrees());
            println!("subsolar point ({:.3}, {:.3})", sub.lat_deg, sub.lon_deg);

            if let [lat, lon] = point.as_slice() {
                let normal = foundation::math::to_surface(*lat, *lon, 1.0);
                let angle = sun_angle_deg(normal, solar.sun_direction());
                let label = match band(angle) {
                    ShadingBand::Day => "day",
                    ShadingBand::CivilTwilight => "civil twilight",
                    ShadingBand::NauticalTwilight => "nautical twilight",
                    ShadingBand::AstronomicalTwilight => "astronomical twilight",
                    ShadingBand::Night => "night",
                };
                println!("({lat}, {lon}) sun angle {angle:.2} deg: {label}");
            }
            Ok(())
        }
    }
}
