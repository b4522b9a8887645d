pub mod arc;
pub mod camera;
pub mod clock;
pub mod config;
pub mod culling;
pub mod curve;
pub mod engine;
pub mod ephemeris;
pub mod flight;
pub mod hover;
pub mod markers;
pub mod picking;
pub mod pool;
pub mod render;
pub mod timezone;

pub use config::EngineConfig;
pub use engine::*;
