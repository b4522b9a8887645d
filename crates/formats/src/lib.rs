pub mod cities;
pub mod fingerprint;
pub mod geojson;
pub mod timezones;
pub mod traveled;

pub use cities::*;
pub use fingerprint::*;
pub use geojson::*;
pub use timezones::*;
pub use traveled::*;
