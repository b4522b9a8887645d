pub mod ascii;
pub mod data;

pub use ascii::AsciiRasterizer;
pub use data::{DataError, DataPaths, LoadReport, load_into};
