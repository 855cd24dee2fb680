pub mod params;
pub mod source;
pub mod target;
pub mod utils;
