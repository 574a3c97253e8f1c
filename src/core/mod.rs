pub mod config;
pub mod constants;
pub mod crs;
pub mod geo;
pub mod viewport;
