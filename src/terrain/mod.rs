//! Terrain generation module.
//!
//! Smooths a noise field into elevations, classifies each pixel of a
//! circular planet against a starfield, and removes isolated pixels.

mod config;
mod generate;
mod pixel;
mod smoothing;

pub use config::{planet_radius, TerrainConfig};
pub use generate::{
    classify, cleanup_isolated_pixels, cleanup_pass, generate_map, generate_map_file,
    land_green, on_planet, TerrainError, CLEANUP_PASSES,
};
pub use pixel::{Pixel, PixelBuffer, PixelClass, CLOUD_MARKER, OCEAN_BLUE};
pub use smoothing::neighborhood_elevation;
