//! Planet classification and isolated pixel cleanup.

use std::path::Path;

use rand::Rng;
use thiserror::Error;

use crate::export::{export_bitmap, BitmapError, BitmapOptions};
use crate::noise::{NoiseError, NoiseField};
use super::config::{planet_radius, TerrainConfig};
use super::pixel::{Pixel, PixelBuffer};
use super::smoothing::neighborhood_elevation;

/// Green value of land sitting at half the noise range.
const LAND_BASE_GREEN: i32 = 160;
/// Green increase per elevation unit.
const LAND_GREEN_PER_UNIT: i32 = 20;
/// Number of cleanup passes over the classified image.
pub const CLEANUP_PASSES: usize = 2;
/// One in `STAR_ODDS` background pixels is a star.
const STAR_ODDS: u32 = 101;

/// Errors that can occur during terrain generation.
#[derive(Error, Debug)]
pub enum TerrainError {
    #[error("Invalid terrain configuration: {0}")]
    InvalidConfig(String),
    #[error("Noise error: {0}")]
    Noise(#[from] NoiseError),
    #[error("Bitmap error: {0}")]
    Bitmap(#[from] BitmapError),
}

/// Circle test for the planet disc.
///
/// Distances are taken from the geometric center of the grid, so a cell and
/// its point reflection through the center always agree. The disc is inset
/// from the planet radius by `smoothing_radius` and is empty when the inset
/// consumes the whole radius.
pub fn on_planet(width: u32, height: u32, smoothing_radius: u8, x: u32, y: u32) -> bool {
    let radius = planet_radius(width, height) as i64;
    // doubled coordinates keep the half-pixel center on integers
    let limit = 2 * (radius - smoothing_radius as i64);
    if limit <= 0 {
        return false;
    }
    let dx = 2 * x as i64 - (width as i64 - 1);
    let dy = 2 * y as i64 - (height as i64 - 1);
    dx * dx + dy * dy < limit * limit
}

/// Green channel for land at `elevation`.
///
/// Monotonic in elevation and clamped so it never collides with the 0/255
/// sentinels.
pub fn land_green(elevation: u32, noise_max: u8) -> u8 {
    let above_mid = elevation as i64 - (noise_max / 2) as i64;
    let green = LAND_BASE_GREEN as i64 + LAND_GREEN_PER_UNIT as i64 * above_mid;
    green.clamp(1, 254) as u8
}

/// Classifies every cell of `noise` into ocean, land, star or space.
///
/// Each cell is written exactly once. Star placement draws from `rng`.
pub fn classify<R: Rng + ?Sized>(noise: &NoiseField, config: &TerrainConfig, rng: &mut R) -> PixelBuffer {
    let (width, height) = (noise.width(), noise.height());
    let mut buffer = PixelBuffer::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let elevation = neighborhood_elevation(noise, x, y, config.smoothing_radius);
            let disc = on_planet(width, height, config.smoothing_radius, x, y);

            let pixel = match elevation {
                Some(e) if disc => {
                    if e <= config.sea_level as u32 {
                        Pixel::OCEAN
                    } else {
                        Pixel::land(land_green(e, config.noise_max))
                    }
                }
                _ => {
                    if rng.gen_range(0..STAR_ODDS) == 1 {
                        Pixel::STAR
                    } else {
                        Pixel::SPACE
                    }
                }
            };
            buffer.set(x, y, pixel);
        }
    }

    buffer
}

fn at(buffer: &PixelBuffer, x: u32, y: u32) -> Pixel {
    buffer.get(x, y).unwrap_or(Pixel::SPACE)
}

/// Runs one in-place cleanup pass over interior pixels.
///
/// Returns the number of pixels that changed class.
pub fn cleanup_pass(buffer: &mut PixelBuffer) -> usize {
    let (width, height) = (buffer.width(), buffer.height());
    if width < 3 || height < 3 {
        return 0;
    }

    let mut changed = 0;
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut pixel = at(buffer, x, y);
            let before = pixel;

            if pixel.has_land_green() {
                let vertical = at(buffer, x, y - 1).is_ocean_blue() && at(buffer, x, y + 1).is_ocean_blue();
                let horizontal = at(buffer, x - 1, y).is_ocean_blue() && at(buffer, x + 1, y).is_ocean_blue();
                if vertical || horizontal {
                    pixel = Pixel::OCEAN;
                }
            }

            if pixel.has_water_blue() {
                let left = at(buffer, x - 1, y);
                let surrounded = [left, at(buffer, x + 1, y), at(buffer, x, y - 1), at(buffer, x, y + 1)]
                    .iter()
                    .all(|n| n.g != 0);
                // a star on the left has no land green to copy
                if surrounded && left.has_land_green() {
                    pixel = Pixel::land(left.g);
                }
            }

            if pixel != before {
                buffer.set(x, y, pixel);
                changed += 1;
            }
        }
    }
    changed
}

/// Applies the fixed number of cleanup passes.
pub fn cleanup_isolated_pixels(buffer: &mut PixelBuffer) -> usize {
    let changed: usize = (0..CLEANUP_PASSES).map(|_| cleanup_pass(buffer)).sum();
    tracing::debug!(changed, passes = CLEANUP_PASSES, "isolated pixel cleanup");
    changed
}

/// Generates a classified, cleaned planet image.
///
/// # Arguments
/// * `config` - Terrain parameters
/// * `rng` - Generator for terrain noise and star placement
pub fn generate_map<R: Rng + ?Sized>(config: &TerrainConfig, rng: &mut R) -> Result<PixelBuffer, TerrainError> {
    config.validate()?;

    let noise = NoiseField::generate(rng, config.width, config.height, 0, config.noise_max)?;
    tracing::debug!(
        radius = config.planet_radius(),
        grad = config.smoothing_radius,
        sea_level = config.sea_level,
        "classifying terrain"
    );

    let mut buffer = classify(&noise, config, rng);
    cleanup_isolated_pixels(&mut buffer);
    Ok(buffer)
}

/// Generates a planet and writes it as a bitmap at `path`.
pub fn generate_map_file<R: Rng + ?Sized>(
    path: &Path,
    config: &TerrainConfig,
    rng: &mut R,
) -> Result<PixelBuffer, TerrainError> {
    let buffer = generate_map(config, rng)?;
    let options = BitmapOptions {
        dpi: config.dpi,
        size_fields: config.size_fields,
    };
    export_bitmap(&buffer, path, &options)?;
    tracing::info!(path = %path.display(), width = config.width, height = config.height, "wrote terrain bitmap");
    Ok(buffer)
}
