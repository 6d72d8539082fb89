//! Configuration for terrain generation.

use serde::{Deserialize, Serialize};

use crate::export::{BitmapHeader, BitmapOptions, SizeFields};
use super::TerrainError;

/// Parameters of a single terrain generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Inclusive upper bound of the terrain noise; the lower bound is 0.
    pub noise_max: u8,
    /// Smoothed elevations at or below this value become ocean.
    pub sea_level: u8,
    /// Neighborhood radius (grad) used when averaging noise.
    pub smoothing_radius: u8,
    /// Resolution written to the bitmap header; 0 leaves it unset.
    pub dpi: f32,
    /// How the bitmap header's size fields are computed.
    pub size_fields: SizeFields,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            width: 127,
            height: 127,
            noise_max: 16,
            sea_level: 7,
            smoothing_radius: 8,
            dpi: 0.0,
            size_fields: SizeFields::Legacy,
        }
    }
}

impl TerrainConfig {
    /// Creates a square configuration with default thresholds.
    pub fn square(size: u32) -> Self {
        Self {
            width: size,
            height: size,
            ..Default::default()
        }
    }

    /// Sets the noise bound, sea level and smoothing radius.
    pub fn with_levels(mut self, noise_max: u8, sea_level: u8, smoothing_radius: u8) -> Self {
        self.noise_max = noise_max;
        self.sea_level = sea_level;
        self.smoothing_radius = smoothing_radius;
        self
    }

    /// Checks that the configuration describes a writable image.
    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.width == 0 || self.height == 0 {
            return Err(TerrainError::InvalidConfig(format!(
                "image dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.dpi.is_finite() || self.dpi < 0.0 {
            return Err(TerrainError::InvalidConfig(format!(
                "dpi must be a non-negative number, got {}",
                self.dpi
            )));
        }
        // Every size field either policy writes must fit the header.
        for size_fields in [SizeFields::Legacy, SizeFields::Exact] {
            let options = BitmapOptions { dpi: self.dpi, size_fields };
            BitmapHeader::new(self.width, self.height, &options).map_err(|_| {
                TerrainError::InvalidConfig(format!(
                    "image dimensions {}x{} exceed the bitmap header range",
                    self.width, self.height
                ))
            })?;
        }
        Ok(())
    }

    /// Radius of the planet disc before the smoothing inset.
    pub fn planet_radius(&self) -> u32 {
        planet_radius(self.width, self.height)
    }
}

/// Half the average of `width` and `height`, rounded down.
pub fn planet_radius(width: u32, height: u32) -> u32 {
    ((width as u64 + height as u64) / 4) as u32
}
