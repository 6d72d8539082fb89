//! Cloud overlay drawn directly onto an encoded bitmap.

use std::path::Path;

use rand::Rng;
use thiserror::Error;

use crate::export::{BitmapError, PatchSession};
use crate::noise::{NoiseError, NoiseField};
use crate::terrain::{neighborhood_elevation, Pixel, CLOUD_MARKER};
use super::config::CloudConfig;

/// Green added to land under a thick cloud, and removed when it clears.
const THICK_CLOUD_GREEN_SHIFT: u8 = 75;

/// Cloud drawn over ocean.
pub const THIN_CLOUD: Pixel = Pixel::new(235, CLOUD_MARKER, CLOUD_MARKER);

/// Errors that can occur during the cloud overlay.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Invalid cloud configuration: {0}")]
    InvalidConfig(String),
    #[error("Noise error: {0}")]
    Noise(#[from] NoiseError),
    #[error("Bitmap error: {0}")]
    Bitmap(#[from] BitmapError),
}

/// Counts of pixels touched by one overlay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayStats {
    /// Pixels whose previous cloud was removed.
    pub cleared: usize,
    /// Thin clouds drawn over ocean.
    pub thin: usize,
    /// Thick clouds drawn over land.
    pub thick: usize,
}

impl OverlayStats {
    /// Pixels carrying a cloud after the run.
    pub fn covered(&self) -> usize {
        self.thin + self.thick
    }
}

/// Whether a stored pixel belongs to the planet rather than the background.
///
/// Pixels that already carry a cloud marker count as planet so that their
/// cloud can always be cleared, even when the shifted green hit 0 or 255.
pub fn is_planet_pixel(pixel: Pixel) -> bool {
    pixel.is_ocean_blue() || pixel.has_land_green() || pixel.has_cloud_marker()
}

/// Terrain color underneath a cloud marker, or `None` for an unknown marker.
pub fn clear_cloud(pixel: Pixel) -> Option<Pixel> {
    if pixel.b == CLOUD_MARKER {
        Some(Pixel::land(pixel.g.wrapping_sub(THICK_CLOUD_GREEN_SHIFT)))
    } else if pixel.g == CLOUD_MARKER {
        Some(Pixel::OCEAN)
    } else {
        None
    }
}

/// Cloud color drawn over `pixel`.
pub fn cloud_over(pixel: Pixel) -> Pixel {
    if pixel.g != 0 {
        Pixel::new(CLOUD_MARKER, pixel.g.wrapping_add(THICK_CLOUD_GREEN_SHIFT), CLOUD_MARKER)
    } else {
        THIN_CLOUD
    }
}

/// Draws a fresh cloud layer onto the bitmap at `path`.
///
/// Clouds from an earlier run are cleared before new ones are drawn, so
/// repeated runs never stack markers.
///
/// # Arguments
/// * `path` - Bitmap previously written by the terrain pass
/// * `config` - Cloud parameters; its dimensions must match the file
/// * `rng` - Generator for the cloud noise
pub fn overlay_clouds<R: Rng + ?Sized>(
    path: &Path,
    config: &CloudConfig,
    rng: &mut R,
) -> Result<OverlayStats, CloudError> {
    config.validate()?;
    let noise = NoiseField::generate(rng, config.width, config.height, 0, config.noise_max)?;
    overlay_clouds_with_noise(path, config, &noise)
}

/// Same as [`overlay_clouds`] with an explicit cloud noise field.
///
/// `config.noise_max` is ignored; the field's dimensions must match the
/// configured grid.
pub fn overlay_clouds_with_noise(
    path: &Path,
    config: &CloudConfig,
    noise: &NoiseField,
) -> Result<OverlayStats, CloudError> {
    config.validate()?;
    if (noise.width(), noise.height()) != (config.width, config.height) {
        return Err(CloudError::InvalidConfig(format!(
            "cloud noise is {}x{} but the grid is {}x{}",
            noise.width(),
            noise.height(),
            config.width,
            config.height
        )));
    }

    let mut session = PatchSession::open(path, config.width, config.height)?;
    tracing::debug!(
        size_field = session.header().file_size,
        dpm = session.header().x_ppm,
        level = config.cloud_level,
        "patching clouds"
    );
    let mut stats = OverlayStats::default();

    for y in 0..config.height {
        for x in 0..config.width {
            session.seek_to_pixel(x, y)?;
            let mut pixel = session.read_triple()?;
            if !is_planet_pixel(pixel) {
                continue;
            }

            if pixel.has_cloud_marker() {
                if let Some(restored) = clear_cloud(pixel) {
                    session.write_pixel(x, y, restored)?;
                    // re-read so the new cloud is based on the cleared color
                    pixel = session.read_pixel(x, y)?;
                    stats.cleared += 1;
                }
            }

            let elevation = neighborhood_elevation(noise, x, y, config.smoothing_radius);
            if matches!(elevation, Some(e) if e > config.cloud_level as u32) {
                let cloud = cloud_over(pixel);
                if cloud == THIN_CLOUD {
                    stats.thin += 1;
                } else {
                    stats.thick += 1;
                }
                session.write_pixel(x, y, cloud)?;
            }
        }
    }

    session.close()?;
    tracing::info!(
        path = %path.display(),
        cleared = stats.cleared,
        thin = stats.thin,
        thick = stats.thick,
        "cloud overlay applied"
    );
    Ok(stats)
}
