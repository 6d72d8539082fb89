//! Cloud overlay module.
//!
//! Patches cloud cover onto an already written planet bitmap, clearing any
//! clouds left by a previous run first.

mod config;
mod overlay;

pub use config::CloudConfig;
pub use overlay::{
    clear_cloud, cloud_over, is_planet_pixel, overlay_clouds, overlay_clouds_with_noise,
    CloudError, OverlayStats, THIN_CLOUD,
};
