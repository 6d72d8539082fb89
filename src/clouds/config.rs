//! Configuration for the cloud overlay pass.

use serde::{Deserialize, Serialize};

use super::CloudError;

/// Parameters of a cloud overlay run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Width of the bitmap being patched.
    pub width: u32,
    /// Height of the bitmap being patched.
    pub height: u32,
    /// Inclusive upper bound of the cloud noise; the lower bound is 0.
    pub noise_max: u8,
    /// Smoothed cloud values above this threshold draw a cloud.
    pub cloud_level: u8,
    /// Neighborhood radius used when averaging cloud noise.
    pub smoothing_radius: u8,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            width: 127,
            height: 127,
            noise_max: 16,
            cloud_level: 9,
            smoothing_radius: 3,
        }
    }
}

impl CloudConfig {
    /// Creates a square configuration with default thresholds.
    pub fn square(size: u32) -> Self {
        Self {
            width: size,
            height: size,
            ..Default::default()
        }
    }

    /// Sets the noise bound, cloud level and smoothing radius.
    pub fn with_levels(mut self, noise_max: u8, cloud_level: u8, smoothing_radius: u8) -> Self {
        self.noise_max = noise_max;
        self.cloud_level = cloud_level;
        self.smoothing_radius = smoothing_radius;
        self
    }

    pub fn validate(&self) -> Result<(), CloudError> {
        if self.width == 0 || self.height == 0 {
            return Err(CloudError::InvalidConfig(format!(
                "grid dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CloudConfig::default();
        assert_eq!(config.noise_max, 16);
        assert_eq!(config.cloud_level, 9);
        assert_eq!(config.smoothing_radius, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_grid() {
        let config = CloudConfig::square(0);
        assert!(matches!(config.validate(), Err(CloudError::InvalidConfig(_))));
    }
}
