//! Run descriptions loaded from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clouds::CloudConfig;
use crate::pipeline::{CloudStage, Pipeline, TerrainStage};
use crate::terrain::TerrainConfig;

/// Errors that can occur while loading a run description.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Full description of one generation run.
///
/// ```json
/// {
///   "seed": 42,
///   "terrain": { "width": 64, "height": 64, "sea_level": 7 },
///   "clouds": { "cloud_level": 9 }
/// }
/// ```
///
/// Missing fields take their defaults. Cloud dimensions are forced to the
/// terrain's when the cloud block omits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlanetConfig {
    /// Seed for the shared generator; `None` lets the caller pick one.
    pub seed: Option<u64>,
    pub terrain: TerrainConfig,
    /// Cloud pass run after the terrain, if present.
    pub clouds: Option<CloudConfig>,
}

#[derive(Deserialize)]
struct CloudSize {
    width: Option<u32>,
    height: Option<u32>,
}

impl PlanetConfig {
    /// Parses a run description from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let mut config: PlanetConfig = serde_json::from_str(json)?;

        // Inherit terrain dimensions where the cloud block left them out.
        let raw: serde_json::Value = serde_json::from_str(json)?;
        if let (Some(clouds), Some(block)) = (config.clouds.as_mut(), raw.get("clouds")) {
            let size: CloudSize = serde_json::from_value(block.clone())?;
            if size.width.is_none() {
                clouds.width = config.terrain.width;
            }
            if size.height.is_none() {
                clouds.height = config.terrain.height;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a run description from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks both passes and that they describe the same grid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.terrain
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if let Some(clouds) = &self.clouds {
            clouds
                .validate()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            if (clouds.width, clouds.height) != (self.terrain.width, self.terrain.height) {
                return Err(ConfigError::Invalid(format!(
                    "cloud grid {}x{} does not match terrain grid {}x{}",
                    clouds.width, clouds.height, self.terrain.width, self.terrain.height
                )));
            }
        }
        Ok(())
    }

    /// Builds the stage sequence this description asks for.
    pub fn pipeline(&self) -> Pipeline {
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(TerrainStage::new(self.terrain.clone()));
        if let Some(clouds) = &self.clouds {
            pipeline.add_stage(CloudStage::new(clouds.clone()));
        }
        pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::SizeFields;
    use tempfile::tempdir;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = PlanetConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PlanetConfig::default());
        assert_eq!(config.pipeline().stage_count(), 1);
    }

    #[test]
    fn test_clouds_inherit_terrain_size() {
        let json = r#"{
            "seed": 5,
            "terrain": { "width": 40, "height": 30, "size_fields": "exact" },
            "clouds": { "cloud_level": 4 }
        }"#;
        let config = PlanetConfig::from_json_str(json).unwrap();
        assert_eq!(config.seed, Some(5));
        assert_eq!(config.terrain.size_fields, SizeFields::Exact);

        let clouds = config.clouds.as_ref().unwrap();
        assert_eq!((clouds.width, clouds.height), (40, 30));
        assert_eq!(clouds.cloud_level, 4);
        assert_eq!(clouds.noise_max, 16);
        assert_eq!(config.pipeline().stage_count(), 2);
    }

    #[test]
    fn test_mismatched_grids_rejected() {
        let json = r#"{
            "terrain": { "width": 40, "height": 40 },
            "clouds": { "width": 41, "height": 40 }
        }"#;
        assert!(matches!(
            PlanetConfig::from_json_str(json),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_invalid_terrain_rejected() {
        let json = r#"{ "terrain": { "width": 0 } }"#;
        assert!(matches!(
            PlanetConfig::from_json_str(json),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            PlanetConfig::from_json_str("{ terrain"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, r#"{ "terrain": { "width": 20, "height": 20 } }"#).unwrap();

        let config = PlanetConfig::from_json_file(&path).unwrap();
        assert_eq!(config.terrain.width, 20);
        assert!(config.clouds.is_none());

        let missing = PlanetConfig::from_json_file(&dir.path().join("nope.json"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
