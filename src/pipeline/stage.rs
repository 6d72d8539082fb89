//! Generation stage trait and pipeline orchestration.

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use crate::clouds::{overlay_clouds, CloudConfig, CloudError, OverlayStats};
use crate::terrain::{generate_map_file, PixelBuffer, TerrainConfig, TerrainError};

/// Unique identifier for generation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    /// Terrain classification and bitmap encoding.
    Terrain,
    /// Cloud overlay patched onto the written bitmap.
    Clouds,
}

impl StageId {
    /// Returns the name of the stage.
    pub fn name(&self) -> &'static str {
        match self {
            StageId::Terrain => "terrain",
            StageId::Clouds => "clouds",
        }
    }
}

/// Errors that can occur during pipeline execution.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Terrain stage failed: {0}")]
    Terrain(#[from] TerrainError),
    #[error("Cloud stage failed: {0}")]
    Clouds(#[from] CloudError),
    #[error("Missing dependency: stage '{0}' requires '{1}'")]
    MissingDependency(String, String),
}

/// The bitmap a pipeline writes to, plus the generator shared by its stages.
#[derive(Debug)]
pub struct RenderTarget {
    /// Output bitmap path.
    pub path: PathBuf,
    /// Single random stream drawn from by every stage.
    pub rng: ChaCha8Rng,
    /// Pixels written by the terrain stage.
    pub terrain: Option<PixelBuffer>,
    /// Result of the most recent cloud stage.
    pub clouds: Option<OverlayStats>,
}

impl RenderTarget {
    /// Creates a target at `path` with a generator seeded from `seed`.
    pub fn new(path: impl Into<PathBuf>, seed: u64) -> Self {
        Self {
            path: path.into(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            terrain: None,
            clouds: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Trait for implementing generation stages.
///
/// Each stage reads or writes the target bitmap, building upon previous
/// stages.
pub trait GenerationStage: Send + Sync {
    /// Returns the unique identifier for this stage.
    fn id(&self) -> StageId;

    /// Returns a human-readable name for the stage.
    fn name(&self) -> &str;

    /// Returns the stage IDs that must be executed before this stage.
    fn dependencies(&self) -> &[StageId] {
        &[]
    }

    /// Executes the stage against `target`.
    fn execute(&self, target: &mut RenderTarget) -> Result<(), PipelineError>;
}

/// Orchestrates generation stages in insertion order.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn GenerationStage>>,
}

impl Pipeline {
    /// Creates a new empty pipeline.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Adds a stage to the pipeline.
    pub fn add_stage<S: GenerationStage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Returns the number of stages in the pipeline.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Executes all stages in order on the given target.
    pub fn run(&self, target: &mut RenderTarget) -> Result<(), PipelineError> {
        self.run_with_callbacks(target, |_, _, _| {}, |_, _, _| {})
    }

    /// Executes all stages with progress callbacks.
    ///
    /// # Arguments
    /// * `target` - The bitmap to generate
    /// * `on_stage_start` - Called when each stage begins
    /// * `on_stage_complete` - Called when each stage finishes
    pub fn run_with_callbacks<F1, F2>(
        &self,
        target: &mut RenderTarget,
        mut on_stage_start: F1,
        mut on_stage_complete: F2,
    ) -> Result<(), PipelineError>
    where
        F1: FnMut(&str, usize, usize),
        F2: FnMut(&str, usize, usize),
    {
        let total = self.stages.len();
        let mut completed: Vec<StageId> = Vec::new();

        for (i, stage) in self.stages.iter().enumerate() {
            on_stage_start(stage.name(), i, total);

            for dep in stage.dependencies() {
                if !completed.contains(dep) {
                    return Err(PipelineError::MissingDependency(
                        stage.id().name().to_string(),
                        dep.name().to_string(),
                    ));
                }
            }

            stage.execute(target)?;
            completed.push(stage.id());

            on_stage_complete(stage.name(), i, total);
        }

        Ok(())
    }
}

/// Terrain generation stage.
pub struct TerrainStage {
    pub config: TerrainConfig,
}

impl TerrainStage {
    pub fn new(config: TerrainConfig) -> Self {
        Self { config }
    }
}

impl GenerationStage for TerrainStage {
    fn id(&self) -> StageId {
        StageId::Terrain
    }

    fn name(&self) -> &str {
        "Terrain Generation"
    }

    fn execute(&self, target: &mut RenderTarget) -> Result<(), PipelineError> {
        let buffer = generate_map_file(&target.path, &self.config, &mut target.rng)?;
        target.terrain = Some(buffer);
        Ok(())
    }
}

/// Cloud overlay stage.
pub struct CloudStage {
    pub config: CloudConfig,
}

impl CloudStage {
    pub fn new(config: CloudConfig) -> Self {
        Self { config }
    }
}

impl GenerationStage for CloudStage {
    fn id(&self) -> StageId {
        StageId::Clouds
    }

    fn name(&self) -> &str {
        "Cloud Overlay"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Terrain]
    }

    fn execute(&self, target: &mut RenderTarget) -> Result<(), PipelineError> {
        let stats = overlay_clouds(&target.path, &self.config, &mut target.rng)?;
        target.clouds = Some(stats);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::expected_file_size;
    use tempfile::tempdir;

    #[test]
    fn test_stage_names() {
        assert_eq!(StageId::Terrain.name(), "terrain");
        assert_eq!(StageId::Clouds.name(), "clouds");
    }

    #[test]
    fn test_pipeline_execution() {
        let dir = tempdir().unwrap();
        let mut target = RenderTarget::new(dir.path().join("planet.bmp"), 42);

        let mut pipeline = Pipeline::new();
        pipeline
            .add_stage(TerrainStage::new(TerrainConfig::square(32).with_levels(16, 7, 2)))
            .add_stage(CloudStage::new(CloudConfig::square(32).with_levels(16, 9, 2)));
        assert_eq!(pipeline.stage_count(), 2);

        pipeline.run(&mut target).unwrap();

        assert!(target.terrain.is_some());
        assert!(target.clouds.is_some());
        let len = std::fs::metadata(target.path()).unwrap().len();
        assert_eq!(len, expected_file_size(32, 32));
    }

    #[test]
    fn test_clouds_require_terrain() {
        let dir = tempdir().unwrap();
        let mut target = RenderTarget::new(dir.path().join("planet.bmp"), 1);

        let mut pipeline = Pipeline::new();
        pipeline.add_stage(CloudStage::new(CloudConfig::square(16)));

        let err = pipeline.run(&mut target).unwrap_err();
        assert!(matches!(err, PipelineError::MissingDependency(ref s, ref d) if s == "clouds" && d == "terrain"));
        assert!(!target.path().exists());
    }

    #[test]
    fn test_pipeline_with_callbacks() {
        let dir = tempdir().unwrap();
        let mut target = RenderTarget::new(dir.path().join("planet.bmp"), 7);

        let mut pipeline = Pipeline::new();
        pipeline.add_stage(TerrainStage::new(TerrainConfig::square(16).with_levels(16, 7, 2)));

        let mut started = false;
        let mut completed = false;
        pipeline
            .run_with_callbacks(
                &mut target,
                |name, _, _| {
                    assert_eq!(name, "Terrain Generation");
                    started = true;
                },
                |name, _, _| {
                    assert_eq!(name, "Terrain Generation");
                    completed = true;
                },
            )
            .unwrap();

        assert!(started);
        assert!(completed);
    }

    #[test]
    fn test_same_seed_same_bitmap() {
        let dir = tempdir().unwrap();
        let mut pipeline = Pipeline::new();
        pipeline
            .add_stage(TerrainStage::new(TerrainConfig::square(24).with_levels(16, 7, 2)))
            .add_stage(CloudStage::new(CloudConfig::square(24).with_levels(16, 8, 1)));

        let mut a = RenderTarget::new(dir.path().join("a.bmp"), 99);
        let mut b = RenderTarget::new(dir.path().join("b.bmp"), 99);
        pipeline.run(&mut a).unwrap();
        pipeline.run(&mut b).unwrap();

        assert_eq!(std::fs::read(a.path()).unwrap(), std::fs::read(b.path()).unwrap());
    }

    #[test]
    fn test_stage_error_propagates() {
        let dir = tempdir().unwrap();
        let mut target = RenderTarget::new(dir.path().join("planet.bmp"), 3);

        let mut pipeline = Pipeline::new();
        pipeline
            .add_stage(TerrainStage::new(TerrainConfig::square(16)))
            .add_stage(CloudStage::new(CloudConfig::square(17)));

        assert!(matches!(pipeline.run(&mut target), Err(PipelineError::Clouds(_))));
    }
}
