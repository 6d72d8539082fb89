//! Pipeline module for orchestrating planet generation stages.
//!
//! Stages share one output bitmap and one random stream, so a run is fully
//! determined by its seed.

mod stage;

pub use stage::{
    CloudStage, GenerationStage, Pipeline, PipelineError, RenderTarget, StageId, TerrainStage,
};
