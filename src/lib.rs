//! Procedural planet generator writing 24-bit bitmaps.
//!
//! A noise field is box-smoothed and classified into ocean, land and space
//! inside a disc, cleaned of isolated pixels and encoded as a BMP. A second
//! pass patches cloud cover directly onto the written file.

pub mod noise;
pub mod terrain;
pub mod export;
pub mod clouds;
pub mod pipeline;
pub mod config;

pub use noise::NoiseField;
pub use terrain::{generate_map, generate_map_file, Pixel, PixelBuffer, PixelClass, TerrainConfig};
pub use export::{export_bitmap, read_header, BitmapHeader, BitmapOptions, PatchSession, SizeFields};
pub use clouds::{overlay_clouds, CloudConfig, OverlayStats};
pub use pipeline::{CloudStage, GenerationStage, Pipeline, RenderTarget, TerrainStage};
pub use config::PlanetConfig;
