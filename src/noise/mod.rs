//! Noise generation module for terrain and cloud synthesis.
//!
//! Every cell of a field is an independent uniform draw; spatial coherence
//! comes later from neighborhood smoothing in [`crate::terrain`].

mod field;

pub use field::{NoiseError, NoiseField};
