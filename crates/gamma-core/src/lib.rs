//! Core types for gamma index analysis of radiotherapy dose distributions.
//!
//! This crate provides the dose image container (`ImageData`) with its
//! positioned voxel grid, NaN-aware statistics, the gamma index parameter
//! record and the gamma result container. The computational kernels live in
//! the `gamma-engine` crate; file format support lives in `gamma-io`.

pub mod error;
pub mod fmt;
pub mod geometry;
pub mod image;
pub mod params;
pub mod result;
mod stats;

pub use error::ImageError;
pub use geometry::{Axis, DataOffset, DataSize, DataSpacing, ImagePlane};
pub use image::ImageData;
pub use params::{GammaNormalization, GammaParameters};
pub use result::GammaResult;
