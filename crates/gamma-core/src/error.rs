//! Errors reported by image construction and checked access.

use crate::geometry::DataSize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    /// Ragged nested input, or a buffer whose length disagrees with the
    /// declared size.
    #[error("shape mismatch: {0}")]
    Shape(String),
    /// Non-positive spacing.
    #[error("spacing must be positive, got {0}")]
    Spacing(f32),
    /// Checked access outside the image.
    #[error("position ({frame}, {row}, {column}) out of bounds for size {size}")]
    Bounds {
        frame: u32,
        row: u32,
        column: u32,
        size: DataSize,
    },
}
