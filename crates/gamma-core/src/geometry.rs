//! Geometry of positioned voxel grids.
//!
//! Images are indexed as (frame, row, column), corresponding to the
//! (z, y, x) axes of the LPS coordinate system. Offsets and spacings are
//! millimeters; the position of voxel (f, r, c) along an axis is
//! `offset + index * spacing`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of frames, rows and columns of a 3D image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSize {
    pub frames: u32,
    pub rows: u32,
    pub columns: u32,
}

impl DataSize {
    pub fn new(frames: u32, rows: u32, columns: u32) -> Self {
        Self { frames, rows, columns }
    }

    /// Total number of voxels (frames * rows * columns).
    pub fn total(&self) -> usize {
        self.frames as usize * self.rows as usize * self.columns as usize
    }
}

impl fmt::Display for DataSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.frames, self.rows, self.columns)
    }
}

/// Position of the first voxel center in millimeters. Values can be negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataOffset {
    pub frames: f32,
    pub rows: f32,
    pub columns: f32,
}

impl DataOffset {
    pub fn new(frames: f32, rows: f32, columns: f32) -> Self {
        Self { frames, rows, columns }
    }
}

impl fmt::Display for DataOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.frames, self.rows, self.columns)
    }
}

/// Distance between adjacent voxel centers in millimeters.
///
/// Spacings are positive, with one exception: a single-frame image may carry
/// a frames spacing of 0, the convention used for 2D data stored in the 3D
/// container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataSpacing {
    pub frames: f32,
    pub rows: f32,
    pub columns: f32,
}

impl DataSpacing {
    pub fn new(frames: f32, rows: f32, columns: f32) -> Self {
        Self { frames, rows, columns }
    }
}

impl fmt::Display for DataSpacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.frames, self.rows, self.columns)
    }
}

/// Image axes: Z runs along frames, Y along rows, X along columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    Z,
    Y,
    X,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Z => write!(f, "Z"),
            Axis::Y => write!(f, "Y"),
            Axis::X => write!(f, "X"),
        }
    }
}

/// Anatomical planes of a 3D image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImagePlane {
    /// YX plane (the storage plane).
    Axial,
    /// ZX plane.
    Coronal,
    /// ZY plane.
    Sagittal,
}

impl fmt::Display for ImagePlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImagePlane::Axial => write!(f, "Axial"),
            ImagePlane::Coronal => write!(f, "Coronal"),
            ImagePlane::Sagittal => write!(f, "Sagittal"),
        }
    }
}
