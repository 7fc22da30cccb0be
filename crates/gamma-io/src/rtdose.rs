//! Boundary contract for RT dose input.
//!
//! DICOM parsing itself stays outside this crate: a file reader implements
//! [`RtDoseSource`] on top of whatever DICOM library it uses, and
//! [`dose_image`] assembles the dose image from the reported attributes —
//! scaling stored values into physical dose units and deriving the Z
//! spacing from the grid frame offset vector.

use gamma_core::{DataOffset, DataSize, DataSpacing, ImageData, ImageError};
use thiserror::Error;

/// Tolerance in millimeters when checking the frame offset vector for
/// uniform spacing.
const FRAME_SPACING_TOLERANCE: f32 = 1e-3;

#[derive(Error, Debug)]
pub enum RtDoseError {
    #[error("dose grid shape mismatch: {0}")]
    Shape(String),
    #[error("nonuniform frame spacing: {0} mm vs {1} mm")]
    NonuniformFrames(f32, f32),
    #[error("invalid dose image: {0}")]
    Image(#[from] ImageError),
}

/// Attributes of one RT-Dose DICOM object.
///
/// Axis order follows DICOM: Image Position (Patient) is (x, y, z), Pixel
/// Spacing is (row, column), and the pixel data runs in row-major
/// (frame, row, column) order.
pub trait RtDoseSource {
    /// Grid dimensions (frames, rows, columns).
    fn size(&self) -> DataSize;
    /// Image Position (Patient) in millimeters.
    fn image_position_patient(&self) -> [f32; 3];
    /// Pixel Spacing (row spacing, column spacing) in millimeters.
    fn pixel_spacing(&self) -> [f32; 2];
    /// Grid Frame Offset Vector: Z offset of each frame in millimeters,
    /// relative to the image position.
    fn grid_frame_offsets(&self) -> &[f32];
    /// Dose Grid Scaling factor.
    fn dose_grid_scaling(&self) -> f64;
    /// Stored pixel values.
    fn raw_values(&self) -> &[u32];
}

/// Build the dose image reported by a source.
pub fn dose_image<S: RtDoseSource>(source: &S) -> Result<ImageData, RtDoseError> {
    let size = source.size();
    let raw = source.raw_values();
    if raw.len() != size.total() {
        return Err(RtDoseError::Shape(format!(
            "{} stored values for size {}",
            raw.len(),
            size
        )));
    }

    let frame_offsets = source.grid_frame_offsets();
    let frame_spacing = if size.frames > 1 {
        if frame_offsets.len() != size.frames as usize {
            return Err(RtDoseError::Shape(format!(
                "frame offset vector of {} entries for {} frames",
                frame_offsets.len(),
                size.frames
            )));
        }
        let first = frame_offsets[1] - frame_offsets[0];
        for pair in frame_offsets.windows(2) {
            let step = pair[1] - pair[0];
            if (step - first).abs() > FRAME_SPACING_TOLERANCE {
                return Err(RtDoseError::NonuniformFrames(first, step));
            }
        }
        first
    } else {
        0.0
    };

    let scaling = source.dose_grid_scaling();
    let data: Vec<f32> = raw.iter().map(|&v| (v as f64 * scaling) as f32).collect();

    let [x, y, z] = source.image_position_patient();
    let [row_spacing, column_spacing] = source.pixel_spacing();
    let first_frame = frame_offsets.first().copied().unwrap_or(0.0);

    Ok(ImageData::new(
        data,
        size,
        DataOffset::new(z + first_frame, y, x),
        DataSpacing::new(frame_spacing, row_spacing, column_spacing),
    )?)
}
