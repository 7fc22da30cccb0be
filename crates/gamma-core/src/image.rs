//! Dose image container.
//!
//! `ImageData` owns a flat `f32` buffer in row-major (frame, row, column)
//! order together with its geometry. Dose values are stored as `f32` —
//! sufficient precision for gamma index work at half the memory of `f64`.
//! NaN is a legal voxel value meaning "missing / below cutoff".
//!
//! All images are assumed to lie in the axial plane; the plane-aware
//! accessors return rotated copies that are again axial.

use crate::error::ImageError;
use crate::geometry::{Axis, DataOffset, DataSize, DataSpacing, ImagePlane};

#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    data: Vec<f32>,
    size: DataSize,
    offset: DataOffset,
    spacing: DataSpacing,
}

fn validate_spacing(size: DataSize, spacing: DataSpacing) -> Result<(), ImageError> {
    if spacing.rows <= 0.0 {
        return Err(ImageError::Spacing(spacing.rows));
    }
    if spacing.columns <= 0.0 {
        return Err(ImageError::Spacing(spacing.columns));
    }
    // single-frame images may carry a frames spacing of 0 (2D convention)
    if size.frames > 1 && spacing.frames <= 0.0 {
        return Err(ImageError::Spacing(spacing.frames));
    }
    if size.frames == 1 && spacing.frames < 0.0 {
        return Err(ImageError::Spacing(spacing.frames));
    }
    Ok(())
}

impl ImageData {
    /// Create an image from a flat buffer and its geometry.
    pub fn new(
        data: Vec<f32>,
        size: DataSize,
        offset: DataOffset,
        spacing: DataSpacing,
    ) -> Result<Self, ImageError> {
        if size.frames == 0 || size.rows == 0 || size.columns == 0 {
            return Err(ImageError::Shape(format!("size {size} has a zero dimension")));
        }
        validate_spacing(size, spacing)?;
        if data.len() != size.total() {
            return Err(ImageError::Shape(format!(
                "buffer of {} elements is inconsistent with size {}",
                data.len(),
                size
            )));
        }
        Ok(Self { data, size, offset, spacing })
    }

    /// Create a one-frame image from nested rows.
    pub fn from_image_2d(
        image: &[Vec<f32>],
        offset: DataOffset,
        spacing: DataSpacing,
    ) -> Result<Self, ImageError> {
        if image.is_empty() || image[0].is_empty() {
            return Err(ImageError::Shape("empty 2D image".into()));
        }
        let columns = image[0].len();
        let mut data = Vec::with_capacity(image.len() * columns);
        for row in image {
            if row.len() != columns {
                return Err(ImageError::Shape(format!(
                    "ragged 2D image: row of {} elements, expected {}",
                    row.len(),
                    columns
                )));
            }
            data.extend_from_slice(row);
        }
        let size = DataSize::new(1, image.len() as u32, columns as u32);
        Self::new(data, size, offset, spacing)
    }

    /// Create an image from nested frames.
    pub fn from_image_3d(
        image: &[Vec<Vec<f32>>],
        offset: DataOffset,
        spacing: DataSpacing,
    ) -> Result<Self, ImageError> {
        if image.is_empty() || image[0].is_empty() || image[0][0].is_empty() {
            return Err(ImageError::Shape("empty 3D image".into()));
        }
        let rows = image[0].len();
        let columns = image[0][0].len();
        let mut data = Vec::with_capacity(image.len() * rows * columns);
        for frame in image {
            if frame.len() != rows {
                return Err(ImageError::Shape(format!(
                    "ragged 3D image: frame of {} rows, expected {}",
                    frame.len(),
                    rows
                )));
            }
            for row in frame {
                if row.len() != columns {
                    return Err(ImageError::Shape(format!(
                        "ragged 3D image: row of {} elements, expected {}",
                        row.len(),
                        columns
                    )));
                }
                data.extend_from_slice(row);
            }
        }
        let size = DataSize::new(image.len() as u32, rows as u32, columns as u32);
        Self::new(data, size, offset, spacing)
    }

    pub fn size(&self) -> DataSize {
        self.size
    }

    pub fn offset(&self) -> DataOffset {
        self.offset
    }

    pub fn spacing(&self) -> DataSpacing {
        self.spacing
    }

    /// Reinterpret the buffer with a new size. The element count must not
    /// change.
    pub fn set_size(&mut self, size: DataSize) -> Result<(), ImageError> {
        if size.total() != self.data.len() {
            return Err(ImageError::Shape(format!(
                "new size {} is inconsistent with {} stored elements",
                size,
                self.data.len()
            )));
        }
        validate_spacing(size, self.spacing)?;
        self.size = size;
        Ok(())
    }

    pub fn set_offset(&mut self, offset: DataOffset) {
        self.offset = offset;
    }

    pub fn set_spacing(&mut self, spacing: DataSpacing) -> Result<(), ImageError> {
        validate_spacing(self.size, spacing)?;
        self.spacing = spacing;
        Ok(())
    }

    /// Number of voxels.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    fn flat_index(&self, frame: u32, row: u32, column: u32) -> usize {
        ((frame as usize * self.size.rows as usize) + row as usize) * self.size.columns as usize
            + column as usize
    }

    /// Voxel at (frame, row, column). Panics on out-of-bounds access.
    #[inline]
    pub fn get(&self, frame: u32, row: u32, column: u32) -> f32 {
        self.data[self.flat_index(frame, row, column)]
    }

    /// Voxel at (frame, row, column) with bounds checking.
    pub fn try_at(&self, frame: u32, row: u32, column: u32) -> Result<f32, ImageError> {
        if frame >= self.size.frames || row >= self.size.rows || column >= self.size.columns {
            return Err(ImageError::Bounds { frame, row, column, size: self.size });
        }
        Ok(self.data[self.flat_index(frame, row, column)])
    }

    /// Voxel at a flat index. Panics on out-of-bounds access.
    #[inline]
    pub fn get_index(&self, index: usize) -> f32 {
        self.data[index]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Millimeter position of a voxel index along the given axis.
    #[inline]
    pub fn position(&self, axis: Axis, index: u32) -> f32 {
        match axis {
            Axis::Z => self.offset.frames + index as f32 * self.spacing.frames,
            Axis::Y => self.offset.rows + index as f32 * self.spacing.rows,
            Axis::X => self.offset.columns + index as f32 * self.spacing.columns,
        }
    }

    /// Nested copy of one frame of the image rotated to the given plane.
    pub fn image_2d(&self, frame: u32, plane: ImagePlane) -> Result<Vec<Vec<f32>>, ImageError> {
        let slice = self.slice_2d(frame, plane)?;
        let size = slice.size();
        let mut rows = Vec::with_capacity(size.rows as usize);
        for r in 0..size.rows {
            let begin = (r as usize) * size.columns as usize;
            rows.push(slice.data[begin..begin + size.columns as usize].to_vec());
        }
        Ok(rows)
    }

    /// Nested copy of the whole image rotated to the given plane.
    pub fn image_3d(&self, plane: ImagePlane) -> Vec<Vec<Vec<f32>>> {
        let rotated = self.rotated_3d(plane);
        let size = rotated.size();
        let mut frames = Vec::with_capacity(size.frames as usize);
        for f in 0..size.frames {
            let mut rows = Vec::with_capacity(size.rows as usize);
            for r in 0..size.rows {
                let begin = rotated.flat_index(f, r, 0);
                rows.push(rotated.data[begin..begin + size.columns as usize].to_vec());
            }
            frames.push(rows);
        }
        frames
    }

    /// One-frame image extracted along the given plane.
    ///
    /// The result is axial: its rows/columns are the two in-plane axes, its
    /// frames offset is the source-axis coordinate of the selected frame and
    /// its frames spacing is 0.
    pub fn slice_2d(&self, frame: u32, plane: ImagePlane) -> Result<ImageData, ImageError> {
        let (out_rows, out_columns, depth) = match plane {
            ImagePlane::Axial => (self.size.rows, self.size.columns, self.size.frames),
            ImagePlane::Coronal => (self.size.frames, self.size.columns, self.size.rows),
            ImagePlane::Sagittal => (self.size.rows, self.size.frames, self.size.columns),
        };
        if frame >= depth {
            return Err(ImageError::Bounds { frame, row: 0, column: 0, size: self.size });
        }

        let mut data = Vec::with_capacity(out_rows as usize * out_columns as usize);
        for r in 0..out_rows {
            for c in 0..out_columns {
                let value = match plane {
                    ImagePlane::Axial => self.get(frame, r, c),
                    ImagePlane::Coronal => self.get(r, frame, c),
                    ImagePlane::Sagittal => self.get(c, r, frame),
                };
                data.push(value);
            }
        }

        let (offset, spacing) = match plane {
            ImagePlane::Axial => (
                DataOffset::new(self.position(Axis::Z, frame), self.offset.rows, self.offset.columns),
                DataSpacing::new(0.0, self.spacing.rows, self.spacing.columns),
            ),
            ImagePlane::Coronal => (
                DataOffset::new(self.position(Axis::Y, frame), self.offset.frames, self.offset.columns),
                DataSpacing::new(0.0, self.spacing.frames, self.spacing.columns),
            ),
            ImagePlane::Sagittal => (
                DataOffset::new(self.position(Axis::X, frame), self.offset.rows, self.offset.frames),
                DataSpacing::new(0.0, self.spacing.rows, self.spacing.frames),
            ),
        };

        Ok(ImageData {
            data,
            size: DataSize::new(1, out_rows, out_columns),
            offset,
            spacing,
        })
    }

    /// Copy of the whole volume rotated so that the requested plane becomes
    /// axial. Coronal and Sagittal rotations are their own inverses.
    pub fn rotated_3d(&self, plane: ImagePlane) -> ImageData {
        match plane {
            ImagePlane::Axial => self.clone(),
            ImagePlane::Coronal => {
                let size = DataSize::new(self.size.rows, self.size.frames, self.size.columns);
                let mut data = Vec::with_capacity(self.data.len());
                for f in 0..size.frames {
                    for r in 0..size.rows {
                        for c in 0..size.columns {
                            data.push(self.get(r, f, c));
                        }
                    }
                }
                ImageData {
                    data,
                    size,
                    offset: DataOffset::new(self.offset.rows, self.offset.frames, self.offset.columns),
                    spacing: DataSpacing::new(self.spacing.rows, self.spacing.frames, self.spacing.columns),
                }
            }
            ImagePlane::Sagittal => {
                let size = DataSize::new(self.size.columns, self.size.rows, self.size.frames);
                let mut data = Vec::with_capacity(self.data.len());
                for f in 0..size.frames {
                    for r in 0..size.rows {
                        for c in 0..size.columns {
                            data.push(self.get(c, r, f));
                        }
                    }
                }
                ImageData {
                    data,
                    size,
                    offset: DataOffset::new(self.offset.columns, self.offset.rows, self.offset.frames),
                    spacing: DataSpacing::new(self.spacing.columns, self.spacing.rows, self.spacing.frames),
                }
            }
        }
    }

    pub fn contains_nan(&self) -> bool {
        self.data.iter().any(|v| v.is_nan())
    }

    pub fn contains_inf(&self) -> bool {
        self.data.iter().any(|v| v.is_infinite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_3d() -> ImageData {
        ImageData::from_image_3d(
            &[
                vec![vec![1.0, 2.0], vec![3.0, 4.0]],
                vec![vec![5.0, 6.0], vec![7.0, 8.0]],
            ],
            DataOffset::new(-2.0, 1.0, 0.5),
            DataSpacing::new(2.0, 1.0, 0.5),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_shape_mismatch() {
        let result = ImageData::new(
            vec![0.0; 5],
            DataSize::new(1, 2, 3),
            DataOffset::new(0.0, 0.0, 0.0),
            DataSpacing::new(1.0, 1.0, 1.0),
        );
        assert!(matches!(result, Err(ImageError::Shape(_))));
    }

    #[test]
    fn test_new_rejects_nonpositive_spacing() {
        let result = ImageData::new(
            vec![0.0; 4],
            DataSize::new(1, 2, 2),
            DataOffset::new(0.0, 0.0, 0.0),
            DataSpacing::new(1.0, -1.0, 1.0),
        );
        assert!(matches!(result, Err(ImageError::Spacing(_))));
    }

    #[test]
    fn test_frames_spacing_zero_allowed_for_single_frame() {
        let img = ImageData::from_image_2d(
            &[vec![1.0, 2.0], vec![3.0, 4.0]],
            DataOffset::new(0.0, 0.0, 0.0),
            DataSpacing::new(0.0, 1.0, 1.0),
        )
        .unwrap();
        assert_eq!(img.size(), DataSize::new(1, 2, 2));

        let result = ImageData::new(
            vec![0.0; 4],
            DataSize::new(2, 2, 1),
            DataOffset::new(0.0, 0.0, 0.0),
            DataSpacing::new(0.0, 1.0, 1.0),
        );
        assert!(matches!(result, Err(ImageError::Spacing(_))));
    }

    #[test]
    fn test_ragged_input_rejected() {
        let result = ImageData::from_image_2d(
            &[vec![1.0, 2.0], vec![3.0]],
            DataOffset::new(0.0, 0.0, 0.0),
            DataSpacing::new(0.0, 1.0, 1.0),
        );
        assert!(matches!(result, Err(ImageError::Shape(_))));
    }

    #[test]
    fn test_get_and_try_at() {
        let img = image_3d();
        assert_eq!(img.get(0, 0, 0), 1.0);
        assert_eq!(img.get(1, 1, 1), 8.0);
        assert_eq!(img.try_at(1, 0, 1).unwrap(), 6.0);
        assert!(matches!(img.try_at(2, 0, 0), Err(ImageError::Bounds { .. })));
    }

    #[test]
    fn test_set_size_preserves_element_count() {
        let mut img = image_3d();
        img.set_size(DataSize::new(1, 2, 4)).unwrap();
        assert_eq!(img.get(0, 1, 3), 8.0);
        assert!(img.set_size(DataSize::new(3, 3, 3)).is_err());
    }

    #[test]
    fn test_position() {
        let img = image_3d();
        assert_eq!(img.position(Axis::Z, 1), 0.0);
        assert_eq!(img.position(Axis::Y, 1), 2.0);
        assert_eq!(img.position(Axis::X, 1), 1.0);
    }

    #[test]
    fn test_coronal_rotation() {
        let img = image_3d();
        let coronal = img.rotated_3d(ImagePlane::Coronal);
        assert_eq!(coronal.size(), DataSize::new(2, 2, 2));
        // out[f, r, c] == src[r, f, c]
        assert_eq!(coronal.get(0, 1, 0), img.get(1, 0, 0));
        assert_eq!(coronal.get(1, 0, 1), img.get(0, 1, 1));
        assert_eq!(coronal.offset(), DataOffset::new(1.0, -2.0, 0.5));
        assert_eq!(coronal.spacing(), DataSpacing::new(1.0, 2.0, 0.5));
    }

    #[test]
    fn test_rotations_are_self_inverse() {
        let img = image_3d();
        assert_eq!(img.rotated_3d(ImagePlane::Coronal).rotated_3d(ImagePlane::Coronal), img);
        assert_eq!(img.rotated_3d(ImagePlane::Sagittal).rotated_3d(ImagePlane::Sagittal), img);
        assert_eq!(img.rotated_3d(ImagePlane::Axial), img);
    }

    #[test]
    fn test_slice_2d_axial() {
        let img = image_3d();
        let slice = img.slice_2d(1, ImagePlane::Axial).unwrap();
        assert_eq!(slice.size(), DataSize::new(1, 2, 2));
        assert_eq!(slice.data(), &[5.0, 6.0, 7.0, 8.0]);
        assert_eq!(slice.offset(), DataOffset::new(0.0, 1.0, 0.5));
        assert_eq!(slice.spacing(), DataSpacing::new(0.0, 1.0, 0.5));
    }

    #[test]
    fn test_slice_2d_sagittal() {
        let img = image_3d();
        let slice = img.slice_2d(1, ImagePlane::Sagittal).unwrap();
        // rows are the Y axis, columns the Z axis
        assert_eq!(slice.size(), DataSize::new(1, 2, 2));
        assert_eq!(slice.data(), &[2.0, 6.0, 4.0, 8.0]);
        assert_eq!(slice.offset(), DataOffset::new(1.0, 1.0, -2.0));
        assert_eq!(slice.spacing(), DataSpacing::new(0.0, 1.0, 2.0));
    }

    #[test]
    fn test_slice_2d_out_of_bounds() {
        let img = image_3d();
        assert!(img.slice_2d(2, ImagePlane::Axial).is_err());
    }

    #[test]
    fn test_image_2d_nested_copy() {
        let img = image_3d();
        let nested = img.image_2d(0, ImagePlane::Axial).unwrap();
        assert_eq!(nested, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn test_contains_special_values() {
        let img = ImageData::from_image_2d(
            &[vec![1.0, f32::NAN]],
            DataOffset::new(0.0, 0.0, 0.0),
            DataSpacing::new(0.0, 1.0, 1.0),
        )
        .unwrap();
        assert!(img.contains_nan());
        assert!(!img.contains_inf());
    }
}
