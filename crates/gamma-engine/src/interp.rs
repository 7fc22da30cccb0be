//! Linear, bilinear and trilinear interpolation of dose images.
//!
//! Two forms are provided: resampling a whole image onto a new grid, and
//! sampling a single real-valued position (the primitive the Wendling search
//! is built on). Both are linear per axis; an exact grid hit returns the
//! stored voxel without touching its neighbors, so resampling an image onto
//! its own grid reproduces it and a NaN neighbor cannot leak into an on-grid
//! sample.
//!
//! Grid positions outside the closed source extent
//! `[offset, offset + (size - 1) * spacing]` resolve to NaN (resampling) or
//! no value (point sampling).

use gamma_core::{Axis, DataOffset, DataSize, DataSpacing, ImageData, ImageError, ImagePlane};

/// Tolerance, in index units, for positions that round just past the first
/// or last voxel center.
const GRID_EPS: f32 = 1e-4;

/// Tolerance in millimeters for sampling along a degenerate (single-sample)
/// axis, whose spacing may be 0.
const DEGENERATE_AXIS_EPS_MM: f32 = 1e-3;

/// Fractional grid coordinate of a millimeter position along one axis, or
/// `None` outside the closed extent.
fn grid_coord(offset: f32, spacing: f32, count: u32, position: f32) -> Option<f32> {
    if count == 1 {
        return if (position - offset).abs() <= DEGENERATE_AXIS_EPS_MM {
            Some(0.0)
        } else {
            None
        };
    }
    let last = (count - 1) as f32;
    let t = (position - offset) / spacing;
    if t < 0.0 {
        if t >= -GRID_EPS {
            Some(0.0)
        } else {
            None
        }
    } else if t > last {
        if t <= last + GRID_EPS {
            Some(last)
        } else {
            None
        }
    } else {
        Some(t)
    }
}

struct AxisCoord {
    lo: u32,
    hi: u32,
    frac: f32,
}

fn decompose(t: f32, count: u32) -> AxisCoord {
    if count == 1 {
        return AxisCoord { lo: 0, hi: 0, frac: 0.0 };
    }
    let mut lo = t.floor() as u32;
    if lo > count - 2 {
        lo = count - 2;
    }
    AxisCoord { lo, hi: lo + 1, frac: t - lo as f32 }
}

#[inline]
fn lerp(v0: f32, v1: f32, frac: f32) -> f32 {
    if frac == 0.0 {
        v0
    } else if frac == 1.0 {
        v1
    } else {
        v0 * (1.0 - frac) + v1 * frac
    }
}

/// Trilinear sample at fractional grid coordinates (already bounds-checked).
fn sample_at_coords(img: &ImageData, tz: f32, ty: f32, tx: f32) -> f32 {
    let size = img.size();
    let cz = decompose(tz, size.frames);
    let cy = decompose(ty, size.rows);
    let cx = decompose(tx, size.columns);

    let plane = |f: u32| {
        let v0 = lerp(img.get(f, cy.lo, cx.lo), img.get(f, cy.lo, cx.hi), cx.frac);
        let v1 = lerp(img.get(f, cy.hi, cx.lo), img.get(f, cy.hi, cx.hi), cx.frac);
        lerp(v0, v1, cy.frac)
    };

    if cz.frac == 0.0 {
        plane(cz.lo)
    } else if cz.frac == 1.0 {
        plane(cz.hi)
    } else {
        lerp(plane(cz.lo), plane(cz.hi), cz.frac)
    }
}

/// Bilinear sample of one frame at millimeter position (y, x), or `None`
/// outside the in-plane extent.
pub fn bilinear_at_point(img: &ImageData, frame: u32, y: f32, x: f32) -> Option<f32> {
    let size = img.size();
    let offset = img.offset();
    let spacing = img.spacing();
    let ty = grid_coord(offset.rows, spacing.rows, size.rows, y)?;
    let tx = grid_coord(offset.columns, spacing.columns, size.columns, x)?;
    Some(sample_at_coords(img, frame as f32, ty, tx))
}

/// Trilinear sample at millimeter position (z, y, x), or `None` outside the
/// image.
pub fn trilinear_at_point(img: &ImageData, z: f32, y: f32, x: f32) -> Option<f32> {
    let size = img.size();
    let offset = img.offset();
    let spacing = img.spacing();
    let tz = grid_coord(offset.frames, spacing.frames, size.frames, z)?;
    let ty = grid_coord(offset.rows, spacing.rows, size.rows, y)?;
    let tx = grid_coord(offset.columns, spacing.columns, size.columns, x)?;
    Some(sample_at_coords(img, tz, ty, tx))
}

/// Target grid of one output axis.
#[derive(Clone, Copy)]
struct AxisGrid {
    count: u32,
    offset: f32,
    spacing: f32,
    /// false: carry source voxel indices through unchanged.
    interpolate: bool,
}

impl AxisGrid {
    fn passthrough(count: u32, offset: f32, spacing: f32) -> Self {
        Self { count, offset, spacing, interpolate: false }
    }

    /// New grid spanning the closed source extent from `offset` with the
    /// given spacing.
    fn spanning(
        src_offset: f32,
        src_spacing: f32,
        src_count: u32,
        offset: f32,
        spacing: f32,
    ) -> Result<Self, ImageError> {
        if spacing <= 0.0 {
            return Err(ImageError::Spacing(spacing));
        }
        let extent =
            src_offset as f64 + (src_count - 1) as f64 * src_spacing as f64 - offset as f64;
        let count = if extent < 0.0 {
            1
        } else {
            (extent / spacing as f64 + 1e-9).floor() as u32 + 1
        };
        Ok(Self { count, offset, spacing, interpolate: true })
    }
}

/// Resample an image onto the given per-axis target grids.
fn resample(img: &ImageData, z: AxisGrid, y: AxisGrid, x: AxisGrid) -> Result<ImageData, ImageError> {
    let size = img.size();
    let offset = img.offset();
    let spacing = img.spacing();

    let coord = |grid: &AxisGrid,
                 index: u32,
                 src_offset: f32,
                 src_spacing: f32,
                 src_count: u32|
     -> Option<f32> {
        if grid.interpolate {
            let position = grid.offset as f64 + index as f64 * grid.spacing as f64;
            grid_coord(src_offset, src_spacing, src_count, position as f32)
        } else {
            Some(index as f32)
        }
    };

    let total = z.count as usize * y.count as usize * x.count as usize;
    let mut data = Vec::with_capacity(total);
    for f in 0..z.count {
        let tz = coord(&z, f, offset.frames, spacing.frames, size.frames);
        for r in 0..y.count {
            let ty = coord(&y, r, offset.rows, spacing.rows, size.rows);
            for c in 0..x.count {
                let tx = coord(&x, c, offset.columns, spacing.columns, size.columns);
                let value = match (tz, ty, tx) {
                    (Some(tz), Some(ty), Some(tx)) => sample_at_coords(img, tz, ty, tx),
                    _ => f32::NAN,
                };
                data.push(value);
            }
        }
    }

    ImageData::new(
        data,
        DataSize::new(z.count, y.count, x.count),
        DataOffset::new(z.offset, y.offset, x.offset),
        DataSpacing::new(z.spacing, y.spacing, x.spacing),
    )
}

fn source_grid(img: &ImageData, axis: Axis) -> (u32, f32, f32) {
    let size = img.size();
    let offset = img.offset();
    let spacing = img.spacing();
    match axis {
        Axis::Z => (size.frames, offset.frames, spacing.frames),
        Axis::Y => (size.rows, offset.rows, spacing.rows),
        Axis::X => (size.columns, offset.columns, spacing.columns),
    }
}

fn axis_grids(
    img: &ImageData,
    z: Option<(f32, f32)>,
    y: Option<(f32, f32)>,
    x: Option<(f32, f32)>,
) -> Result<(AxisGrid, AxisGrid, AxisGrid), ImageError> {
    let grid = |axis: Axis, target: Option<(f32, f32)>| -> Result<AxisGrid, ImageError> {
        let (count, src_offset, src_spacing) = source_grid(img, axis);
        match target {
            Some((offset, spacing)) => {
                AxisGrid::spanning(src_offset, src_spacing, count, offset, spacing)
            }
            None => Ok(AxisGrid::passthrough(count, src_offset, src_spacing)),
        }
    };
    Ok((grid(Axis::Z, z)?, grid(Axis::Y, y)?, grid(Axis::X, x)?))
}

/// Resample along a single axis to a new spacing, keeping the axis offset.
pub fn linear_along_axis(img: &ImageData, spacing: f32, axis: Axis) -> Result<ImageData, ImageError> {
    let (_, src_offset, _) = source_grid(img, axis);
    linear_along_axis_with_offset(img, src_offset, spacing, axis)
}

/// Resample along a single axis to a new offset and spacing.
pub fn linear_along_axis_with_offset(
    img: &ImageData,
    offset: f32,
    spacing: f32,
    axis: Axis,
) -> Result<ImageData, ImageError> {
    let target = Some((offset, spacing));
    let (z, y, x) = match axis {
        Axis::Z => axis_grids(img, target, None, None)?,
        Axis::Y => axis_grids(img, None, target, None)?,
        Axis::X => axis_grids(img, None, None, target)?,
    };
    resample(img, z, y, x)
}

/// Resample the two in-plane axes of the given plane to new spacings,
/// keeping their offsets. For the axial plane these are (rows, columns); for
/// coronal (frames, columns); for sagittal (frames, rows).
pub fn bilinear_on_plane(
    img: &ImageData,
    spacing_first: f32,
    spacing_second: f32,
    plane: ImagePlane,
) -> Result<ImageData, ImageError> {
    let (first, second) = plane_axes(plane);
    let (_, first_offset, _) = source_grid(img, first);
    let (_, second_offset, _) = source_grid(img, second);
    bilinear_on_plane_with_offset(
        img,
        first_offset,
        second_offset,
        spacing_first,
        spacing_second,
        plane,
    )
}

/// Resample the two in-plane axes of the given plane to new offsets and
/// spacings.
pub fn bilinear_on_plane_with_offset(
    img: &ImageData,
    offset_first: f32,
    offset_second: f32,
    spacing_first: f32,
    spacing_second: f32,
    plane: ImagePlane,
) -> Result<ImageData, ImageError> {
    let first = Some((offset_first, spacing_first));
    let second = Some((offset_second, spacing_second));
    let (z, y, x) = match plane {
        ImagePlane::Axial => axis_grids(img, None, first, second)?,
        ImagePlane::Coronal => axis_grids(img, first, None, second)?,
        ImagePlane::Sagittal => axis_grids(img, first, second, None)?,
    };
    resample(img, z, y, x)
}

fn plane_axes(plane: ImagePlane) -> (Axis, Axis) {
    match plane {
        ImagePlane::Axial => (Axis::Y, Axis::X),
        ImagePlane::Coronal => (Axis::Z, Axis::X),
        ImagePlane::Sagittal => (Axis::Z, Axis::Y),
    }
}

/// Resample all three axes to new spacings, keeping the image offset.
pub fn trilinear(img: &ImageData, spacing: DataSpacing) -> Result<ImageData, ImageError> {
    trilinear_with_offset(img, img.offset(), spacing)
}

/// Resample all three axes to a new offset and spacing.
pub fn trilinear_with_offset(
    img: &ImageData,
    offset: DataOffset,
    spacing: DataSpacing,
) -> Result<ImageData, ImageError> {
    let (z, y, x) = axis_grids(
        img,
        Some((offset.frames, spacing.frames)),
        Some((offset.rows, spacing.rows)),
        Some((offset.columns, spacing.columns)),
    )?;
    resample(img, z, y, x)
}

/// Resample `img` onto the full geometry (size, offset, spacing) of
/// `reference`. Positions outside `img` become NaN.
pub fn trilinear_on_grid(img: &ImageData, reference: &ImageData) -> Result<ImageData, ImageError> {
    let ref_size = reference.size();
    let ref_offset = reference.offset();
    let ref_spacing = reference.spacing();
    let z = AxisGrid {
        count: ref_size.frames,
        offset: ref_offset.frames,
        spacing: ref_spacing.frames,
        interpolate: true,
    };
    let y = AxisGrid {
        count: ref_size.rows,
        offset: ref_offset.rows,
        spacing: ref_spacing.rows,
        interpolate: true,
    };
    let x = AxisGrid {
        count: ref_size.columns,
        offset: ref_offset.columns,
        spacing: ref_spacing.columns,
        interpolate: true,
    };
    resample(img, z, y, x)
}

/// Resample a single axis of `img` onto the grid `reference` uses for that
/// axis, keeping the other two grids. The output has exactly `reference`'s
/// count, offset and spacing along the chosen axis.
pub fn linear_on_reference_grid(
    img: &ImageData,
    reference: &ImageData,
    axis: Axis,
) -> Result<ImageData, ImageError> {
    let (ref_count, ref_offset, ref_spacing) = source_grid(reference, axis);
    let target =
        AxisGrid { count: ref_count, offset: ref_offset, spacing: ref_spacing, interpolate: true };
    let passthrough = |a: Axis| {
        let (count, offset, spacing) = source_grid(img, a);
        AxisGrid::passthrough(count, offset, spacing)
    };
    let (z, y, x) = match axis {
        Axis::Z => (target, passthrough(Axis::Y), passthrough(Axis::X)),
        Axis::Y => (passthrough(Axis::Z), target, passthrough(Axis::X)),
        Axis::X => (passthrough(Axis::Z), passthrough(Axis::Y), target),
    };
    resample(img, z, y, x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use gamma_core::{DataOffset, DataSpacing};

    fn image_1d(values: &[f32], offset: f32, spacing: f32) -> ImageData {
        ImageData::from_image_2d(
            &[values.to_vec()],
            DataOffset::new(0.0, 0.0, offset),
            DataSpacing::new(0.0, 1.0, spacing),
        )
        .unwrap()
    }

    fn image_2x2(values: [[f32; 2]; 2]) -> ImageData {
        ImageData::from_image_2d(
            &[values[0].to_vec(), values[1].to_vec()],
            DataOffset::new(0.0, 0.0, 0.0),
            DataSpacing::new(0.0, 1.0, 1.0),
        )
        .unwrap()
    }

    #[test]
    fn test_point_sampling_on_grid_and_between() {
        let img = image_2x2([[0.0, 1.0], [2.0, 3.0]]);
        assert_eq!(bilinear_at_point(&img, 0, 0.0, 0.0), Some(0.0));
        assert_eq!(bilinear_at_point(&img, 0, 1.0, 1.0), Some(3.0));
        assert_approx_eq!(bilinear_at_point(&img, 0, 0.5, 0.5).unwrap(), 1.5, 1e-6);
        assert_approx_eq!(bilinear_at_point(&img, 0, 0.0, 0.25).unwrap(), 0.25, 1e-6);
    }

    #[test]
    fn test_point_sampling_outside_is_none() {
        let img = image_2x2([[0.0, 1.0], [2.0, 3.0]]);
        assert_eq!(bilinear_at_point(&img, 0, -0.5, 0.0), None);
        assert_eq!(bilinear_at_point(&img, 0, 0.0, 1.5), None);
    }

    #[test]
    fn test_on_grid_sample_ignores_nan_neighbor() {
        let img = image_2x2([[1.0, f32::NAN], [2.0, 3.0]]);
        assert_eq!(bilinear_at_point(&img, 0, 0.0, 0.0), Some(1.0));
        assert!(bilinear_at_point(&img, 0, 0.0, 0.5).unwrap().is_nan());
    }

    #[test]
    fn test_trilinear_at_point() {
        let img = ImageData::from_image_3d(
            &[
                vec![vec![0.0, 0.0], vec![0.0, 0.0]],
                vec![vec![2.0, 2.0], vec![2.0, 2.0]],
            ],
            DataOffset::new(0.0, 0.0, 0.0),
            DataSpacing::new(2.0, 1.0, 1.0),
        )
        .unwrap();
        assert_approx_eq!(trilinear_at_point(&img, 1.0, 0.5, 0.5).unwrap(), 1.0, 1e-6);
        assert_eq!(trilinear_at_point(&img, 2.0, 0.0, 0.0), Some(2.0));
        assert_eq!(trilinear_at_point(&img, 2.1, 0.0, 0.0), None);
    }

    #[test]
    fn test_degenerate_frame_axis_sampling() {
        let img = image_1d(&[1.0, 2.0], 0.0, 1.0);
        assert_eq!(trilinear_at_point(&img, 0.0, 0.0, 1.0), Some(2.0));
        assert_eq!(trilinear_at_point(&img, 0.5, 0.0, 1.0), None);
    }

    #[test]
    fn test_linear_along_axis_halved_spacing() {
        let img = image_1d(&[0.0, 2.0, 4.0], 1.0, 2.0);
        let out = linear_along_axis(&img, 1.0, Axis::X).unwrap();
        assert_eq!(out.size().columns, 5);
        assert_eq!(out.offset().columns, 1.0);
        assert_eq!(out.spacing().columns, 1.0);
        let expected = [0.0, 1.0, 2.0, 3.0, 4.0];
        for (i, &e) in expected.iter().enumerate() {
            assert_approx_eq!(out.get_index(i), e, 1e-6);
        }
    }

    #[test]
    fn test_linear_along_axis_with_offset_outside_is_nan() {
        let img = image_1d(&[0.0, 2.0, 4.0], 0.0, 1.0);
        let out = linear_along_axis_with_offset(&img, -1.0, 1.0, Axis::X).unwrap();
        // grid: -1, 0, 1, 2 — first sample precedes the image
        assert_eq!(out.size().columns, 4);
        assert!(out.get_index(0).is_nan());
        assert_eq!(out.get_index(1), 0.0);
        assert_eq!(out.get_index(3), 4.0);
    }

    #[test]
    fn test_resampling_is_idempotent_on_own_grid() {
        let img = ImageData::from_image_3d(
            &[
                vec![vec![1.0, 2.5], vec![3.5, 4.0]],
                vec![vec![5.25, 6.0], vec![7.0, 8.5]],
            ],
            DataOffset::new(-3.0, 1.5, 0.0),
            DataSpacing::new(2.0, 1.5, 0.5),
        )
        .unwrap();
        let out = trilinear(&img, img.spacing()).unwrap();
        assert_eq!(out.size(), img.size());
        for i in 0..img.len() {
            assert_approx_eq!(out.get_index(i), img.get_index(i), 1e-6);
        }
    }

    #[test]
    fn test_resampling_is_linear_in_doses() {
        let offset = DataOffset::new(0.0, 0.0, 0.0);
        let spacing = DataSpacing::new(0.0, 1.0, 1.0);
        let a = ImageData::from_image_2d(&[vec![1.0, 3.0], vec![2.0, 5.0]], offset, spacing).unwrap();
        let b = ImageData::from_image_2d(&[vec![4.0, 0.0], vec![1.0, 2.0]], offset, spacing).unwrap();
        let combined_data: Vec<f32> = a
            .data()
            .iter()
            .zip(b.data())
            .map(|(&va, &vb)| 2.0 * va + 0.5 * vb)
            .collect();
        let combined =
            ImageData::new(combined_data, a.size(), offset, spacing).unwrap();

        let ra = bilinear_on_plane(&a, 0.5, 0.5, ImagePlane::Axial).unwrap();
        let rb = bilinear_on_plane(&b, 0.5, 0.5, ImagePlane::Axial).unwrap();
        let rc = bilinear_on_plane(&combined, 0.5, 0.5, ImagePlane::Axial).unwrap();
        for i in 0..rc.len() {
            assert_approx_eq!(rc.get_index(i), 2.0 * ra.get_index(i) + 0.5 * rb.get_index(i), 1e-5);
        }
    }

    #[test]
    fn test_trilinear_on_grid_matches_reference_geometry() {
        let eval = ImageData::from_image_2d(
            &[vec![0.0, 1.0], vec![2.0, 3.0]],
            DataOffset::new(0.0, -1.0, 0.0),
            DataSpacing::new(0.0, 1.0, 1.0),
        )
        .unwrap();
        let reference = ImageData::from_image_2d(
            &[vec![0.0, 0.0], vec![0.0, 0.0]],
            DataOffset::new(0.0, -1.0, 0.0),
            DataSpacing::new(0.0, 0.5, 0.5),
        )
        .unwrap();
        let out = trilinear_on_grid(&eval, &reference).unwrap();
        assert_eq!(out.size(), reference.size());
        assert_eq!(out.offset(), reference.offset());
        assert_eq!(out.spacing(), reference.spacing());
        assert_approx_eq!(out.get(0, 1, 1), 1.5, 1e-6);
    }

    #[test]
    fn test_rejects_nonpositive_spacing() {
        let img = image_1d(&[0.0, 1.0], 0.0, 1.0);
        assert!(matches!(
            linear_along_axis(&img, 0.0, Axis::X),
            Err(ImageError::Spacing(_))
        ));
    }

    #[test]
    fn test_linear_on_reference_grid_z() {
        let eval = ImageData::from_image_3d(
            &[
                vec![vec![0.0, 0.0], vec![0.0, 0.0]],
                vec![vec![4.0, 4.0], vec![4.0, 4.0]],
            ],
            DataOffset::new(0.0, 0.0, 0.0),
            DataSpacing::new(2.0, 1.0, 1.0),
        )
        .unwrap();
        let reference = ImageData::from_image_3d(
            &[
                vec![vec![0.0; 2]; 2],
                vec![vec![0.0; 2]; 2],
                vec![vec![0.0; 2]; 2],
            ],
            DataOffset::new(0.0, 0.0, 0.0),
            DataSpacing::new(1.0, 1.0, 1.0),
        )
        .unwrap();
        let out = linear_on_reference_grid(&eval, &reference, Axis::Z).unwrap();
        assert_eq!(out.size().frames, 3);
        assert_eq!(out.size().rows, 2);
        assert_eq!(out.get(0, 0, 0), 0.0);
        assert_approx_eq!(out.get(1, 0, 0), 2.0, 1e-6);
        assert_eq!(out.get(2, 1, 1), 4.0);
    }
}
