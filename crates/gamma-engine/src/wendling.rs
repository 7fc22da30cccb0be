//! Wendling gamma index kernels: bounded search on a distance-sorted grid of
//! offsets around each reference voxel, sampling the evaluated image with
//! on-the-fly interpolation.
//!
//! The offset table is built once per call and shared read-only by all
//! workers. Because it is sorted by distance, a voxel's search can stop as
//! soon as the distance term alone of the next offset reaches the current
//! best squared gamma; unlike a dose-based cut, that bound can never change
//! the minimum.

use crate::classic::{gamma_sq, reference_delta_sq};
use crate::interp;
use gamma_core::{Axis, GammaParameters, ImageData, ImageError};
use rayon::prelude::*;

/// Keeps offsets whose distance lands on the search radius despite `f32`
/// rounding of `k * step`.
const RADIUS_EPS: f32 = 1.0 / (1 << 20) as f32;

/// Search offset in the axial plane.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PlaneOffset {
    pub dy: f32,
    pub dx: f32,
    pub dist_sq: f32,
}

/// Search offset in the volume.
#[derive(Debug, Clone, Copy)]
pub(crate) struct VolumeOffset {
    pub dz: f32,
    pub dy: f32,
    pub dx: f32,
    pub dist_sq: f32,
}

/// All step multiples within the closed disk of the given radius, center
/// included, sorted by distance.
pub(crate) fn disk_offsets(step: f32, radius: f32) -> Vec<PlaneOffset> {
    let limit = radius * (1.0 + RADIUS_EPS);
    let limit_sq = limit * limit;
    let n = (limit / step).floor() as i32;
    let mut points = Vec::new();
    for iy in -n..=n {
        let dy = iy as f32 * step;
        for ix in -n..=n {
            let dx = ix as f32 * step;
            let dist_sq = dy * dy + dx * dx;
            if dist_sq <= limit_sq {
                points.push(PlaneOffset { dy, dx, dist_sq });
            }
        }
    }
    points.sort_by(|a, b| a.dist_sq.total_cmp(&b.dist_sq));
    points
}

/// All step multiples within the closed sphere of the given radius, center
/// included, sorted by distance.
pub(crate) fn sphere_offsets(step: f32, radius: f32) -> Vec<VolumeOffset> {
    let limit = radius * (1.0 + RADIUS_EPS);
    let limit_sq = limit * limit;
    let n = (limit / step).floor() as i32;
    let mut points = Vec::new();
    for iz in -n..=n {
        let dz = iz as f32 * step;
        for iy in -n..=n {
            let dy = iy as f32 * step;
            let dzy_sq = dz * dz + dy * dy;
            if dzy_sq > limit_sq {
                continue;
            }
            for ix in -n..=n {
                let dx = ix as f32 * step;
                let dist_sq = dzy_sq + dx * dx;
                if dist_sq <= limit_sq {
                    points.push(VolumeOffset { dz, dy, dx, dist_sq });
                }
            }
        }
    }
    points.sort_by(|a, b| a.dist_sq.total_cmp(&b.dist_sq));
    points
}

/// Bounded in-plane search around one reference position on one frame of
/// the evaluated image.
fn search_plane(
    eval_img: &ImageData,
    frame: u32,
    ry: f32,
    rx: f32,
    reference_dose: f32,
    delta_sq: f32,
    dta_sq: f32,
    points: &[PlaneOffset],
) -> f32 {
    let mut min_sq = f32::INFINITY;
    for p in points {
        if p.dist_sq / dta_sq >= min_sq {
            break;
        }
        let Some(eval_dose) = interp::bilinear_at_point(eval_img, frame, ry + p.dy, rx + p.dx)
        else {
            continue;
        };
        if eval_dose.is_nan() {
            continue;
        }
        let candidate = gamma_sq(reference_dose - eval_dose, delta_sq, p.dist_sq, dta_sq);
        if candidate < min_sq {
            min_sq = candidate;
        }
    }
    if min_sq.is_infinite() { f32::NAN } else { min_sq.sqrt() }
}

/// 2D Wendling gamma: disk search with bilinear sampling on the single
/// frame.
pub(crate) fn wendling_2d(
    ref_img: &ImageData,
    eval_img: &ImageData,
    params: &GammaParameters,
) -> Vec<f32> {
    let points = disk_offsets(params.step_size, params.max_search_distance);
    log::debug!(
        "2D search table: {} offsets within {} mm",
        points.len(),
        params.max_search_distance
    );
    let dta_sq = params.dta_threshold * params.dta_threshold;
    let ref_size = ref_img.size();
    let columns = ref_size.columns as usize;

    let ref_ys: Vec<f32> = (0..ref_size.rows).map(|r| ref_img.position(Axis::Y, r)).collect();
    let ref_xs: Vec<f32> = (0..ref_size.columns).map(|c| ref_img.position(Axis::X, c)).collect();

    (0..ref_img.len())
        .into_par_iter()
        .map(|i| {
            let reference_dose = ref_img.get_index(i);
            let Some(delta_sq) = reference_delta_sq(reference_dose, params) else {
                return f32::NAN;
            };
            search_plane(
                eval_img,
                0,
                ref_ys[i / columns],
                ref_xs[i % columns],
                reference_dose,
                delta_sq,
                dta_sq,
                &points,
            )
        })
        .collect()
}

/// 3D Wendling gamma: sphere search with trilinear sampling.
pub(crate) fn wendling_3d(
    ref_img: &ImageData,
    eval_img: &ImageData,
    params: &GammaParameters,
) -> Vec<f32> {
    let points = sphere_offsets(params.step_size, params.max_search_distance);
    log::debug!(
        "3D search table: {} offsets within {} mm",
        points.len(),
        params.max_search_distance
    );
    let dta_sq = params.dta_threshold * params.dta_threshold;
    let ref_size = ref_img.size();
    let rows = ref_size.rows as usize;
    let columns = ref_size.columns as usize;

    let ref_zs: Vec<f32> = (0..ref_size.frames).map(|f| ref_img.position(Axis::Z, f)).collect();
    let ref_ys: Vec<f32> = (0..ref_size.rows).map(|r| ref_img.position(Axis::Y, r)).collect();
    let ref_xs: Vec<f32> = (0..ref_size.columns).map(|c| ref_img.position(Axis::X, c)).collect();

    (0..ref_img.len())
        .into_par_iter()
        .map(|i| {
            let reference_dose = ref_img.get_index(i);
            let Some(delta_sq) = reference_delta_sq(reference_dose, params) else {
                return f32::NAN;
            };
            let rz = ref_zs[i / (rows * columns)];
            let ry = ref_ys[(i / columns) % rows];
            let rx = ref_xs[i % columns];

            let mut min_sq = f32::INFINITY;
            for p in &points {
                if p.dist_sq / dta_sq >= min_sq {
                    break;
                }
                let Some(eval_dose) =
                    interp::trilinear_at_point(eval_img, rz + p.dz, ry + p.dy, rx + p.dx)
                else {
                    continue;
                };
                if eval_dose.is_nan() {
                    continue;
                }
                let candidate =
                    gamma_sq(reference_dose - eval_dose, delta_sq, p.dist_sq, dta_sq);
                if candidate < min_sq {
                    min_sq = candidate;
                }
            }
            if min_sq.is_infinite() { f32::NAN } else { min_sq.sqrt() }
        })
        .collect()
}

/// 2.5D Wendling gamma: the evaluated image is first resampled along Z onto
/// the reference Z grid, then each frame pair is searched in-plane.
pub(crate) fn wendling_2_5d(
    ref_img: &ImageData,
    eval_img: &ImageData,
    params: &GammaParameters,
) -> Result<Vec<f32>, ImageError> {
    let eval_aligned = interp::linear_on_reference_grid(eval_img, ref_img, Axis::Z)?;

    let points = disk_offsets(params.step_size, params.max_search_distance);
    log::debug!(
        "2.5D search table: {} offsets within {} mm",
        points.len(),
        params.max_search_distance
    );
    let dta_sq = params.dta_threshold * params.dta_threshold;
    let ref_size = ref_img.size();
    let rows = ref_size.rows as usize;
    let columns = ref_size.columns as usize;

    let ref_ys: Vec<f32> = (0..ref_size.rows).map(|r| ref_img.position(Axis::Y, r)).collect();
    let ref_xs: Vec<f32> = (0..ref_size.columns).map(|c| ref_img.position(Axis::X, c)).collect();

    let values = (0..ref_img.len())
        .into_par_iter()
        .map(|i| {
            let reference_dose = ref_img.get_index(i);
            let Some(delta_sq) = reference_delta_sq(reference_dose, params) else {
                return f32::NAN;
            };
            let frame = (i / (rows * columns)) as u32;
            search_plane(
                &eval_aligned,
                frame,
                ref_ys[(i / columns) % rows],
                ref_xs[i % columns],
                reference_dose,
                delta_sq,
                dta_sq,
                &points,
            )
        })
        .collect();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use gamma_core::{DataOffset, DataSpacing, GammaNormalization};

    fn params(step: f32, radius: f32) -> GammaParameters {
        GammaParameters {
            dd_threshold: 3.0,
            dta_threshold: 3.0,
            normalization: GammaNormalization::Global,
            global_norm_dose: 1.0,
            dose_cutoff: 0.0,
            max_search_distance: radius,
            step_size: step,
        }
    }

    #[test]
    fn test_disk_offsets_center_first_and_sorted() {
        let points = disk_offsets(1.0, 2.0);
        assert_eq!(points.len(), 13);
        assert_eq!((points[0].dy, points[0].dx), (0.0, 0.0));
        for pair in points.windows(2) {
            assert!(pair[0].dist_sq <= pair[1].dist_sq);
        }
    }

    #[test]
    fn test_disk_offsets_edge_inclusive() {
        // 10 * 0.3 rounds slightly above 3.0 in f32 and must still be kept
        let points = disk_offsets(0.3, 3.0);
        let on_edge = points
            .iter()
            .filter(|p| p.dx == 0.0 && (p.dy.abs() - 3.0).abs() < 1e-5)
            .count();
        assert_eq!(on_edge, 2);
    }

    #[test]
    fn test_sphere_offsets_radius_one() {
        let points = sphere_offsets(1.0, 1.0);
        // center plus the six axis neighbors
        assert_eq!(points.len(), 7);
        assert_eq!(points[0].dist_sq, 0.0);
    }

    #[test]
    fn test_zero_radius_searches_center_only() {
        let points = disk_offsets(1.0, 0.0);
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn test_identity_comparison_is_zero() {
        let img = ImageData::from_image_2d(
            &[vec![0.3, 0.7], vec![1.0, 0.2]],
            DataOffset::new(0.0, 0.0, 0.0),
            DataSpacing::new(0.0, 1.0, 1.0),
        )
        .unwrap();
        let gamma = wendling_2d(&img, &img, &params(0.3, 10.0));
        for value in gamma {
            assert_eq!(value, 0.0);
        }
    }

    #[test]
    fn test_no_sample_in_range_is_nan() {
        let ref_img = ImageData::from_image_2d(
            &[vec![1.0]],
            DataOffset::new(0.0, 0.0, 0.0),
            DataSpacing::new(0.0, 1.0, 1.0),
        )
        .unwrap();
        let eval_img = ImageData::from_image_2d(
            &[vec![1.0]],
            DataOffset::new(0.0, 100.0, 100.0),
            DataSpacing::new(0.0, 1.0, 1.0),
        )
        .unwrap();
        let gamma = wendling_2d(&ref_img, &eval_img, &params(0.5, 5.0));
        assert!(gamma[0].is_nan());
    }

    #[test]
    fn test_wendling_3d_identity() {
        let img = ImageData::from_image_3d(
            &[
                vec![vec![0.5, 0.6], vec![0.7, 0.8]],
                vec![vec![0.9, 1.0], vec![1.1, 1.2]],
            ],
            DataOffset::new(0.0, 0.0, 0.0),
            DataSpacing::new(1.0, 1.0, 1.0),
        )
        .unwrap();
        let gamma = wendling_3d(&img, &img, &params(0.3, 5.0));
        for value in gamma {
            assert_eq!(value, 0.0);
        }
    }

    #[test]
    fn test_wendling_2_5d_aligns_frames() {
        // eval shifted by half a frame spacing along Z: after alignment the
        // interpolated slices agree exactly with the linear ramp
        let ref_img = ImageData::from_image_3d(
            &[
                vec![vec![1.0, 1.0], vec![1.0, 1.0]],
                vec![vec![2.0, 2.0], vec![2.0, 2.0]],
            ],
            DataOffset::new(0.5, 0.0, 0.0),
            DataSpacing::new(1.0, 1.0, 1.0),
        )
        .unwrap();
        let eval_img = ImageData::from_image_3d(
            &[
                vec![vec![0.5, 0.5], vec![0.5, 0.5]],
                vec![vec![1.5, 1.5], vec![1.5, 1.5]],
                vec![vec![2.5, 2.5], vec![2.5, 2.5]],
            ],
            DataOffset::new(0.0, 0.0, 0.0),
            DataSpacing::new(1.0, 1.0, 1.0),
        )
        .unwrap();
        let gamma = wendling_2_5d(&ref_img, &eval_img, &params(0.3, 5.0)).unwrap();
        for value in gamma {
            assert_approx_eq!(value, 0.0, 1e-5);
        }
    }

    #[test]
    fn test_wendling_matches_classic_within_tolerance() {
        let ref_img = ImageData::from_image_2d(
            &[vec![0.93, 0.95], vec![0.97, 1.00]],
            DataOffset::new(0.0, 0.0, -1.0),
            DataSpacing::new(0.0, 1.0, 1.0),
        )
        .unwrap();
        let eval_img = ImageData::from_image_2d(
            &[vec![0.95, 0.97], vec![1.00, 1.03]],
            DataOffset::new(0.0, -1.0, 0.0),
            DataSpacing::new(0.0, 1.0, 1.0),
        )
        .unwrap();
        let p = params(0.3, 30.0);
        let wendling = wendling_2d(&ref_img, &eval_img, &p);
        let classic = crate::classic::classic_2d(&ref_img, &eval_img, &p);
        for (w, c) in wendling.iter().zip(&classic) {
            // interpolated search can only improve on the grid minimum
            assert!(w <= c || (w - c).abs() < 1e-2);
        }
    }
}
