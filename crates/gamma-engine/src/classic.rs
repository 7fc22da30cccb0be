//! Classic gamma index kernels: exhaustive minimization over the evaluated
//! image grid.
//!
//! For every reference voxel the kernels compute the exact minimum of
//! `(D_r - D_e)^2 / dD^2 + |P_e - P_r|^2 / dta^2` over every non-NaN voxel
//! of the evaluated image. Reference voxels that are NaN or below the dose
//! cutoff yield NaN. The only shortcut taken is stopping a scan at a perfect
//! hit (gamma = 0), which cannot change the minimum.
//!
//! The outer loop over reference voxels is data parallel; workers share the
//! read-only images and each produces its own output range.

use gamma_core::{Axis, GammaNormalization, GammaParameters, ImageData};
use rayon::prelude::*;

/// Squared dose difference criterion for one reference voxel, or `None` for
/// an excluded voxel (NaN or below cutoff).
#[inline]
pub(crate) fn reference_delta_sq(reference_dose: f32, params: &GammaParameters) -> Option<f32> {
    if reference_dose.is_nan() || reference_dose < params.dose_cutoff {
        return None;
    }
    let norm_dose = match params.normalization {
        GammaNormalization::Global => params.global_norm_dose,
        GammaNormalization::Local => reference_dose,
    };
    let delta = params.dd_threshold / 100.0 * norm_dose;
    Some(delta * delta)
}

/// Combined squared gamma of one candidate. A zero dose difference is taken
/// before the division so that local normalization of a zero reference dose
/// yields the distance term alone instead of 0/0.
#[inline]
pub(crate) fn gamma_sq(dose_diff: f32, delta_sq: f32, dist_sq: f32, dta_sq: f32) -> f32 {
    let dose_term = if dose_diff == 0.0 { 0.0 } else { dose_diff * dose_diff / delta_sq };
    dose_term + dist_sq / dta_sq
}

fn axis_positions(img: &ImageData, axis: Axis, count: u32) -> Vec<f32> {
    (0..count).map(|i| img.position(axis, i)).collect()
}

/// 2D classic gamma: the Z axis is ignored entirely.
pub(crate) fn classic_2d(
    ref_img: &ImageData,
    eval_img: &ImageData,
    params: &GammaParameters,
) -> Vec<f32> {
    let ref_size = ref_img.size();
    let eval_size = eval_img.size();
    let dta_sq = params.dta_threshold * params.dta_threshold;

    let ref_ys = axis_positions(ref_img, Axis::Y, ref_size.rows);
    let ref_xs = axis_positions(ref_img, Axis::X, ref_size.columns);
    let eval_ys = axis_positions(eval_img, Axis::Y, eval_size.rows);
    let eval_xs = axis_positions(eval_img, Axis::X, eval_size.columns);

    let columns = ref_size.columns as usize;
    let eval_columns = eval_size.columns as usize;
    let eval_data = eval_img.data();

    (0..ref_img.len())
        .into_par_iter()
        .map(|i| {
            let reference_dose = ref_img.get_index(i);
            let Some(delta_sq) = reference_delta_sq(reference_dose, params) else {
                return f32::NAN;
            };
            let ry = ref_ys[i / columns];
            let rx = ref_xs[i % columns];

            let mut min_sq = f32::INFINITY;
            'scan: for (row, &ey) in eval_ys.iter().enumerate() {
                let dy = ey - ry;
                let dy_sq = dy * dy;
                let row_start = row * eval_columns;
                for (col, &ex) in eval_xs.iter().enumerate() {
                    let eval_dose = eval_data[row_start + col];
                    if eval_dose.is_nan() {
                        continue;
                    }
                    let dx = ex - rx;
                    let candidate =
                        gamma_sq(reference_dose - eval_dose, delta_sq, dy_sq + dx * dx, dta_sq);
                    if candidate < min_sq {
                        min_sq = candidate;
                        if min_sq == 0.0 {
                            break 'scan;
                        }
                    }
                }
            }
            if min_sq.is_infinite() { f32::NAN } else { min_sq.sqrt() }
        })
        .collect()
}

/// 3D classic gamma over the full evaluated volume. Also implements the
/// 2.5D variant, which matches every reference frame against all evaluated
/// frames with the Z distance included in the distance term.
pub(crate) fn classic_3d(
    ref_img: &ImageData,
    eval_img: &ImageData,
    params: &GammaParameters,
) -> Vec<f32> {
    let ref_size = ref_img.size();
    let eval_size = eval_img.size();
    let dta_sq = params.dta_threshold * params.dta_threshold;

    let ref_zs = axis_positions(ref_img, Axis::Z, ref_size.frames);
    let ref_ys = axis_positions(ref_img, Axis::Y, ref_size.rows);
    let ref_xs = axis_positions(ref_img, Axis::X, ref_size.columns);
    let eval_zs = axis_positions(eval_img, Axis::Z, eval_size.frames);
    let eval_ys = axis_positions(eval_img, Axis::Y, eval_size.rows);
    let eval_xs = axis_positions(eval_img, Axis::X, eval_size.columns);

    let rows = ref_size.rows as usize;
    let columns = ref_size.columns as usize;
    let eval_rows = eval_size.rows as usize;
    let eval_columns = eval_size.columns as usize;
    let eval_data = eval_img.data();

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
            'scan: for (frame, &ez) in eval_zs.iter().enumerate() {
                let dz = ez - rz;
                let dz_sq = dz * dz;
                for (row, &ey) in eval_ys.iter().enumerate() {
                    let dy = ey - ry;
                    let dzy_sq = dz_sq + dy * dy;
                    let row_start = (frame * eval_rows + row) * eval_columns;
                    for (col, &ex) in eval_xs.iter().enumerate() {
                        let eval_dose = eval_data[row_start + col];
                        if eval_dose.is_nan() {
                            continue;
                        }
                        let dx = ex - rx;
                        let candidate = gamma_sq(
                            reference_dose - eval_dose,
                            delta_sq,
                            dzy_sq + dx * dx,
                            dta_sq,
                        );
                        if candidate < min_sq {
                            min_sq = candidate;
                            if min_sq == 0.0 {
                                break 'scan;
                            }
                        }
                    }
                }
            }
            if min_sq.is_infinite() { f32::NAN } else { min_sq.sqrt() }
        })
        .collect()
}
