//! Gamma index entry points: parameter/geometry validation and dispatch to
//! the classic or Wendling kernels.
//!
//! Every entry either fails before any computation starts or returns a
//! complete result carrying the reference image's geometry.

use crate::{classic, wendling};
use gamma_core::{GammaNormalization, GammaParameters, GammaResult, ImageData};
use std::fmt;
use thiserror::Error;

/// Method used to calculate the gamma index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GammaMethod {
    /// Exhaustive scan of the evaluated image grid.
    Classic,
    /// Bounded, distance-sorted search with sub-voxel interpolation.
    Wendling,
}

impl fmt::Display for GammaMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GammaMethod::Classic => write!(f, "classic"),
            GammaMethod::Wendling => write!(f, "wendling"),
        }
    }
}

#[derive(Error, Debug)]
pub enum GammaError {
    #[error("invalid gamma parameters: {0}")]
    Parameter(String),
    #[error("invalid input geometry: {0}")]
    Geometry(String),
}

fn validate_params(params: &GammaParameters, method: GammaMethod) -> Result<(), GammaError> {
    if params.dd_threshold <= 0.0 {
        return Err(GammaError::Parameter(format!(
            "dose difference threshold must be positive, got {}",
            params.dd_threshold
        )));
    }
    if params.dta_threshold <= 0.0 {
        return Err(GammaError::Parameter(format!(
            "distance to agreement threshold must be positive, got {}",
            params.dta_threshold
        )));
    }
    if params.normalization == GammaNormalization::Global && params.global_norm_dose <= 0.0 {
        return Err(GammaError::Parameter(format!(
            "global normalization dose must be positive, got {}",
            params.global_norm_dose
        )));
    }
    if method == GammaMethod::Wendling {
        if params.step_size <= 0.0 {
            return Err(GammaError::Parameter(format!(
                "step size must be positive, got {}",
                params.step_size
            )));
        }
        if params.max_search_distance < 0.0 {
            return Err(GammaError::Parameter(format!(
                "max search distance must not be negative, got {}",
                params.max_search_distance
            )));
        }
    }
    Ok(())
}

fn validate_images(ref_img: &ImageData, eval_img: &ImageData) -> Result<(), GammaError> {
    if ref_img.is_empty() {
        return Err(GammaError::Geometry("reference image is empty".into()));
    }
    if eval_img.is_empty() {
        return Err(GammaError::Geometry("evaluated image is empty".into()));
    }
    Ok(())
}

fn validate_images_2d(ref_img: &ImageData, eval_img: &ImageData) -> Result<(), GammaError> {
    validate_images(ref_img, eval_img)?;
    if ref_img.size().frames != 1 || eval_img.size().frames != 1 {
        return Err(GammaError::Geometry(format!(
            "2D gamma requires single-frame images, got {} and {} frames",
            ref_img.size().frames,
            eval_img.size().frames
        )));
    }
    Ok(())
}

fn make_result(values: Vec<f32>, ref_img: &ImageData) -> Result<GammaResult, GammaError> {
    ImageData::new(values, ref_img.size(), ref_img.offset(), ref_img.spacing())
        .map(GammaResult::new)
        .map_err(|e| GammaError::Geometry(e.to_string()))
}

/// 2D gamma index of two single-frame images. Only the Y and X coordinates
/// are compared; differing Z offsets have no effect.
pub fn gamma_index_2d(
    ref_img: &ImageData,
    eval_img: &ImageData,
    params: &GammaParameters,
    method: GammaMethod,
) -> Result<GammaResult, GammaError> {
    match method {
        GammaMethod::Classic => gamma_index_2d_classic(ref_img, eval_img, params),
        GammaMethod::Wendling => gamma_index_2d_wendling(ref_img, eval_img, params),
    }
}

/// 2.5D gamma index: slice-by-slice along the axial plane, with the Z axis
/// taken into account in a method-dependent way.
pub fn gamma_index_2_5d(
    ref_img: &ImageData,
    eval_img: &ImageData,
    params: &GammaParameters,
    method: GammaMethod,
) -> Result<GammaResult, GammaError> {
    match method {
        GammaMethod::Classic => gamma_index_2_5d_classic(ref_img, eval_img, params),
        GammaMethod::Wendling => gamma_index_2_5d_wendling(ref_img, eval_img, params),
    }
}

/// 3D gamma index over the full volumes.
pub fn gamma_index_3d(
    ref_img: &ImageData,
    eval_img: &ImageData,
    params: &GammaParameters,
    method: GammaMethod,
) -> Result<GammaResult, GammaError> {
    match method {
        GammaMethod::Classic => gamma_index_3d_classic(ref_img, eval_img, params),
        GammaMethod::Wendling => gamma_index_3d_wendling(ref_img, eval_img, params),
    }
}

/// 2D gamma index using the classic method.
pub fn gamma_index_2d_classic(
    ref_img: &ImageData,
    eval_img: &ImageData,
    params: &GammaParameters,
) -> Result<GammaResult, GammaError> {
    validate_images_2d(ref_img, eval_img)?;
    validate_params(params, GammaMethod::Classic)?;
    make_result(classic::classic_2d(ref_img, eval_img, params), ref_img)
}

/// 2.5D gamma index using the classic method: every reference frame is
/// compared against all evaluated frames, with the Z distance contributing
/// to the distance term.
pub fn gamma_index_2_5d_classic(
    ref_img: &ImageData,
    eval_img: &ImageData,
    params: &GammaParameters,
) -> Result<GammaResult, GammaError> {
    validate_images(ref_img, eval_img)?;
    validate_params(params, GammaMethod::Classic)?;
    make_result(classic::classic_3d(ref_img, eval_img, params), ref_img)
}

/// 3D gamma index using the classic method.
pub fn gamma_index_3d_classic(
    ref_img: &ImageData,
    eval_img: &ImageData,
    params: &GammaParameters,
) -> Result<GammaResult, GammaError> {
    validate_images(ref_img, eval_img)?;
    validate_params(params, GammaMethod::Classic)?;
    make_result(classic::classic_3d(ref_img, eval_img, params), ref_img)
}

/// 2D gamma index using the Wendling method.
pub fn gamma_index_2d_wendling(
    ref_img: &ImageData,
    eval_img: &ImageData,
    params: &GammaParameters,
) -> Result<GammaResult, GammaError> {
    validate_images_2d(ref_img, eval_img)?;
    validate_params(params, GammaMethod::Wendling)?;
    make_result(wendling::wendling_2d(ref_img, eval_img, params), ref_img)
}

/// 2.5D gamma index using the Wendling method: the evaluated image is
/// resampled along Z onto the reference Z grid, then each slice pair is
/// searched in-plane.
pub fn gamma_index_2_5d_wendling(
    ref_img: &ImageData,
    eval_img: &ImageData,
    params: &GammaParameters,
) -> Result<GammaResult, GammaError> {
    validate_images(ref_img, eval_img)?;
    validate_params(params, GammaMethod::Wendling)?;
    let values = wendling::wendling_2_5d(ref_img, eval_img, params)
        .map_err(|e| GammaError::Geometry(e.to_string()))?;
    make_result(values, ref_img)
}

/// 3D gamma index using the Wendling method.
pub fn gamma_index_3d_wendling(
    ref_img: &ImageData,
    eval_img: &ImageData,
    params: &GammaParameters,
) -> Result<GammaResult, GammaError> {
    validate_images(ref_img, eval_img)?;
    validate_params(params, GammaMethod::Wendling)?;
    make_result(wendling::wendling_3d(ref_img, eval_img, params), ref_img)
}
