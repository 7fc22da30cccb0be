//! Container for per-voxel gamma index values.

use crate::image::ImageData;
use std::ops::Deref;

/// A gamma index image.
///
/// Carries the reference image's geometry. Voxels hold the gamma value
/// (>= 0) or NaN where the reference voxel was excluded (below the dose
/// cutoff, NaN, or — for the Wendling method — never sampled inside the
/// evaluated image).
#[derive(Debug, Clone, PartialEq)]
pub struct GammaResult {
    image: ImageData,
}

impl GammaResult {
    pub fn new(image: ImageData) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &ImageData {
        &self.image
    }

    pub fn into_image(self) -> ImageData {
        self.image
    }

    /// Fraction of non-NaN voxels with gamma <= 1. Zero when every voxel is
    /// NaN.
    pub fn passing_rate(&self) -> f32 {
        let nansize = self.image.nansize();
        if nansize == 0 {
            return 0.0;
        }
        let passing = self
            .image
            .data()
            .iter()
            .filter(|v| !v.is_nan() && **v <= 1.0)
            .count();
        passing as f32 / nansize as f32
    }

    /// Minimum gamma value, ignoring NaNs.
    pub fn min_gamma(&self) -> f32 {
        self.image.nanmin()
    }

    /// Maximum gamma value, ignoring NaNs.
    pub fn max_gamma(&self) -> f32 {
        self.image.nanmax()
    }

    /// Sum of gamma values, ignoring NaNs.
    pub fn sum_gamma(&self) -> f64 {
        self.image.nansum()
    }

    /// Mean gamma value, ignoring NaNs.
    pub fn mean_gamma(&self) -> f64 {
        self.image.nanmean()
    }

    /// Variance of gamma values, ignoring NaNs.
    pub fn var_gamma(&self) -> f64 {
        self.image.nanvar()
    }
}

impl Deref for GammaResult {
    type Target = ImageData;

    fn deref(&self) -> &ImageData {
        &self.image
    }
}

impl From<ImageData> for GammaResult {
    fn from(image: ImageData) -> Self {
        Self::new(image)
    }
}

impl From<GammaResult> for ImageData {
    fn from(result: GammaResult) -> Self {
        result.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{DataOffset, DataSize, DataSpacing};
    use assert_approx_eq::assert_approx_eq;

    fn result(data: Vec<f32>) -> GammaResult {
        let columns = data.len() as u32;
        GammaResult::new(
            ImageData::new(
                data,
                DataSize::new(1, 1, columns),
                DataOffset::new(0.0, 0.0, 0.0),
                DataSpacing::new(0.0, 1.0, 1.0),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_passing_rate() {
        let res = result(vec![
            f32::NAN,
            0.5,
            0.2,
            0.0,
            1.0,
            0.2,
            f32::NAN,
            1.1,
            3.0,
            0.1,
            f32::NAN,
            f32::NAN,
        ]);
        assert_approx_eq!(res.passing_rate(), 0.75, 1e-6);
        assert_eq!(res.min_gamma(), 0.0);
        assert_eq!(res.max_gamma(), 3.0);
        assert_approx_eq!(res.sum_gamma(), 6.1, 1e-6);
        assert_approx_eq!(res.mean_gamma(), 0.7625, 1e-6);
        assert_approx_eq!(res.var_gamma(), 0.86234375, 1e-6);
        assert_eq!(res.nansize(), 8);
    }

    #[test]
    fn test_passing_rate_all_nan() {
        let res = result(vec![f32::NAN, f32::NAN]);
        assert_eq!(res.passing_rate(), 0.0);
    }

    #[test]
    fn test_deref_exposes_image_api() {
        let res = result(vec![0.5, 1.5]);
        assert_eq!(res.len(), 2);
        assert_eq!(res.size(), DataSize::new(1, 1, 2));
    }
}
