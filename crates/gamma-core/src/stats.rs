//! Image statistics.
//!
//! Two families: NaN-propagating (`min` … `var`) and NaN-ignoring
//! (`nanmin` … `nanvar`, `nansize`). Sums, means and variances accumulate in
//! `f64` even though voxels are `f32`; variance is the population form,
//! computed from squared deviations about the mean.

use crate::image::ImageData;

impl ImageData {
    /// Minimum voxel value. NaN if the image contains any NaN.
    pub fn min(&self) -> f32 {
        if self.contains_nan() {
            return f32::NAN;
        }
        self.data().iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// Maximum voxel value. NaN if the image contains any NaN.
    pub fn max(&self) -> f32 {
        if self.contains_nan() {
            return f32::NAN;
        }
        self.data().iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Sum of voxel values. NaN if the image contains any NaN.
    pub fn sum(&self) -> f64 {
        self.data().iter().map(|&v| v as f64).sum()
    }

    /// Mean of voxel values. NaN if the image contains any NaN.
    pub fn mean(&self) -> f64 {
        self.sum() / self.len() as f64
    }

    /// Population variance of voxel values. NaN if the image contains any NaN.
    pub fn var(&self) -> f64 {
        let mean = self.mean();
        let sq_dev: f64 = self.data().iter().map(|&v| (v as f64 - mean).powi(2)).sum();
        sq_dev / self.len() as f64
    }

    /// Minimum voxel value, ignoring NaNs. NaN if every voxel is NaN.
    pub fn nanmin(&self) -> f32 {
        let mut min = f32::NAN;
        for &v in self.data() {
            if !v.is_nan() && !(v >= min) {
                min = v;
            }
        }
        min
    }

    /// Maximum voxel value, ignoring NaNs. NaN if every voxel is NaN.
    pub fn nanmax(&self) -> f32 {
        let mut max = f32::NAN;
        for &v in self.data() {
            if !v.is_nan() && !(v <= max) {
                max = v;
            }
        }
        max
    }

    /// Sum of voxel values, ignoring NaNs.
    pub fn nansum(&self) -> f64 {
        self.data()
            .iter()
            .filter(|v| !v.is_nan())
            .map(|&v| v as f64)
            .sum()
    }

    /// Mean of voxel values, ignoring NaNs. NaN if every voxel is NaN.
    pub fn nanmean(&self) -> f64 {
        self.nansum() / self.nansize() as f64
    }

    /// Population variance of voxel values, ignoring NaNs. NaN if every voxel
    /// is NaN.
    pub fn nanvar(&self) -> f64 {
        let mean = self.nanmean();
        let sq_dev: f64 = self
            .data()
            .iter()
            .filter(|v| !v.is_nan())
            .map(|&v| (v as f64 - mean).powi(2))
            .sum();
        sq_dev / self.nansize() as f64
    }

    /// Number of non-NaN voxels.
    pub fn nansize(&self) -> usize {
        self.data().iter().filter(|v| !v.is_nan()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{DataOffset, DataSize, DataSpacing};
    use assert_approx_eq::assert_approx_eq;

    fn image(data: Vec<f32>) -> ImageData {
        let columns = data.len() as u32;
        ImageData::new(
            data,
            DataSize::new(1, 1, columns),
            DataOffset::new(0.0, 0.0, 0.0),
            DataSpacing::new(0.0, 1.0, 1.0),
        )
        .unwrap()
    }

    #[test]
    fn test_plain_statistics() {
        let img = image(vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(img.min(), 1.0);
        assert_eq!(img.max(), 4.0);
        assert_eq!(img.sum(), 10.0);
        assert_eq!(img.mean(), 2.5);
        assert_eq!(img.var(), 1.25);
    }

    #[test]
    fn test_nan_propagates() {
        let img = image(vec![1.0, f32::NAN, 3.0]);
        assert!(img.min().is_nan());
        assert!(img.max().is_nan());
        assert!(img.sum().is_nan());
        assert!(img.mean().is_nan());
        assert!(img.var().is_nan());
    }

    #[test]
    fn test_nan_ignoring_statistics() {
        let img = image(vec![
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
        assert_eq!(img.nansize(), 8);
        assert_eq!(img.len() - img.nansize(), 4);
        assert_eq!(img.nanmin(), 0.0);
        assert_eq!(img.nanmax(), 3.0);
        assert_approx_eq!(img.nansum(), 6.1, 1e-6);
        assert_approx_eq!(img.nanmean(), 0.7625, 1e-6);
        assert_approx_eq!(img.nanvar(), 0.86234375, 1e-6);
    }

    #[test]
    fn test_all_nan() {
        let img = image(vec![f32::NAN, f32::NAN]);
        assert_eq!(img.nansize(), 0);
        assert!(img.nanmin().is_nan());
        assert!(img.nanmax().is_nan());
        assert!(img.nanmean().is_nan());
        assert!(img.nanvar().is_nan());
        assert_eq!(img.nansum(), 0.0);
    }

    #[test]
    fn test_infinity_is_data() {
        let img = image(vec![1.0, f32::INFINITY]);
        assert_eq!(img.nanmax(), f32::INFINITY);
        assert_eq!(img.nansize(), 2);
    }
}
