//! Gamma index acceptance criteria.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the absolute dose difference criterion is normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GammaNormalization {
    /// A fixed dose chosen by the caller (e.g. the reference maximum).
    Global,
    /// The dose of the reference voxel under evaluation.
    Local,
}

impl fmt::Display for GammaNormalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GammaNormalization::Global => write!(f, "G"),
            GammaNormalization::Local => write!(f, "L"),
        }
    }
}

/// Parameters of a gamma index calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GammaParameters {
    /// Acceptance criterion for dose difference (DD) in percent.
    pub dd_threshold: f32,
    /// Acceptance criterion for distance to agreement (DTA) in millimeters.
    pub dta_threshold: f32,
    /// Type of dose difference normalization.
    pub normalization: GammaNormalization,
    /// Dose used for global normalization.
    pub global_norm_dose: f32,
    /// Reference dose below which no gamma value is computed (NaN output).
    pub dose_cutoff: f32,
    /// Radius of the circle/sphere searched by the Wendling method, in
    /// millimeters.
    #[serde(default)]
    pub max_search_distance: f32,
    /// Step of the search grid used by the Wendling method, in millimeters.
    #[serde(default)]
    pub step_size: f32,
}

impl fmt::Display for GammaParameters {
    /// Conventional criteria notation, e.g. `3%G/3mm`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}%{}/{}mm",
            self.dd_threshold, self.normalization, self.dta_threshold
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let params = GammaParameters {
            dd_threshold: 3.0,
            dta_threshold: 3.0,
            normalization: GammaNormalization::Global,
            global_norm_dose: 2.5,
            dose_cutoff: 0.0,
            max_search_distance: 10.0,
            step_size: 0.3,
        };
        assert_eq!(params.to_string(), "3%G/3mm");
    }

    #[test]
    fn test_serde_roundtrip() {
        let params = GammaParameters {
            dd_threshold: 2.0,
            dta_threshold: 2.5,
            normalization: GammaNormalization::Local,
            global_norm_dose: 0.0,
            dose_cutoff: 0.1,
            max_search_distance: 5.0,
            step_size: 0.25,
        };
        let json = serde_json::to_string(&params).unwrap();
        let back: GammaParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(params, back);
    }

    #[test]
    fn test_search_fields_default_to_zero() {
        let json = r#"{
            "dd_threshold": 3.0,
            "dta_threshold": 3.0,
            "normalization": "Global",
            "global_norm_dose": 1.0,
            "dose_cutoff": 0.0
        }"#;
        let params: GammaParameters = serde_json::from_str(json).unwrap();
        assert_eq!(params.max_search_distance, 0.0);
        assert_eq!(params.step_size, 0.0);
    }
}
