//! Gamma index computational engine.
//!
//! The gamma index compares a *reference* dose distribution against an
//! *evaluated* one, combining a dose difference criterion with a distance to
//! agreement criterion into one dimensionless per-voxel score; voxels with
//! gamma <= 1 pass. Two methods are provided:
//!
//! - **classic** — exhaustive minimization over the evaluated image grid;
//! - **Wendling** — bounded search on a distance-sorted offset grid with
//!   sub-voxel interpolation, usually much faster.
//!
//! Entry points exist for 2D, 2.5D (slice by slice) and 3D comparisons. The
//! resampling helpers used by the Wendling method are exported in [`interp`]
//! and can also be used to align images before a classic comparison.

mod classic;
mod gamma;
pub mod interp;
mod wendling;

pub use gamma::{
    gamma_index_2_5d, gamma_index_2_5d_classic, gamma_index_2_5d_wendling, gamma_index_2d,
    gamma_index_2d_classic, gamma_index_2d_wendling, gamma_index_3d, gamma_index_3d_classic,
    gamma_index_3d_wendling, GammaError, GammaMethod,
};
