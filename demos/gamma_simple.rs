//! Smallest possible gamma comparison: two handwritten 2D images, classic
//! method, 3%G/3mm.

use gamma_core::{fmt, DataOffset, DataSpacing, GammaNormalization, GammaParameters, ImageData, ImagePlane};
use gamma_engine::{gamma_index_2d, GammaMethod};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let ref_img = ImageData::from_image_2d(
        &[vec![0.93, 0.95], vec![0.97, 1.00]],
        DataOffset::new(0.0, 0.0, -1.0),
        DataSpacing::new(2.0, 2.0, 2.0),
    )?;
    let eval_img = ImageData::from_image_2d(
        &[vec![0.93, 0.96], vec![0.90, 1.02]],
        DataOffset::new(0.0, 1.0, 0.0),
        DataSpacing::new(2.0, 2.0, 2.0),
    )?;

    println!("Reference image:");
    println!("{}", fmt::image_2d_to_string(&ref_img.image_2d(0, ImagePlane::Axial)?, Some(2)));
    println!("Evaluated image:");
    println!("{}", fmt::image_2d_to_string(&eval_img.image_2d(0, ImagePlane::Axial)?, Some(2)));

    let params = GammaParameters {
        dd_threshold: 3.0,
        dta_threshold: 3.0,
        normalization: GammaNormalization::Global,
        global_norm_dose: ref_img.max(),
        dose_cutoff: 0.0,
        max_search_distance: 0.0,
        step_size: 0.0,
    };

    let result = gamma_index_2d(&ref_img, &eval_img, &params, GammaMethod::Classic)?;

    // expected:
    // [[0.471, 0.577],
    //  [1.106, 0.816]]
    println!("Gamma index image:");
    println!("{}", fmt::image_2d_to_string(&result.image_2d(0, ImagePlane::Axial)?, Some(3)));

    println!("GIPR: {:.2}%", result.passing_rate() * 100.0);
    println!("Gamma mean: {:.6}", result.mean_gamma());
    println!("Gamma min: {:.6}", result.min_gamma());
    println!("Gamma max: {:.6}", result.max_gamma());
    Ok(())
}
