//! gamma-calc — Compare two dose distributions with the gamma index.

use clap::Parser;
use std::error::Error;
use std::fs;

use gamma_core::{fmt, GammaNormalization, GammaParameters, GammaResult, ImagePlane};
use gamma_engine::{gamma_index_2_5d, gamma_index_2d, gamma_index_3d, GammaMethod};
use gamma_io::{read_meta_image, write_meta_image};

#[derive(Parser)]
#[command(
    name = "gamma-calc",
    version,
    about = "Compare two dose distributions with the gamma index"
)]
struct Cli {
    /// Reference dose image (MetaImage .mha)
    reference: String,

    /// Evaluated dose image (MetaImage .mha)
    evaluated: String,

    /// Dose difference criterion in percent
    #[arg(long, default_value_t = 3.0)]
    dd: f32,

    /// Distance to agreement criterion in millimeters
    #[arg(long, default_value_t = 3.0)]
    dta: f32,

    /// Dose difference normalization: global or local
    #[arg(long, default_value = "global")]
    norm: String,

    /// Normalization dose for global mode (default: reference maximum)
    #[arg(long)]
    norm_dose: Option<f32>,

    /// Reference dose below which voxels are excluded (NaN in the output)
    #[arg(long, default_value_t = 0.0)]
    cutoff: f32,

    /// Calculation method: classic or wendling
    #[arg(short, long, default_value = "wendling")]
    method: String,

    /// Dimensionality of the comparison: 2, 2.5 or 3
    #[arg(short, long, default_value = "3")]
    dims: String,

    /// Maximum search distance for the Wendling method in millimeters
    #[arg(long, default_value_t = 10.0)]
    search_distance: f32,

    /// Search step for the Wendling method in millimeters (default: dta / 10)
    #[arg(long)]
    step: Option<f32>,

    /// JSON file with a full gamma parameter record, replacing the criteria
    /// flags
    #[arg(long)]
    params_json: Option<String>,

    /// Write the gamma image to this MetaImage file
    #[arg(short, long)]
    output: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();
    let cli = Cli::parse();

    let ref_img = read_meta_image(&cli.reference)?;
    let eval_img = read_meta_image(&cli.evaluated)?;
    log::info!(
        "reference: size {}, offset {}, spacing {}",
        ref_img.size(),
        ref_img.offset(),
        ref_img.spacing()
    );
    log::info!(
        "evaluated: size {}, offset {}, spacing {}",
        eval_img.size(),
        eval_img.offset(),
        eval_img.spacing()
    );

    let method = match cli.method.as_str() {
        "classic" => GammaMethod::Classic,
        "wendling" => GammaMethod::Wendling,
        other => return Err(format!("unknown method '{other}'").into()),
    };

    let params = match &cli.params_json {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => {
            let normalization = match cli.norm.as_str() {
                "global" => GammaNormalization::Global,
                "local" => GammaNormalization::Local,
                other => return Err(format!("unknown normalization '{other}'").into()),
            };
            GammaParameters {
                dd_threshold: cli.dd,
                dta_threshold: cli.dta,
                normalization,
                global_norm_dose: cli.norm_dose.unwrap_or_else(|| ref_img.nanmax()),
                dose_cutoff: cli.cutoff,
                max_search_distance: cli.search_distance,
                step_size: cli.step.unwrap_or(cli.dta / 10.0),
            }
        }
    };

    log::info!("computing {}D gamma index {} with the {} method", cli.dims, params, method);
    let result = match cli.dims.as_str() {
        "2" => gamma_index_2d(&ref_img, &eval_img, &params, method)?,
        "2.5" => gamma_index_2_5d(&ref_img, &eval_img, &params, method)?,
        "3" => gamma_index_3d(&ref_img, &eval_img, &params, method)?,
        other => return Err(format!("unknown dimensionality '{other}'").into()),
    };

    print_report(&result);

    if let Some(path) = &cli.output {
        write_meta_image(result.image(), path)?;
        log::info!("gamma image written to {path}");
    }

    Ok(())
}

fn print_report(result: &GammaResult) {
    if result.len() <= 64 {
        println!("Gamma index image:");
        println!("{}", fmt::image_3d_to_string(&result.image_3d(ImagePlane::Axial), Some(3)));
    }
    println!("GIPR: {:.2}%", result.passing_rate() * 100.0);
    println!("Gamma mean: {:.6}", result.mean_gamma());
    println!("Gamma min: {:.6}", result.min_gamma());
    println!("Gamma max: {:.6}", result.max_gamma());
    println!("NaN values: {} / {}", result.len() - result.nansize(), result.len());
}
