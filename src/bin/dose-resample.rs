//! dose-resample — Resample a dose image onto a new grid.

use clap::Parser;
use std::error::Error;

use gamma_core::{Axis, ImageData};
use gamma_engine::interp;
use gamma_io::{read_meta_image, write_meta_image};

#[derive(Parser)]
#[command(
    name = "dose-resample",
    version,
    about = "Resample a dose image onto a new grid"
)]
struct Cli {
    /// Input dose image (MetaImage .mha)
    input: String,

    /// New spacing along Z in millimeters
    #[arg(long)]
    spacing_z: Option<f32>,

    /// New spacing along Y in millimeters
    #[arg(long)]
    spacing_y: Option<f32>,

    /// New spacing along X in millimeters
    #[arg(long)]
    spacing_x: Option<f32>,

    /// New offset along Z in millimeters (requires --spacing-z)
    #[arg(long)]
    offset_z: Option<f32>,

    /// New offset along Y in millimeters (requires --spacing-y)
    #[arg(long)]
    offset_y: Option<f32>,

    /// New offset along X in millimeters (requires --spacing-x)
    #[arg(long)]
    offset_x: Option<f32>,

    /// Output MetaImage file
    #[arg(short, long)]
    output: String,
}

fn resample_axis(
    img: ImageData,
    axis: Axis,
    spacing: Option<f32>,
    offset: Option<f32>,
) -> Result<ImageData, Box<dyn Error>> {
    match (spacing, offset) {
        (Some(spacing), Some(offset)) => {
            Ok(interp::linear_along_axis_with_offset(&img, offset, spacing, axis)?)
        }
        (Some(spacing), None) => Ok(interp::linear_along_axis(&img, spacing, axis)?),
        (None, Some(_)) => {
            Err(format!("an offset along {axis} requires a spacing along {axis}").into())
        }
        (None, None) => Ok(img),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();
    let cli = Cli::parse();

    if cli.spacing_z.is_none() && cli.spacing_y.is_none() && cli.spacing_x.is_none() {
        return Err("nothing to do: pass at least one of --spacing-z/-y/-x".into());
    }

    let img = read_meta_image(&cli.input)?;
    log::info!(
        "input: size {}, offset {}, spacing {}",
        img.size(),
        img.offset(),
        img.spacing()
    );

    let img = resample_axis(img, Axis::Z, cli.spacing_z, cli.offset_z)?;
    let img = resample_axis(img, Axis::Y, cli.spacing_y, cli.offset_y)?;
    let img = resample_axis(img, Axis::X, cli.spacing_x, cli.offset_x)?;

    log::info!(
        "output: size {}, offset {}, spacing {}",
        img.size(),
        img.offset(),
        img.spacing()
    );
    write_meta_image(&img, &cli.output)?;
    log::info!("resampled image written to {}", cli.output);
    Ok(())
}
