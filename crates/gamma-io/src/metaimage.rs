//! MetaImage (.mha) reading and writing.
//!
//! The writer emits an ASCII `Key = Value` header followed by the raw
//! `f32` payload in host byte order; the reader accepts either byte order,
//! swapping when the `BinaryDataByteOrderMSB` flag disagrees with the host.
//! Only uncompressed, local-data `MET_FLOAT` images with identity
//! orientation are supported.

use byteorder::{BigEndian, ByteOrder, LittleEndian, NativeEndian};
use gamma_core::{DataOffset, DataSize, DataSpacing, ImageData, ImageError};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetaImageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid MetaImage header: {0}")]
    Header(String),
    #[error("unsupported MetaImage feature: {0}")]
    Unsupported(String),
    #[error("data truncated: expected {expected} bytes of voxel data")]
    Truncated { expected: usize },
    #[error("invalid image geometry: {0}")]
    Image(#[from] ImageError),
}

/// Write an image to a MetaImage file.
pub fn write_meta_image(img: &ImageData, path: impl AsRef<Path>) -> Result<(), MetaImageError> {
    let mut file = BufWriter::new(File::create(path)?);
    write_meta_image_to(img, &mut file)?;
    file.flush()?;
    Ok(())
}

/// Write an image as MetaImage header + payload to a writer.
pub fn write_meta_image_to<W: Write>(img: &ImageData, writer: &mut W) -> Result<(), MetaImageError> {
    let size = img.size();
    let offset = img.offset();
    let mut spacing = img.spacing();
    // a frames spacing of 0 (2D image in the 3D container) is invalid for
    // MetaImage viewers
    if spacing.frames == 0.0 {
        spacing.frames = 1.0;
    }

    let msb = if cfg!(target_endian = "big") { "True" } else { "False" };

    write!(
        writer,
        "ObjectType = Image\n\
         NDims = 3\n\
         DimSize = {} {} {}\n\
         Offset = {} {} {}\n\
         ElementSpacing = {} {} {}\n\
         Orientation = 1 0 0 0 1 0 0 0 1\n\
         BinaryData = True\n\
         BinaryDataByteOrderMSB = {}\n\
         CompressedData = False\n\
         ElementType = MET_FLOAT\n\
         ElementDataFile = LOCAL\n",
        size.columns,
        size.rows,
        size.frames,
        offset.columns,
        offset.rows,
        offset.frames,
        spacing.columns,
        spacing.rows,
        spacing.frames,
        msb,
    )?;

    let mut payload = vec![0u8; img.len() * 4];
    NativeEndian::write_f32_into(img.data(), &mut payload);
    writer.write_all(&payload)?;
    Ok(())
}

/// Read an image from a MetaImage file.
pub fn read_meta_image(path: impl AsRef<Path>) -> Result<ImageData, MetaImageError> {
    let mut file = BufReader::new(File::open(path)?);
    read_meta_image_from(&mut file)
}

fn parse_triplet<T: std::str::FromStr>(key: &str, value: &str) -> Result<[T; 3], MetaImageError> {
    let mut parts = value.split_whitespace();
    let mut out = Vec::with_capacity(3);
    for _ in 0..3 {
        let part = parts
            .next()
            .ok_or_else(|| MetaImageError::Header(format!("{key} needs 3 values")))?;
        let parsed = part
            .parse::<T>()
            .map_err(|_| MetaImageError::Header(format!("invalid {key} value '{part}'")))?;
        out.push(parsed);
    }
    if parts.next().is_some() {
        return Err(MetaImageError::Header(format!("{key} needs exactly 3 values")));
    }
    match out.try_into() {
        Ok(arr) => Ok(arr),
        Err(_) => Err(MetaImageError::Header(format!("{key} needs 3 values"))),
    }
}

/// Read MetaImage header + payload from a reader.
pub fn read_meta_image_from<R: BufRead>(reader: &mut R) -> Result<ImageData, MetaImageError> {
    let mut dim_size: Option<[u32; 3]> = None;
    let mut offset = [0.0f32; 3];
    let mut spacing = [1.0f32; 3];
    let mut msb = false;

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Err(MetaImageError::Header("header ended before ElementDataFile".into()));
        }
        let line = line.trim_end_matches(['\n', '\r']);
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| MetaImageError::Header(format!("malformed line '{line}'")))?;
        let key = key.trim();
        let value = value.trim();

        match key {
            "ObjectType" => {
                if value != "Image" {
                    return Err(MetaImageError::Unsupported(format!("ObjectType {value}")));
                }
            }
            "NDims" => {
                if value != "3" {
                    return Err(MetaImageError::Unsupported(format!("NDims {value}")));
                }
            }
            "DimSize" => dim_size = Some(parse_triplet::<u32>(key, value)?),
            "Offset" => offset = parse_triplet::<f32>(key, value)?,
            "ElementSpacing" => spacing = parse_triplet::<f32>(key, value)?,
            "BinaryData" => {
                if value != "True" {
                    return Err(MetaImageError::Unsupported("ASCII element data".into()));
                }
            }
            "BinaryDataByteOrderMSB" | "ElementByteOrderMSB" => msb = value == "True",
            "CompressedData" => {
                if value != "False" {
                    return Err(MetaImageError::Unsupported("compressed element data".into()));
                }
            }
            "ElementType" => {
                if value != "MET_FLOAT" {
                    return Err(MetaImageError::Unsupported(format!("ElementType {value}")));
                }
            }
            "ElementDataFile" => {
                if value != "LOCAL" {
                    return Err(MetaImageError::Unsupported(format!(
                        "external ElementDataFile {value}"
                    )));
                }
                break;
            }
            // Orientation and any other metadata are not interpreted
            _ => {}
        }
    }

    let [columns, rows, frames] =
        dim_size.ok_or_else(|| MetaImageError::Header("missing DimSize".into()))?;
    let size = DataSize::new(frames, rows, columns);

    let expected = size.total() * 4;
    let mut payload = vec![0u8; expected];
    reader.read_exact(&mut payload).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            MetaImageError::Truncated { expected }
        } else {
            MetaImageError::Io(e)
        }
    })?;

    let mut data = vec![0.0f32; size.total()];
    if msb {
        BigEndian::read_f32_into(&payload, &mut data);
    } else {
        LittleEndian::read_f32_into(&payload, &mut data);
    }

    Ok(ImageData::new(
        data,
        size,
        DataOffset::new(offset[2], offset[1], offset[0]),
        DataSpacing::new(spacing[2], spacing[1], spacing[0]),
    )?)
}
