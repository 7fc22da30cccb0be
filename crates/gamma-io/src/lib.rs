//! File format support for dose images.
//!
//! MetaImage files are read and written directly; RT-Dose DICOM input is
//! specified as a contract (`RtDoseSource`) that a DICOM-backed reader
//! implements.

pub mod metaimage;
pub mod rtdose;

pub use metaimage::{read_meta_image, write_meta_image, MetaImageError};
pub use rtdose::{dose_image, RtDoseError, RtDoseSource};
