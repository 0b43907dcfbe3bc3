//! Image decoding and normalization.
//!
//! Turns an uploaded file (standard raster or DICOM) into the fixed-size
//! RGB array the feature extractor operates on. DICOM frames are min-max
//! rescaled to 8-bit grayscale before channel replication.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};

use crate::capabilities::Capabilities;
use crate::error::CoreError;

/// Side length of the normalized image fed to feature extraction.
pub const NORMALIZED_SIZE: u32 = 512;

/// Decode the file at `path` into a 512x512 RGB image.
///
/// DICOM files are decoded via the DICOM pipeline when the capability is
/// available; everything else (and DICOM files on builds without the codec)
/// goes through standard raster loading. Non-RGB images are converted by
/// channel replication. Any failure is a [`CoreError::Decode`].
pub fn decode_image(
    path: &Path,
    is_dicom: bool,
    caps: &Capabilities,
) -> Result<RgbImage, CoreError> {
    let img = if is_dicom && caps.dicom_available {
        decode_dicom(path)?
    } else {
        image::open(path).map_err(|e| CoreError::Decode(format!("Failed to open image: {e}")))?
    };

    Ok(img
        .resize_exact(NORMALIZED_SIZE, NORMALIZED_SIZE, FilterType::Triangle)
        .to_rgb8())
}

/// Read a DICOM file and rescale its first frame to an 8-bit grayscale image.
///
/// The full pixel value range present in the frame is mapped linearly onto
/// [0, 255], matching how scanner output with arbitrary bit depth is
/// normalized for display.
#[cfg(feature = "dicom")]
fn decode_dicom(path: &Path) -> Result<DynamicImage, CoreError> {
    use dicom_pixeldata::PixelDecoder;

    let obj = dicom_object::open_file(path)
        .map_err(|e| CoreError::Decode(format!("Failed to read DICOM file: {e}")))?;

    let decoded = obj
        .decode_pixel_data()
        .map_err(|e| CoreError::Decode(format!("Failed to decode DICOM pixel data: {e}")))?;

    let rows = decoded.rows();
    let columns = decoded.columns();
    let samples: Vec<f64> = decoded
        .to_vec()
        .map_err(|e| CoreError::Decode(format!("Failed to extract DICOM samples: {e}")))?;

    let frame_len = rows as usize * columns as usize;
    if frame_len == 0 || samples.len() < frame_len {
        return Err(CoreError::Decode(format!(
            "DICOM pixel data has {} samples, expected at least {frame_len}",
            samples.len()
        )));
    }
    let frame = &samples[..frame_len];

    let min = frame.iter().copied().fold(f64::INFINITY, f64::min);
    let max = frame.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // A flat frame rescales to all-zero rather than dividing by zero.
    let span = if max > min { max - min } else { 1.0 };

    let pixels: Vec<u8> = frame
        .iter()
        .map(|&v| ((v - min) / span * 255.0) as u8)
        .collect();

    let gray = image::GrayImage::from_raw(columns, rows, pixels)
        .ok_or_else(|| CoreError::Decode("DICOM pixel buffer size mismatch".into()))?;

    Ok(DynamicImage::ImageLuma8(gray))
}

#[cfg(not(feature = "dicom"))]
fn decode_dicom(_path: &Path) -> Result<DynamicImage, CoreError> {
    Err(CoreError::Decode(
        "DICOM support is not compiled into this build".into(),
    ))
}
