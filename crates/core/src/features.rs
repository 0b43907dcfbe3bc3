//! Statistical feature extraction over a normalized scan image.
//!
//! Produces the four scalars the risk scorer consumes: grayscale intensity
//! mean/std, Canny edge density, and the variance of a 3x3 Laplacian
//! response (texture complexity).

use image::{GrayImage, ImageBuffer, Luma, RgbImage};
use imageproc::edges::canny;
use imageproc::filter::filter3x3;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Canny hysteresis thresholds.
pub const CANNY_LOW_THRESHOLD: f32 = 50.0;
pub const CANNY_HIGH_THRESHOLD: f32 = 150.0;

/// 3x3 Laplacian (second derivative) kernel.
const K_LAPLACIAN: [f32; 9] = [0.0, 1.0, 0.0, 1.0, -4.0, 1.0, 0.0, 1.0, 0.0];

/// The four statistics extracted from a normalized scan.
///
/// `mean_intensity` and `std_intensity` are in [0, 255], `edge_density` in
/// [0, 1], `texture_complexity` is unbounded non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanFeatures {
    pub mean_intensity: f64,
    pub std_intensity: f64,
    pub edge_density: f64,
    pub texture_complexity: f64,
}

/// Extract all four features from a normalized RGB image.
pub fn extract_features(img: &RgbImage) -> Result<ScanFeatures, CoreError> {
    let (width, height) = img.dimensions();
    let total = width as usize * height as usize;
    if total == 0 {
        return Err(CoreError::Extraction("image has no pixels".into()));
    }

    let gray: GrayImage = image::imageops::grayscale(img);

    let mean: f64 = gray.pixels().map(|p| p[0] as f64).sum::<f64>() / total as f64;
    let variance: f64 = gray
        .pixels()
        .map(|p| {
            let d = p[0] as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / total as f64;

    // Edge pixels are marked 255 by the hysteresis pass.
    let edges = canny(&gray, CANNY_LOW_THRESHOLD, CANNY_HIGH_THRESHOLD);
    let edge_pixels = edges.pixels().filter(|p| p[0] > 0).count();

    let texture_complexity = laplacian_variance(&gray);

    Ok(ScanFeatures {
        mean_intensity: mean,
        std_intensity: variance.sqrt(),
        edge_density: edge_pixels as f64 / total as f64,
        texture_complexity,
    })
}

/// Variance of the 3x3 Laplacian response over the grayscale image.
fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (width, height) = gray.dimensions();
    let total = width as usize * height as usize;

    let gray_f32: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(width, height, |x, y| Luma([gray.get_pixel(x, y)[0] as f32]));

    let response: Vec<f32> = filter3x3(&gray_f32, &K_LAPLACIAN).into_raw();

    let mean: f64 = response.iter().map(|&v| v as f64).sum::<f64>() / total as f64;
    response
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(value: u8) -> RgbImage {
        RgbImage::from_pixel(64, 64, image::Rgb([value, value, value]))
    }

    /// 8-pixel checkerboard; plenty of strong edges and texture.
    fn checkerboard() -> RgbImage {
        RgbImage::from_fn(64, 64, |x, y| {
            if (x / 8 + y / 8) % 2 == 0 {
                image::Rgb([255, 255, 255])
            } else {
                image::Rgb([0, 0, 0])
            }
        })
    }

    // -- Intensity statistics ------------------------------------------------

    #[test]
    fn uniform_image_has_exact_mean_and_zero_std() {
        let features = extract_features(&uniform(128)).unwrap();
        assert_eq!(features.mean_intensity, 128.0);
        assert_eq!(features.std_intensity, 0.0);
    }

    #[test]
    fn checkerboard_mean_is_midpoint() {
        let features = extract_features(&checkerboard()).unwrap();
        assert!((features.mean_intensity - 127.5).abs() < 1.0);
        assert!(features.std_intensity > 100.0);
    }

    // -- Edge density --------------------------------------------------------

    #[test]
    fn uniform_image_has_no_edges() {
        let features = extract_features(&uniform(200)).unwrap();
        assert_eq!(features.edge_density, 0.0);
    }

    #[test]
    fn checkerboard_has_edges_within_unit_range() {
        let features = extract_features(&checkerboard()).unwrap();
        assert!(features.edge_density > 0.0);
        assert!(features.edge_density <= 1.0);
    }

    // -- Texture complexity --------------------------------------------------

    #[test]
    fn uniform_image_has_zero_texture_complexity() {
        let features = extract_features(&uniform(50)).unwrap();
        assert_eq!(features.texture_complexity, 0.0);
    }

    #[test]
    fn checkerboard_has_high_texture_complexity() {
        let features = extract_features(&checkerboard()).unwrap();
        assert!(features.texture_complexity > 100.0);
    }

    // -- Determinism ---------------------------------------------------------

    #[test]
    fn extraction_is_deterministic() {
        let img = checkerboard();
        let a = extract_features(&img).unwrap();
        let b = extract_features(&img).unwrap();
        assert_eq!(a, b);
    }
}
