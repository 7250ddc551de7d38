//! Color vs monochrome classification of cropped ID photos.
//!
//! Faded scans keep little saturation, so the fraction needed to call an
//! image "color" is low.

use image::RgbImage;

/// HSV saturation of one pixel, in [0, 1].
pub fn saturation(rgb: [u8; 3]) -> f32 {
    let max = rgb.iter().copied().max().unwrap_or(0) as f32;
    let min = rgb.iter().copied().min().unwrap_or(0) as f32;
    if max <= 0.0 {
        0.0
    } else {
        (max - min) / max
    }
}

/// Fraction of pixels whose saturation exceeds `threshold`.
pub fn saturated_fraction(image: &RgbImage, threshold: f32) -> f64 {
    let total = image.width() as u64 * image.height() as u64;
    if total == 0 {
        return 0.0;
    }
    let saturated = image
        .pixels()
        .filter(|p| saturation(p.0) > threshold)
        .count() as u64;
    saturated as f64 / total as f64
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorReading {
    pub saturated_fraction: f64,
    pub is_color: bool,
}

/// Color when more than `min_fraction` of the pixels exceed `threshold`.
pub fn classify(image: &RgbImage, threshold: f32, min_fraction: f64) -> ColorReading {
    let fraction = saturated_fraction(image, threshold);
    ColorReading {
        saturated_fraction: fraction,
        is_color: fraction > min_fraction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn with_saturated_share(saturated_pixels: u32) -> RgbImage {
        let mut img = RgbImage::from_pixel(10, 10, Rgb([120, 120, 120]));
        for i in 0..saturated_pixels {
            img.put_pixel(i % 10, i / 10, Rgb([200, 40, 40]));
        }
        img
    }

    #[test]
    fn saturation_of_gray_is_zero() {
        assert_eq!(saturation([90, 90, 90]), 0.0);
        assert_eq!(saturation([0, 0, 0]), 0.0);
        assert!((saturation([200, 40, 40]) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn six_percent_saturated_is_color() {
        let reading = classify(&with_saturated_share(6), 0.25, 0.045);
        assert!(reading.is_color);
        assert!((reading.saturated_fraction - 0.06).abs() < 1e-9);
    }

    #[test]
    fn four_percent_saturated_is_monochrome() {
        assert!(!classify(&with_saturated_share(4), 0.25, 0.045).is_color);
    }

    #[test]
    fn grayscale_image_is_monochrome() {
        let img = RgbImage::from_pixel(32, 20, Rgb([180, 180, 180]));
        assert_eq!(saturated_fraction(&img, 0.25), 0.0);
        assert!(!classify(&img, 0.25, 0.045).is_color);
    }

    #[test]
    fn empty_image_is_monochrome() {
        assert!(!classify(&RgbImage::new(0, 0), 0.25, 0.045).is_color);
    }
}
