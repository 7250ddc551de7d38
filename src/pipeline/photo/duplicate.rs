//! Near-duplicate check between front and back photos.
//!
//! Uses the DoubleGradient perceptual hash (256-bit) so rescans and slight
//! crops of the same side still compare as identical.

use image::{DynamicImage, RgbImage};
use img_hash::{HashAlg, HasherConfig, ImageHash};

pub fn perceptual_hash(image: &RgbImage) -> ImageHash {
    let hasher = HasherConfig::new()
        .hash_alg(HashAlg::DoubleGradient)
        .hash_size(16, 16)
        .to_hasher();
    hasher.hash_image(&DynamicImage::ImageRgb8(image.clone()))
}

/// Similarity in [0, 1]; 1 means identical hashes.
pub fn similarity(a: &RgbImage, b: &RgbImage) -> f64 {
    let (ha, hb) = (perceptual_hash(a), perceptual_hash(b));
    let distance = ha.dist(&hb);
    let max_bits = (ha.as_bytes().len() * 8).max(1) as f64;
    1.0 - (distance as f64 / max_bits)
}
