use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, ExtendedColorType, RgbImage};

use crate::domain::errors::{DomainError, DomainResult};

/// Decodes any supported format into RGB8.
pub fn decode_rgb(bytes: &[u8]) -> DomainResult<RgbImage> {
    let img = image::load_from_memory(bytes).map_err(|e| DomainError::Decode(e.to_string()))?;
    Ok(img.to_rgb8())
}

/// Squashes the frame to `size`x`size`. Aspect ratio is not preserved, so
/// detector geometry is relative to the squashed frame.
pub fn normalize(rgb: RgbImage, size: u32) -> RgbImage {
    if rgb.width() == size && rgb.height() == size {
        return rgb;
    }
    image::imageops::resize(&rgb, size, size, FilterType::CatmullRom)
}

pub fn encode_jpeg(rgb: &RgbImage, quality: u8) -> DomainResult<Vec<u8>> {
    let mut jpeg = Vec::new();
    let mut enc = JpegEncoder::new_with_quality(&mut jpeg, quality);
    enc.encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| DomainError::Encode(e.to_string()))?;
    Ok(jpeg)
}
