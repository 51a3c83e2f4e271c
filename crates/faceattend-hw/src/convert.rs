//! Pixel format conversion, dark-frame rejection and JPEG encoding.

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageError};
use thiserror::Error;

/// Mean luma below which a frame is considered unusable (lens covered,
/// lights off, AGC not yet settled).
pub const DARK_LUMA_THRESHOLD: f32 = 16.0;

/// JPEG quality for uploaded stills. The recognition service downsamples
/// anyway; bandwidth matters more than fidelity here.
const JPEG_QUALITY: u8 = 85;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("buffer too short: expected at least {expected} bytes, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },
    #[error("jpeg encoding failed: {0}")]
    Encode(#[from] ImageError),
}

/// Extract the luma channel from packed YUYV 4:2:2 (bytes [Y0 U Y1 V]).
pub fn luma_from_yuyv(yuyv: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ConvertError> {
    let pixels = (width * height) as usize;
    let expected = pixels * 2;
    if yuyv.len() < expected {
        return Err(ConvertError::BufferTooShort {
            expected,
            actual: yuyv.len(),
        });
    }
    let mut luma = Vec::with_capacity(pixels);
    for pair in yuyv[..expected].chunks_exact(4) {
        luma.push(pair[0]);
        luma.push(pair[2]);
    }
    Ok(luma)
}

/// Downscale 16-bit little-endian grayscale to 8-bit.
pub fn luma_from_y16(raw: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ConvertError> {
    let pixels = (width * height) as usize;
    let expected = pixels * 2;
    if raw.len() < expected {
        return Err(ConvertError::BufferTooShort {
            expected,
            actual: raw.len(),
        });
    }
    Ok(raw[..expected]
        .chunks_exact(2)
        .map(|px| (u16::from_le_bytes([px[0], px[1]]) >> 8) as u8)
        .collect())
}

/// Mean pixel brightness, 0.0–255.0.
pub fn mean_luma(gray: &[u8]) -> f32 {
    if gray.is_empty() {
        return 0.0;
    }
    gray.iter().map(|&b| b as u32).sum::<u32>() as f32 / gray.len() as f32
}

/// Whether a frame is too dark to be worth submitting.
pub fn is_too_dark(gray: &[u8]) -> bool {
    mean_luma(gray) < DARK_LUMA_THRESHOLD
}

/// Encode an 8-bit grayscale buffer as JPEG.
pub fn encode_jpeg(gray: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ConvertError> {
    let pixels = (width * height) as usize;
    if gray.len() < pixels {
        return Err(ConvertError::BufferTooShort {
            expected: pixels,
            actual: gray.len(),
        });
    }
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).encode(
        &gray[..pixels],
        width,
        height,
        ExtendedColorType::L8,
    )?;
    Ok(out)
}
