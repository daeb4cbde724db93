//! Fits listing and profile photos into the store's per-document size budget.

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use serde::Serialize;
use tracing::{debug, warn};

/// Size and quality limits for one kind of photo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionProfile {
    /// Longest allowed side after downscaling
    pub max_dimension: u32,
    /// Encoded payload budget in bytes
    pub max_bytes: usize,
    pub initial_quality: u8,
    pub min_quality: u8,
    pub quality_step: u8,
}

impl CompressionProfile {
    /// Kept under the store's 1 MB document limit
    pub const LISTING: Self = Self {
        max_dimension: 800,
        max_bytes: 900_000,
        initial_quality: 80,
        min_quality: 5,
        quality_step: 5,
    };

    pub const PROFILE: Self = Self {
        max_dimension: 500,
        max_bytes: 500_000,
        initial_quality: 90,
        min_quality: 10,
        quality_step: 5,
    };
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CompressedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
}

/// Power-of-two divisor that brings both sides within `max_dimension`
pub fn scale_factor(width: u32, height: u32, max_dimension: u32) -> u32 {
    let mut scale = 1;
    while width / scale > max_dimension || height / scale > max_dimension {
        scale *= 2;
    }
    scale
}

/// Decode `raw`, downscale and re-encode as JPEG with decreasing quality
/// until the payload fits; `Ok(None)` if even the lowest quality is too big
pub fn compress(raw: &[u8], profile: CompressionProfile) -> Result<Option<CompressedImage>> {
    let decoded = image::load_from_memory(raw).context("Failed to decode image")?;
    compress_image(&decoded, profile)
}

pub fn compress_image(
    image: &DynamicImage,
    profile: CompressionProfile,
) -> Result<Option<CompressedImage>> {
    let (width, height) = image.dimensions();
    let scale = scale_factor(width, height, profile.max_dimension);
    let scaled = if scale > 1 {
        image.resize_exact(
            (width / scale).max(1),
            (height / scale).max(1),
            FilterType::Triangle,
        )
    } else {
        image.clone()
    };
    let rgb = DynamicImage::ImageRgb8(scaled.to_rgb8());
    let (width, height) = rgb.dimensions();

    let mut quality = profile.initial_quality;
    loop {
        let mut bytes = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, quality))
            .context("Failed to encode JPEG")?;
        debug!("{}x{} at quality {} -> {} bytes", width, height, quality, bytes.len());

        if bytes.len() <= profile.max_bytes {
            return Ok(Some(CompressedImage {
                bytes,
                width,
                height,
                quality,
            }));
        }

        let next = quality.saturating_sub(profile.quality_step);
        if next <= profile.min_quality || next == quality {
            warn!(
                "image too large even after maximum compression: {} bytes",
                bytes.len()
            );
            return Ok(None);
        }
        quality = next;
    }
}
