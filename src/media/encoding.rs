// SPDX-License-Identifier: GPL-3.0-only

//! JPEG encoding of captured stills

use crate::backends::camera::CaptureQuality;
use image::RgbImage;
use tracing::debug;

/// Encode an RGB image as JPEG at the given capture quality
pub fn encode_jpeg(image: &RgbImage, quality: CaptureQuality) -> Result<Vec<u8>, image::ImageError> {
    let mut buffer = Vec::new();
    {
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut buffer,
            quality.jpeg_quality(),
        );
        encoder.encode(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )?;
    }

    debug!(
        width = image.width(),
        height = image.height(),
        quality = quality.jpeg_quality(),
        size = buffer.len(),
        "JPEG encoding complete"
    );
    Ok(buffer)
}
