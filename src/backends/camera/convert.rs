// SPDX-License-Identifier: GPL-3.0-only

//! Conversion of raw V4L2 buffers to RGB24 frames
//!
//! Webcams almost universally offer packed YUYV and Motion-JPEG; those are the
//! two formats the V4L2 backend negotiates.

use super::types::CameraFrame;
use tracing::debug;

/// Pixel formats the V4L2 backend accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawFormat {
    /// Packed 4:2:2, `Y0 U Y1 V`
    Yuyv,
    /// Motion-JPEG, one JPEG per buffer
    Mjpeg,
}

impl RawFormat {
    pub const YUYV_FOURCC: [u8; 4] = *b"YUYV";
    pub const MJPEG_FOURCC: [u8; 4] = *b"MJPG";

    /// Map a V4L2 fourcc to a supported format
    pub fn from_fourcc(fourcc: [u8; 4]) -> Option<Self> {
        match &fourcc {
            b"YUYV" => Some(RawFormat::Yuyv),
            b"MJPG" | b"JPEG" => Some(RawFormat::Mjpeg),
            _ => None,
        }
    }

    pub fn fourcc(self) -> [u8; 4] {
        match self {
            RawFormat::Yuyv => Self::YUYV_FOURCC,
            RawFormat::Mjpeg => Self::MJPEG_FOURCC,
        }
    }
}

/// Decode one captured buffer
///
/// `stride` is the YUYV row length in bytes (ignored for MJPEG).
pub fn decode_buffer(
    format: RawFormat,
    width: u32,
    height: u32,
    stride: u32,
    data: &[u8],
) -> Option<CameraFrame> {
    match format {
        RawFormat::Yuyv => yuyv_to_rgb(width, height, stride, data),
        RawFormat::Mjpeg => {
            let decoded = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
                .map_err(|e| debug!(error = %e, "Dropping undecodable MJPEG buffer"))
                .ok()?;
            Some(CameraFrame::from_image(decoded.to_rgb8()))
        }
    }
}

/// Convert packed YUYV to RGB24
fn yuyv_to_rgb(width: u32, height: u32, stride: u32, data: &[u8]) -> Option<CameraFrame> {
    // Odd widths still carry a full U/V pair for the last pixel
    let row_bytes = (width as usize).div_ceil(2) * 4;
    let stride = (stride as usize).max(row_bytes);
    if width == 0 || height == 0 || data.len() < stride * (height as usize - 1) + row_bytes {
        return None;
    }

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height as usize {
        let row = &data[y * stride..];
        for x in 0..width as usize {
            // Two pixels share one U/V pair
            let base = (x & !1) * 2;
            let luma = if x & 1 == 0 { row[base] } else { row[base + 2] };
            let (r, g, b) = yuv_to_rgb(luma, row[base + 1], row[base + 3]);
            rgb.extend_from_slice(&[r, g, b]);
        }
    }

    CameraFrame::from_rgb(width, height, rgb)
}

/// Convert YUV (BT.601) to RGB
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourcc_mapping() {
        assert_eq!(RawFormat::from_fourcc(*b"YUYV"), Some(RawFormat::Yuyv));
        assert_eq!(RawFormat::from_fourcc(*b"MJPG"), Some(RawFormat::Mjpeg));
        assert_eq!(RawFormat::from_fourcc(*b"NV12"), None);
        assert_eq!(RawFormat::Mjpeg.fourcc(), *b"MJPG");
    }

    #[test]
    fn test_neutral_chroma_is_gray() {
        assert_eq!(yuv_to_rgb(128, 128, 128), (128, 128, 128));
        assert_eq!(yuv_to_rgb(0, 128, 128), (0, 0, 0));
        assert_eq!(yuv_to_rgb(255, 128, 128), (255, 255, 255));
    }

    #[test]
    fn test_yuyv_decodes_each_luma_sample() {
        // 2x1 image: dark pixel then bright pixel, neutral chroma
        let data = [16u8, 128, 235, 128];
        let frame = decode_buffer(RawFormat::Yuyv, 2, 1, 4, &data).unwrap();
        assert_eq!(frame.pixel(0, 0), (16, 16, 16));
        assert_eq!(frame.pixel(1, 0), (235, 235, 235));
    }

    #[test]
    fn test_yuyv_rejects_short_buffer() {
        assert!(decode_buffer(RawFormat::Yuyv, 4, 4, 8, &[0u8; 10]).is_none());
    }

    #[test]
    fn test_mjpeg_round_trips_through_decoder() {
        let image = image::RgbImage::from_pixel(8, 4, image::Rgb([200, 10, 10]));
        let jpeg = crate::media::encoding::encode_jpeg(
            &image,
            crate::backends::camera::CaptureQuality::MAX,
        )
        .unwrap();
        let frame = decode_buffer(RawFormat::Mjpeg, 8, 4, 0, &jpeg).unwrap();
        assert_eq!((frame.width, frame.height), (8, 4));
        let (r, _, _) = frame.pixel(3, 2);
        assert!(r > 150);
    }
}
