//! Image normalization: bounded resize and JPEG re-encode of a captured
//! receipt photo before any network use.

use std::io::Cursor;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader};
use uuid::Uuid;

use milkslip_core::AppError;
use milkslip_storage::receipt_image_key;

/// A receipt photo re-encoded for upload and extraction.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub bytes: Bytes,
    /// Storage key derived from owner id and submission time.
    pub key: String,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Downscales and recompresses captured photos to a bounded resolution and
/// encoding.
#[derive(Debug, Clone, Copy)]
pub struct ImageNormalizer {
    max_dimension: u32,
    jpeg_quality: u8,
}

impl ImageNormalizer {
    pub fn new(max_dimension: u32, jpeg_quality: u8) -> Self {
        Self {
            max_dimension,
            jpeg_quality,
        }
    }

    /// Normalize an arbitrary-resolution photo.
    ///
    /// Neither output dimension exceeds the configured cap; aspect ratio is
    /// preserved and images already within bounds are not upscaled. The
    /// result is always JPEG at the configured quality. Decode or encode
    /// failure aborts the attempt with `EncodeFailed`; the original bytes are
    /// never passed through silently.
    pub fn normalize(
        &self,
        data: &[u8],
        owner_id: Uuid,
        submitted_at: DateTime<Utc>,
    ) -> Result<NormalizedImage, AppError> {
        let img = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| AppError::EncodeFailed(format!("Unreadable image data: {}", e)))?
            .decode()
            .map_err(|e| AppError::EncodeFailed(format!("Failed to decode image: {}", e)))?;

        let (orig_width, orig_height) = img.dimensions();
        let resized = self.scale_down(img);
        let (width, height) = resized.dimensions();

        // JPEG has no alpha channel; flatten before encoding.
        let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

        let mut buffer = Vec::with_capacity((width * height / 4) as usize);
        let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut buffer), self.jpeg_quality);
        rgb.write_with_encoder(encoder)
            .map_err(|e| AppError::EncodeFailed(format!("Failed to encode JPEG: {}", e)))?;

        tracing::debug!(
            orig_width,
            orig_height,
            width,
            height,
            output_size = buffer.len(),
            "Normalized receipt image"
        );

        Ok(NormalizedImage {
            bytes: Bytes::from(buffer),
            key: receipt_image_key(owner_id, submitted_at),
            content_type: "image/jpeg",
            width,
            height,
        })
    }

    fn scale_down(&self, img: DynamicImage) -> DynamicImage {
        let (width, height) = img.dimensions();
        if width.max(height) <= self.max_dimension {
            return img;
        }
        // resize() fits within the bounding box preserving aspect ratio.
        img.resize(self.max_dimension, self.max_dimension, FilterType::Lanczos3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn png_image(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 180, 150, 255]));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn normalizer() -> ImageNormalizer {
        ImageNormalizer::new(1600, 85)
    }

    fn decode_dimensions(data: &[u8]) -> (u32, u32) {
        let img = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap();
        img.dimensions()
    }

    #[test]
    fn test_oversized_image_is_capped() {
        let data = png_image(3200, 2400);
        let out = normalizer()
            .normalize(&data, Uuid::new_v4(), Utc::now())
            .unwrap();
        assert_eq!((out.width, out.height), (1600, 1200));
        assert_eq!(decode_dimensions(&out.bytes), (1600, 1200));
    }

    #[test]
    fn test_aspect_ratio_preserved_for_portrait() {
        let data = png_image(1000, 4000);
        let out = normalizer()
            .normalize(&data, Uuid::new_v4(), Utc::now())
            .unwrap();
        assert_eq!(out.height, 1600);
        assert_eq!(out.width, 400);
    }

    #[test]
    fn test_small_image_is_not_upscaled() {
        let data = png_image(640, 480);
        let out = normalizer()
            .normalize(&data, Uuid::new_v4(), Utc::now())
            .unwrap();
        assert_eq!((out.width, out.height), (640, 480));
    }

    #[test]
    fn test_output_is_jpeg() {
        let data = png_image(100, 100);
        let out = normalizer()
            .normalize(&data, Uuid::new_v4(), Utc::now())
            .unwrap();
        assert_eq!(out.content_type, "image/jpeg");
        // JPEG SOI marker
        assert_eq!(&out.bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_key_derived_from_owner_and_time() {
        let owner = Uuid::new_v4();
        let at = Utc.with_ymd_and_hms(2024, 1, 5, 9, 30, 0).unwrap();
        let out = normalizer().normalize(&png_image(10, 10), owner, at).unwrap();
        assert_eq!(out.key, format!("{}/{}.jpg", owner, at.timestamp_millis()));
    }

    #[test]
    fn test_undecodable_input_fails_hard() {
        let result = normalizer().normalize(b"not an image", Uuid::new_v4(), Utc::now());
        assert!(matches!(result, Err(AppError::EncodeFailed(_))));
    }
}
