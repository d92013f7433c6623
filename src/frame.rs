use crate::error::{PhotoDbError, Result};
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::SystemTime;

/// Pixel layout of a live frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameFormat {
    /// Motion JPEG format - compressed JPEG frames
    Mjpeg,
    /// RGB24 format - uncompressed RGB data
    Rgb24,
    /// RGBA format - uncompressed RGB data with alpha
    Rgba8,
}

impl FrameFormat {
    /// Get bytes per pixel for the format
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            FrameFormat::Mjpeg => 0, // Variable size, compressed
            FrameFormat::Rgb24 => 3,
            FrameFormat::Rgba8 => 4,
        }
    }

    /// Check if format is compressed
    pub fn is_compressed(&self) -> bool {
        matches!(self, FrameFormat::Mjpeg)
    }
}

/// A single frame taken from a live video stream
#[derive(Debug, Clone)]
pub struct FrameData {
    /// Unique frame identifier
    pub id: u64,
    /// Timestamp when frame was captured
    pub timestamp: SystemTime,
    /// Raw frame data (shared so the latest frame can be handed out cheaply)
    pub data: Arc<Vec<u8>>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Frame format
    pub format: FrameFormat,
}

impl FrameData {
    /// Create a new frame data instance
    pub fn new(
        id: u64,
        timestamp: SystemTime,
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: FrameFormat,
    ) -> Self {
        Self {
            id,
            timestamp,
            data: Arc::new(data),
            width,
            height,
            format,
        }
    }

    /// Get the expected frame size for uncompressed formats
    pub fn expected_size(&self) -> Option<usize> {
        if self.format.is_compressed() {
            None
        } else {
            Some(self.width as usize * self.height as usize * self.format.bytes_per_pixel())
        }
    }

    /// Validate frame data size against expected size
    pub fn validate_size(&self) -> bool {
        match self.expected_size() {
            Some(expected) => self.data.len() == expected,
            None => true,
        }
    }

    /// Get frame age in milliseconds
    pub fn age_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(self.timestamp)
            .unwrap_or_default()
            .as_millis() as u64
    }

    /// Decode the frame into an RGBA image regardless of its source format
    pub fn to_rgba_image(&self) -> Result<RgbaImage> {
        if !self.validate_size() {
            return Err(PhotoDbError::encoding(format!(
                "Frame {} has {} bytes, expected {:?}",
                self.id,
                self.data.len(),
                self.expected_size()
            )));
        }

        match self.format {
            FrameFormat::Rgba8 => {
                RgbaImage::from_raw(self.width, self.height, self.data.as_ref().clone())
                    .ok_or_else(|| {
                        PhotoDbError::encoding(format!("Frame {} is not a valid RGBA image", self.id))
                    })
            }
            FrameFormat::Rgb24 => {
                let rgb = RgbImage::from_raw(self.width, self.height, self.data.as_ref().clone())
                    .ok_or_else(|| {
                        PhotoDbError::encoding(format!("Frame {} is not a valid RGB image", self.id))
                    })?;
                Ok(DynamicImage::ImageRgb8(rgb).to_rgba8())
            }
            FrameFormat::Mjpeg => {
                let decoded = image::load_from_memory_with_format(&self.data, ImageFormat::Jpeg)
                    .map_err(|e| {
                        PhotoDbError::encoding(format!(
                            "Failed to decode MJPEG frame {}: {}",
                            self.id, e
                        ))
                    })?;
                Ok(decoded.to_rgba8())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_size() {
        let frame = FrameData::new(1, SystemTime::now(), vec![0; 16], 2, 2, FrameFormat::Rgba8);
        assert_eq!(frame.expected_size(), Some(16));
        assert!(frame.validate_size());

        let jpeg = FrameData::new(2, SystemTime::now(), vec![0xFF, 0xD8], 2, 2, FrameFormat::Mjpeg);
        assert_eq!(jpeg.expected_size(), None);
        assert!(jpeg.validate_size());
    }

    #[test]
    fn test_rgb_frame_converts_to_rgba() {
        let frame = FrameData::new(
            1,
            SystemTime::now(),
            vec![10, 20, 30, 40, 50, 60],
            2,
            1,
            FrameFormat::Rgb24,
        );

        let image = frame.to_rgba_image().unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [10, 20, 30, 255]);
        assert_eq!(image.get_pixel(1, 0).0, [40, 50, 60, 255]);
    }

    #[test]
    fn test_short_frame_rejected() {
        let frame = FrameData::new(1, SystemTime::now(), vec![0; 3], 2, 2, FrameFormat::Rgba8);
        assert!(matches!(
            frame.to_rgba_image(),
            Err(PhotoDbError::Encoding { .. })
        ));
    }
}
