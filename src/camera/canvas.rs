use crate::error::{PhotoDbError, Result};
use crate::frame::FrameData;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ColorType, ImageEncoder, RgbaImage};

pub const PNG_MIME_TYPE: &str = "image/png";

/// Fixed-size RGBA drawing surface a live frame is copied into before saving
#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// Create a blank (fully transparent) canvas
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.image
    }

    /// True until something has been drawn
    pub fn is_blank(&self) -> bool {
        self.image.as_raw().iter().all(|&b| b == 0)
    }

    /// Draw a frame over the whole canvas, scaling it to the canvas size
    pub fn draw_frame(&mut self, frame: &FrameData) -> Result<()> {
        let source = frame.to_rgba_image()?;

        self.image = if source.dimensions() == self.image.dimensions() {
            source
        } else {
            imageops::resize(&source, self.width(), self.height(), FilterType::Triangle)
        };

        Ok(())
    }

    /// Encode the canvas contents as PNG
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        PngEncoder::new(&mut buffer)
            .write_image(
                self.image.as_raw(),
                self.width(),
                self.height(),
                ColorType::Rgba8,
            )
            .map_err(|e| PhotoDbError::encoding(format!("PNG encoding failed: {}", e)))?;
        Ok(buffer)
    }
}
