use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage};
use vigil_proto::Rect;

/// A captured frame in sensor space. Never mutated after capture; cropping
/// produces a new frame.
#[derive(Debug, Clone)]
pub struct Frame {
    image: DynamicImage,
}

impl Frame {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn from_gray(gray: GrayImage) -> Self {
        Self { image: DynamicImage::ImageLuma8(gray) }
    }

    /// Decode an encoded still (JPEG from the capture tools, PNG from replay dirs).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes).context("decode frame")?;
        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Sub-frame for `rect`, clipped to the frame bounds.
    pub fn crop(&self, rect: Rect) -> Frame {
        let x = rect.x.max(0) as u32;
        let y = rect.y.max(0) as u32;
        let x = x.min(self.width());
        let y = y.min(self.height());
        let w = rect.w.min(self.width() - x);
        let h = rect.h.min(self.height() - y);
        if x == 0 && y == 0 && w == self.width() && h == self.height() {
            return self.clone();
        }
        Frame { image: self.image.crop_imm(x, y, w, h) }
    }

    pub fn to_gray(&self) -> GrayImage {
        self.image.to_luma8()
    }
}
