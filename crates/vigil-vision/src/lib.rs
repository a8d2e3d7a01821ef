pub mod camera;
pub mod doctor;
pub mod frame;
pub mod motion;
pub mod view;

use serde::{Deserialize, Serialize};
use vigil_proto::{Point, Rect};

pub use frame::Frame;
pub use motion::MotionDetector;
pub use view::ViewConfig;

/// Connected area of change found by the detector. Coordinates are in the
/// space of the frame that was compared (crop space when the session feeds
/// zoomed crops).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRegion {
    pub centroid: Point,
    // changed pixels, before dilation
    pub area: u32,
    pub bounds: Rect,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Raw per-pixel difference threshold (1..=99). Operators see `100 - threshold`.
    pub threshold: u8,
    /// A region must have strictly more changed pixels than this.
    pub min_area: u32,
    /// Median denoise radius applied before diffing; 0 disables it.
    pub denoise_radius: u32,
    /// Chebyshev dilation radius used to merge nearby changed pixels.
    pub dilate_iterations: u8,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold: 25,
            min_area: 500,
            denoise_radius: 1,
            dilate_iterations: 2,
        }
    }
}
