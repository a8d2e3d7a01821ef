//! Sensor / crop / display coordinate mapping.
//!
//! Sensor space is the full camera frame. Crop space is the sub-rectangle
//! selected by zoom and pan. Display space is wherever the crop is rendered.
//! All mapping functions are pure and take the view they apply to.

use serde::{Deserialize, Serialize};
use vigil_proto::{GuardError, Point, Rect, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    pub zoom: f64,
    pub pan_x: i32,
    pub pan_y: i32,
    pub sensor_width: u32,
    pub sensor_height: u32,
}

impl ViewConfig {
    pub fn new(sensor_width: u32, sensor_height: u32) -> Self {
        Self { zoom: 1.0, pan_x: 0, pan_y: 0, sensor_width, sensor_height }
    }

    /// Zoom below 1.0 (or NaN) is floored to 1.0 and reported back so the
    /// caller can log it; the view stays usable either way.
    pub fn set_zoom(&mut self, zoom: f64) -> Result<()> {
        let res = if zoom.is_finite() && zoom >= 1.0 {
            self.zoom = zoom;
            Ok(())
        } else {
            self.zoom = 1.0;
            Err(GuardError::InvalidGeometry(format!("zoom {} below 1.0, using 1.0", zoom)))
        };
        self.clamp_pan();
        res
    }

    /// Track the size of incoming frames. Pan is re-clamped against the new bounds.
    pub fn set_sensor_size(&mut self, width: u32, height: u32) {
        self.sensor_width = width;
        self.sensor_height = height;
        self.clamp_pan();
    }

    pub fn crop_rect(&self) -> Rect {
        crop_rect(self)
    }

    fn clamp_pan(&mut self) {
        let r = crop_rect(self);
        self.pan_x = r.x;
        self.pan_y = r.y;
    }

    fn effective_zoom(&self) -> f64 {
        if self.zoom.is_finite() && self.zoom >= 1.0 { self.zoom } else { 1.0 }
    }
}

/// Sensor-space rectangle currently visible. Pan is re-clamped on every call
/// because zoom may have changed since the last pan.
pub fn crop_rect(view: &ViewConfig) -> Rect {
    let zoom = view.effective_zoom();
    let w = crop_dim(view.sensor_width, zoom);
    let h = crop_dim(view.sensor_height, zoom);
    let max_x = (view.sensor_width - w) as i32;
    let max_y = (view.sensor_height - h) as i32;
    Rect {
        x: view.pan_x.clamp(0, max_x),
        y: view.pan_y.clamp(0, max_y),
        w,
        h,
    }
}

fn crop_dim(sensor: u32, zoom: f64) -> u32 {
    if sensor == 0 {
        return 0;
    }
    ((sensor as f64 / zoom).floor() as u32).clamp(1, sensor)
}

// crop -> display scale per axis; a degenerate rectangle maps 1:1
fn display_scale(view: &ViewConfig, display: Rect) -> (f64, f64) {
    let crop = crop_rect(view);
    let sx = if display.w > 0 && crop.w > 0 { display.w as f64 / crop.w as f64 } else { 1.0 };
    let sy = if display.h > 0 && crop.h > 0 { display.h as f64 / crop.h as f64 } else { 1.0 };
    (sx, sy)
}

/// Map a point inside `display` (where the crop is rendered) to sensor space,
/// clamped to the sensor bounds.
pub fn display_to_sensor(view: &ViewConfig, display: Rect, p: Point) -> Point {
    let crop = crop_rect(view);
    let (sx, sy) = display_scale(view, display);
    let x = (p.x.saturating_sub(display.x) as f64 / sx).round() as i32;
    let y = (p.y.saturating_sub(display.y) as f64 / sy).round() as i32;
    clamp_to_sensor(view, Point::new(x, y).offset(crop.x, crop.y))
}

/// Inverse of [`display_to_sensor`] for points inside the crop.
pub fn sensor_to_display(view: &ViewConfig, display: Rect, p: Point) -> Point {
    let crop = crop_rect(view);
    let (sx, sy) = display_scale(view, display);
    let x = (p.x.saturating_sub(crop.x) as f64 * sx).round() as i32;
    let y = (p.y.saturating_sub(crop.y) as f64 * sy).round() as i32;
    Point::new(x, y).offset(display.x, display.y)
}

/// Used to draw zone overlays aligned with the visible crop. The result may
/// fall outside the crop when the sensor point is not visible.
pub fn sensor_to_crop(view: &ViewConfig, p: Point) -> Point {
    let crop = crop_rect(view);
    Point::new(p.x.saturating_sub(crop.x), p.y.saturating_sub(crop.y))
}

/// Detector results come back in crop space; zones are stored in sensor space.
pub fn crop_to_sensor(view: &ViewConfig, p: Point) -> Point {
    let crop = crop_rect(view);
    p.offset(crop.x, crop.y)
}

/// Apply a display-space drag. The image follows the cursor, so the viewport
/// moves the opposite way. X and Y use their own scale factors; with an
/// aspect-preserving display both are equal anyway.
pub fn pan_by(view: &ViewConfig, dx: i32, dy: i32, display: Rect) -> ViewConfig {
    let (sx, sy) = display_scale(view, display);
    let shift_x = (dx as f64 / sx).round() as i32;
    let shift_y = (dy as f64 / sy).round() as i32;
    let crop = crop_rect(view);

    let mut next = *view;
    next.pan_x = crop.x.saturating_sub(shift_x);
    next.pan_y = crop.y.saturating_sub(shift_y);
    next.clamp_pan();
    next
}

fn clamp_to_sensor(view: &ViewConfig, p: Point) -> Point {
    let max_x = view.sensor_width.saturating_sub(1) as i32;
    let max_y = view.sensor_height.saturating_sub(1) as i32;
    Point::new(p.x.clamp(0, max_x), p.y.clamp(0, max_y))
}
