use std::collections::BTreeMap;

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::distance_transform::Norm;
use imageproc::region_labelling::{connected_components, Connectivity};
use tracing::{debug, info};
use vigil_proto::{GuardError, Point, Rect, Result};

use crate::{ChangeRegion, DetectorConfig, Frame};

const CHANGED: u8 = 255;

/// Operator-facing sensitivity: higher means more sensitive.
pub fn operator_sensitivity(threshold: u8) -> u8 {
    100u8.saturating_sub(threshold)
}

/// Raw threshold for an operator sensitivity percentage, floored at 1.
pub fn threshold_from_operator(pct: u8) -> u8 {
    100u8.saturating_sub(pct.min(100)).max(1)
}

/// Frame-differencing detector against a reference captured at arm time.
pub struct MotionDetector {
    cfg: DetectorConfig,
    baseline: Option<GrayImage>,
    // the view moved: next frame replaces the reference
    stale: bool,
}

// result of lining a frame up against the baseline
enum Comparison {
    Diff(GrayImage, GrayImage),
    ResolutionChanged { from: (u32, u32), current: GrayImage },
    Stale(GrayImage),
}

impl MotionDetector {
    pub fn new(cfg: DetectorConfig) -> Self {
        Self { cfg, baseline: None, stale: false }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.cfg
    }

    pub fn has_baseline(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn baseline_dimensions(&self) -> Option<(u32, u32)> {
        self.baseline.as_ref().map(|b| b.dimensions())
    }

    /// Takes effect on the next comparison; no re-arm needed.
    pub fn set_threshold(&mut self, threshold: u8) {
        self.cfg.threshold = threshold;
    }

    pub fn set_min_area(&mut self, min_area: u32) {
        self.cfg.min_area = min_area;
    }

    /// Capture the reference from `frame`, replacing any previous one.
    pub fn arm(&mut self, frame: &Frame) -> Result<()> {
        if frame.is_empty() {
            return Err(GuardError::NotReady(format!(
                "cannot capture reference from {}x{} frame",
                frame.width(),
                frame.height()
            )));
        }
        let reference = self.preprocess(frame);
        info!("motion: reference captured ({}x{})", reference.width(), reference.height());
        self.baseline = Some(reference);
        self.stale = false;
        Ok(())
    }

    /// The scene under the reference moved (pan or zoom). The next frame
    /// becomes the reference and reports nothing. No-op without a reference.
    pub fn rebaseline_next(&mut self) {
        if self.baseline.is_some() {
            debug!("motion: reference marked stale");
            self.stale = true;
        }
    }

    pub fn disarm(&mut self) {
        self.stale = false;
        if self.baseline.take().is_some() {
            info!("motion: reference discarded");
        }
    }

    /// Regions of `frame` that differ from the reference. Empty when no
    /// reference is held. A frame whose size differs from the reference
    /// (zoom, sensor mode change) silently becomes the new reference.
    pub fn detect_changes(&mut self, frame: &Frame) -> Vec<ChangeRegion> {
        if frame.is_empty() {
            return Vec::new();
        }
        match self.compare(frame) {
            None => Vec::new(),
            Some(Comparison::ResolutionChanged { from, current }) => {
                debug!("motion: resolution changed {:?} -> {:?}, re-baselining", from, current.dimensions());
                self.baseline = Some(current);
                Vec::new()
            }
            Some(Comparison::Stale(current)) => {
                debug!("motion: view moved, re-baselining at {:?}", current.dimensions());
                self.baseline = Some(current);
                Vec::new()
            }
            Some(Comparison::Diff(reference, current)) => {
                let changed = binarize(&reference, &current, self.cfg.threshold);
                self.baseline = Some(reference);
                extract_regions(&changed, self.cfg.dilate_iterations, self.cfg.min_area)
            }
        }
    }

    fn compare(&mut self, frame: &Frame) -> Option<Comparison> {
        let reference = self.baseline.take()?;
        let current = self.preprocess(frame);
        if std::mem::take(&mut self.stale) {
            return Some(Comparison::Stale(current));
        }
        if reference.dimensions() != current.dimensions() {
            return Some(Comparison::ResolutionChanged { from: reference.dimensions(), current });
        }
        Some(Comparison::Diff(reference, current))
    }

    fn preprocess(&self, frame: &Frame) -> GrayImage {
        let gray = frame.to_gray();
        match self.cfg.denoise_radius {
            0 => gray,
            r => imageproc::filter::median_filter(&gray, r, r),
        }
    }
}

fn binarize(reference: &GrayImage, current: &GrayImage, threshold: u8) -> GrayImage {
    let (w, h) = current.dimensions();
    ImageBuffer::from_fn(w, h, |x, y| {
        let d = reference.get_pixel(x, y)[0].abs_diff(current.get_pixel(x, y)[0]);
        if d > threshold { Luma([CHANGED]) } else { Luma([0]) }
    })
}

#[derive(Debug, Clone, Copy)]
struct Accum {
    count: u64,
    sum_x: u64,
    sum_y: u64,
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
}

impl Accum {
    fn new(x: u32, y: u32) -> Self {
        Self { count: 0, sum_x: 0, sum_y: 0, min_x: x, min_y: y, max_x: x, max_y: y }
    }

    fn add(&mut self, x: u32, y: u32) {
        self.count += 1;
        self.sum_x += x as u64;
        self.sum_y += y as u64;
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    fn region(&self) -> ChangeRegion {
        let cx = (self.sum_x as f64 / self.count as f64).round() as i32;
        let cy = (self.sum_y as f64 / self.count as f64).round() as i32;
        ChangeRegion {
            centroid: Point::new(cx, cy),
            area: self.count.min(u32::MAX as u64) as u32,
            bounds: Rect::new(
                self.min_x as i32,
                self.min_y as i32,
                self.max_x - self.min_x + 1,
                self.max_y - self.min_y + 1,
            ),
        }
    }
}

/// Dilation only decides which changed pixels belong together; area and
/// centroid are measured on the undilated mask.
fn extract_regions(changed: &GrayImage, dilate: u8, min_area: u32) -> Vec<ChangeRegion> {
    let merged = match dilate {
        0 => changed.clone(),
        k => imageproc::morphology::dilate(changed, Norm::LInf, k),
    };
    let labels = connected_components(&merged, Connectivity::Eight, Luma([0u8]));

    let mut by_label: BTreeMap<u32, Accum> = BTreeMap::new();
    for (x, y, px) in changed.enumerate_pixels() {
        if px[0] != CHANGED {
            continue;
        }
        let label = labels.get_pixel(x, y)[0];
        by_label.entry(label).or_insert_with(|| Accum::new(x, y)).add(x, y);
    }

    by_label
        .values()
        .filter(|a| a.count > min_area as u64)
        .map(Accum::region)
        .collect()
}
