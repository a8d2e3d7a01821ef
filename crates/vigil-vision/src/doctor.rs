use anyhow::Result;

use crate::camera::CameraConfig;
use crate::DetectorConfig;

pub fn check_detector(cfg: &DetectorConfig) -> Result<()> {
    anyhow::ensure!((1..=99).contains(&cfg.threshold), "detector.threshold should be 1..99");
    anyhow::ensure!(cfg.denoise_radius <= 5, "detector.denoise_radius too large (max 5)");
    anyhow::ensure!(cfg.dilate_iterations <= 10, "detector.dilate_iterations too large (max 10)");
    Ok(())
}

pub fn check_camera(cfg: &CameraConfig) -> Result<()> {
    match cfg.mode.as_str() {
        "libcamera-jpeg" | "v4l2-mjpeg" => {
            anyhow::ensure!(cfg.width > 0 && cfg.height > 0, "camera.width/height must be non-zero");
        }
        "image-dir" => {
            let dir = cfg.dir.as_deref().unwrap_or_default();
            anyhow::ensure!(!dir.is_empty(), "camera.dir missing (mode=image-dir)");
            anyhow::ensure!(std::path::Path::new(dir).is_dir(), "camera.dir is not a dir: {}", dir);
        }
        other => anyhow::bail!("unknown camera.mode: {}", other),
    }
    Ok(())
}

pub fn check_display(width: u32, height: u32) -> Result<()> {
    anyhow::ensure!(width > 0 && height > 0, "display.width/height must be non-zero");
    Ok(())
}
