use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::Frame;

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub mode: String,   // "libcamera-jpeg" | "v4l2-mjpeg" | "image-dir"
    pub device: String, // /dev/video0 (v4l2)
    pub width: u32,
    pub height: u32,
    pub dir: Option<String>, // image-dir
    pub loop_replay: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            mode: "v4l2-mjpeg".into(),
            device: "/dev/video0".into(),
            width: 1280,
            height: 720,
            dir: None,
            loop_replay: false,
        }
    }
}

/// Where frames come from. `next_frame` returning `Ok(None)` means signal
/// loss for this tick; the caller keeps going.
pub enum FrameSource {
    Capture(CameraConfig),
    ImageDir(ImageDir),
}

impl FrameSource {
    pub fn open(cfg: &CameraConfig) -> Result<Self> {
        match cfg.mode.as_str() {
            "libcamera-jpeg" | "v4l2-mjpeg" => Ok(Self::Capture(cfg.clone())),
            "image-dir" => {
                let dir = cfg.dir.as_ref().context("camera.dir missing (mode=image-dir)")?;
                Ok(Self::ImageDir(ImageDir::open(dir, cfg.loop_replay)?))
            }
            other => anyhow::bail!("unknown camera.mode: {}", other),
        }
    }

    pub async fn next_frame(&mut self) -> Result<Option<Frame>> {
        match self {
            Self::Capture(cfg) => Ok(frame_from_capture(capture_jpeg(cfg).await)),
            Self::ImageDir(dir) => dir.next_frame().await,
        }
    }

    /// Only a non-looping replay ever runs out.
    pub fn exhausted(&self) -> bool {
        match self {
            Self::Capture(_) => false,
            Self::ImageDir(dir) => dir.exhausted(),
        }
    }
}

/// Any capture or decode failure is signal loss for this tick, not an error.
fn frame_from_capture(res: Result<Vec<u8>>) -> Option<Frame> {
    let decoded = res.and_then(|jpeg| {
        anyhow::ensure!(!jpeg.is_empty(), "capture produced no data");
        Frame::decode(&jpeg)
    });
    match decoded {
        Ok(f) => Some(f),
        Err(e) => {
            warn!("capture failed, no frame this tick: {:#}", e);
            None
        }
    }
}

/// Replays the stills of a directory in file-name order.
pub struct ImageDir {
    files: Vec<PathBuf>,
    next: usize,
    looping: bool,
}

impl ImageDir {
    pub fn open(dir: impl AsRef<Path>, looping: bool) -> Result<Self> {
        let dir = dir.as_ref();
        let mut files = Vec::new();
        for ent in std::fs::read_dir(dir).with_context(|| format!("read image dir {}", dir.display()))? {
            let path = ent?.path();
            let is_image = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| matches!(e.to_ascii_lowercase().as_str(), "jpg" | "jpeg" | "png"))
                .unwrap_or(false);
            if path.is_file() && is_image {
                files.push(path);
            }
        }
        files.sort();
        info!("camera: replaying {} frames from {}", files.len(), dir.display());
        Ok(Self { files, next: 0, looping })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn exhausted(&self) -> bool {
        !self.looping && self.next >= self.files.len()
    }

    pub async fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.files.is_empty() {
            return Ok(None);
        }
        if self.next >= self.files.len() {
            if !self.looping {
                return Ok(None);
            }
            self.next = 0;
        }
        let path = &self.files[self.next];
        self.next += 1;
        let bytes = match tokio::fs::read(path).await {
            Ok(b) => b,
            Err(e) => {
                warn!("cannot read frame {}: {}", path.display(), e);
                return Ok(None);
            }
        };
        match Frame::decode(&bytes) {
            Ok(f) => Ok(Some(f)),
            Err(e) => {
                warn!("skipping undecodable frame {}: {:#}", path.display(), e);
                Ok(None)
            }
        }
    }
}

/// Pragmatic capture:
/// - libcamera-jpeg: call `libcamera-still -n -t 1 --width ... --height ... -o -`
///   returns a JPEG frame on stdout (simple, robust on Pi)
/// - v4l2-mjpeg: call `ffmpeg` to grab a single MJPEG frame (keeps Rust dependencies small)
pub async fn capture_jpeg(cfg: &CameraConfig) -> Result<Vec<u8>> {
    match cfg.mode.as_str() {
        "libcamera-jpeg" => capture_libcamera(cfg).await,
        "v4l2-mjpeg" => capture_v4l2_ffmpeg(cfg).await,
        other => anyhow::bail!("camera.mode {} does not capture", other),
    }
}

async fn capture_libcamera(cfg: &CameraConfig) -> Result<Vec<u8>> {
    let mut cmd = Command::new("libcamera-still");
    cmd.args([
        "-n",                 // no preview
        "-t", "1",            // 1ms
        "--width", &cfg.width.to_string(),
        "--height", &cfg.height.to_string(),
        "-o", "-",            // stdout
    ]);

    debug!("capture: libcamera-still");
    let out = cmd.output().await.context("run libcamera-still")?;
    anyhow::ensure!(out.status.success(), "libcamera-still failed");
    anyhow::ensure!(!out.stdout.is_empty(), "libcamera-still produced no frame");
    Ok(out.stdout)
}

async fn capture_v4l2_ffmpeg(cfg: &CameraConfig) -> Result<Vec<u8>> {
    let mut cmd = Command::new("ffmpeg");
    cmd.args([
        "-hide_banner","-loglevel","error",
        "-f","video4linux2",
        "-input_format","mjpeg",
        "-video_size",&format!("{}x{}", cfg.width, cfg.height),
        "-i",&cfg.device,
        "-vframes","1",
        "-f","image2pipe",
        "-vcodec","mjpeg",
        "-",
    ]);

    debug!("capture: ffmpeg v4l2");
    let out = cmd.output().await.context("run ffmpeg capture")?;
    anyhow::ensure!(out.status.success(), "ffmpeg capture failed");
    anyhow::ensure!(!out.stdout.is_empty(), "ffmpeg produced no frame");
    Ok(out.stdout)
}
