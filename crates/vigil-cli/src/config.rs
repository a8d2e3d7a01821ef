use anyhow::{Context, Result};
use serde::Deserialize;
use vigil_proto::Rect;
use vigil_vision::camera::CameraConfig;
use vigil_vision::DetectorConfig;
use vigil_watch::SessionConfig;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub camera: CameraConfig,
    pub detector: DetectorConfig,
    pub display: DisplayCfg,
    pub zones: ZonesCfg,
    pub session: SessionConfig,
    pub journal: JournalCfg,
}

/// Rectangle the crop is rendered into; clicks and drags arrive in this space.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayCfg {
    pub width: u32,
    pub height: u32,
}

impl Default for DisplayCfg {
    fn default() -> Self {
        Self { width: 1280, height: 720 }
    }
}

impl DisplayCfg {
    pub fn rect(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ZonesCfg {
    pub path: String,
    pub autoload: bool,
}

impl Default for ZonesCfg {
    fn default() -> Self {
        Self { path: "zones.json".into(), autoload: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JournalCfg {
    pub capacity: usize,
    pub events_path: Option<String>,
}

impl Default for JournalCfg {
    fn default() -> Self {
        Self { capacity: 10, events_path: None }
    }
}

pub fn load_config(path: &str) -> Result<Config> {
    let s = std::fs::read_to_string(path).with_context(|| format!("read config {}", path))?;
    parse_config(&s)
}

pub fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config toml")
}
