use anyhow::{Context, Result};
use tracing::warn;

use crate::{persist, ZoneRepository, ZoneStore};

/// Parse the persisted zones and check every vertex against the sensor size.
/// Returns the number of zones found (0 when nothing was saved yet).
pub fn check_zones(repo: &dyn ZoneRepository, sensor_w: u32, sensor_h: u32) -> Result<usize> {
    let mut store = ZoneStore::new();
    let n = persist::load_into(repo, &mut store).with_context(|| format!("zones at {}", repo.describe()))?;
    for (i, zone) in store.zones().iter().enumerate() {
        let outside = zone
            .points()
            .iter()
            .filter(|p| p.x < 0 || p.y < 0 || p.x >= sensor_w as i32 || p.y >= sensor_h as i32)
            .count();
        if outside > 0 {
            warn!("zone #{} has {} points outside the {}x{} sensor", i, outside, sensor_w, sensor_h);
        }
    }
    Ok(n)
}
