use tracing::{debug, info};
use vigil_proto::{GuardError, Point, Result};

use crate::polygon;

/// Closed polygon in sensor space, at least 3 vertices. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    points: Vec<Point>,
}

impl Zone {
    pub fn new(points: Vec<Point>) -> Result<Self> {
        if points.len() < 3 {
            return Err(GuardError::InvalidGeometry(format!(
                "zone needs at least 3 points, got {}",
                points.len()
            )));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn contains(&self, p: Point) -> bool {
        polygon::contains(&self.points, p)
    }
}

/// Closed zones plus the polygon currently being drawn.
#[derive(Debug, Default, Clone)]
pub struct ZoneStore {
    zones: Vec<Zone>,
    draft: Vec<Point>,
}

impl ZoneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn draft(&self) -> &[Point] {
        &self.draft
    }

    pub fn add_point(&mut self, p: Point) {
        self.draft.push(p);
    }

    /// Freeze the draft into a zone. With fewer than 3 points the draft is
    /// dropped and `false` tells the caller nothing was created.
    pub fn close_zone(&mut self) -> bool {
        let draft = std::mem::take(&mut self.draft);
        match Zone::new(draft) {
            Ok(zone) => {
                info!("zones: closed zone #{} ({} points)", self.zones.len(), zone.points.len());
                self.zones.push(zone);
                true
            }
            Err(e) => {
                debug!("zones: draft discarded: {}", e);
                false
            }
        }
    }

    pub fn cancel_draft(&mut self) {
        self.draft.clear();
    }

    pub fn clear_all(&mut self) {
        self.zones.clear();
        self.draft.clear();
    }

    /// True when `p` lies inside or on the edge of any closed zone.
    pub fn contains(&self, p: Point) -> bool {
        self.zones.iter().any(|z| z.contains(p))
    }

    /// JSON array of polygons, each an array of `[x, y]` pairs, in draw order.
    pub fn save(&self) -> Result<Vec<u8>> {
        let raw: Vec<&[Point]> = self.zones.iter().map(|z| z.points()).collect();
        serde_json::to_vec(&raw).map_err(|e| GuardError::Storage(format!("encode zones: {}", e)))
    }

    /// Replace the closed zones with the ones in `bytes`. On any parse or
    /// geometry error the current zones are kept. The draft is untouched.
    pub fn load(&mut self, bytes: &[u8]) -> Result<usize> {
        let raw: Vec<Vec<Point>> =
            serde_json::from_slice(bytes).map_err(|e| GuardError::CorruptData(e.to_string()))?;
        let zones = raw
            .into_iter()
            .enumerate()
            .map(|(i, pts)| Zone::new(pts).map_err(|e| GuardError::CorruptData(format!("zone #{}: {}", i, e))))
            .collect::<Result<Vec<_>>>()?;
        self.zones = zones;
        info!("zones: loaded {} zones", self.zones.len());
        Ok(self.zones.len())
    }
}
