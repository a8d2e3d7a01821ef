use serde::Serialize;
use tracing::{debug, info, warn};
use vigil_proto::{GuardError, Point, Rect, Result};
use vigil_vision::{view, ChangeRegion, DetectorConfig, Frame, MotionDetector, ViewConfig};
use vigil_zone::{persist, ZoneRepository, ZoneStore};

use crate::command::Command;
use crate::intrusion::Edge;
use crate::queue::CommandQueue;
use crate::state::{ArmOutcome, Mode, SurveillanceStateMachine};
use crate::SessionConfig;

/// A detected region after zone testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegionHit {
    /// as returned by the detector, crop space
    pub region: ChangeRegion,
    pub sensor_centroid: Point,
    pub in_zone: bool,
}

/// What a successfully applied command did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Applied {
    Armed(ArmOutcome),
    Disarmed,
    AlreadyCold,
    PointAdded(Point),
    ZoneClosed { zones: usize },
    DraftCancelled,
    ZonesCleared,
    ZonesSaved(usize),
    ZonesLoaded(usize),
    ThresholdSet(u8),
    MinAreaSet(u32),
    ZoomSet(f64),
    Panned { pan_x: i32, pan_y: i32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    pub command: Command,
    pub result: Result<Applied>,
}

/// Immutable snapshot of one tick, for rendering and logging.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub had_frame: bool,
    /// sensor-space crop the frame was cut to
    pub crop: Rect,
    pub regions: Vec<RegionHit>,
    pub alarm: bool,
    /// `None` when no detection ran (cold, or no frame)
    pub edge: Option<Edge>,
    pub commands: Vec<CommandResult>,
    // state after this tick's commands
    pub mode: Mode,
    pub intrusions: u64,
}

impl TickReport {
    pub fn armed(&self) -> bool {
        self.mode == Mode::Hot
    }

    pub fn rising_edge(&self) -> bool {
        self.edge == Some(Edge::Rising)
    }
}

/// One monitoring session: view, state machine, zones and pending commands.
/// Driven by calling [`Session::tick`] once per frame slot.
pub struct Session {
    view: ViewConfig,
    display: Rect,
    machine: SurveillanceStateMachine,
    zones: ZoneStore,
    repo: Box<dyn ZoneRepository>,
    queue: CommandQueue,
    ticks: u64,
}

impl Session {
    pub fn new(
        cfg: &SessionConfig,
        detector: DetectorConfig,
        display: Rect,
        sensor: (u32, u32),
        repo: Box<dyn ZoneRepository>,
    ) -> Self {
        Self {
            view: ViewConfig::new(sensor.0, sensor.1),
            display,
            machine: SurveillanceStateMachine::new(MotionDetector::new(detector)),
            zones: ZoneStore::new(),
            repo,
            queue: CommandQueue::new(cfg.max_commands_per_tick),
            ticks: 0,
        }
    }

    pub fn view(&self) -> &ViewConfig {
        &self.view
    }

    pub fn display(&self) -> Rect {
        self.display
    }

    pub fn zones(&self) -> &ZoneStore {
        &self.zones
    }

    pub fn mode(&self) -> Mode {
        self.machine.mode()
    }

    pub fn intrusions(&self) -> u64 {
        self.machine.tracker().count()
    }

    pub fn detector(&self) -> &MotionDetector {
        self.machine.detector()
    }

    pub fn pending_commands(&self) -> usize {
        self.queue.len()
    }

    pub fn enqueue(&mut self, cmd: Command) {
        self.queue.push(cmd);
    }

    /// Load persisted zones outside the tick cycle (startup).
    pub fn load_zones(&mut self) -> Result<usize> {
        persist::load_into(self.repo.as_ref(), &mut self.zones)
    }

    /// Process one frame slot. `None` means the source had nothing this tick:
    /// detection is skipped but mode, reference and episode state persist.
    /// Queued commands are applied after detection, against this tick's crop.
    pub fn tick(&mut self, frame: Option<&Frame>) -> TickReport {
        self.ticks += 1;

        let crop_rect;
        let crop = match frame {
            Some(f) => {
                self.observe_sensor(f);
                crop_rect = self.view.crop_rect();
                Some(f.crop(crop_rect))
            }
            None => {
                crop_rect = self.view.crop_rect();
                None
            }
        };

        let (regions, edge) = match crop.as_ref() {
            Some(c) if self.machine.is_hot() => {
                let hits = self.hits(c);
                let alarm = hits.iter().any(|h| h.in_zone);
                let edge = self.machine.tracker_mut().update(alarm);
                if edge == Edge::Rising {
                    info!("intrusion #{} detected", self.intrusions());
                }
                (hits, Some(edge))
            }
            _ => (Vec::new(), None),
        };
        let alarm = regions.iter().any(|h| h.in_zone);

        let commands = self
            .queue
            .drain_tick()
            .into_iter()
            .map(|command| CommandResult { command, result: self.apply(command, crop.as_ref(), crop_rect) })
            .collect();

        TickReport {
            tick: self.ticks,
            had_frame: frame.is_some(),
            crop: crop_rect,
            regions,
            alarm,
            edge,
            commands,
            mode: self.machine.mode(),
            intrusions: self.intrusions(),
        }
    }

    fn observe_sensor(&mut self, frame: &Frame) {
        let (w, h) = frame.dimensions();
        if (w, h) != (self.view.sensor_width, self.view.sensor_height) {
            info!(
                "sensor size {}x{} -> {}x{}",
                self.view.sensor_width, self.view.sensor_height, w, h
            );
            self.view.set_sensor_size(w, h);
        }
    }

    // a moved crop no longer lines up with the reference
    fn view_moved(&mut self, before: Rect) {
        if self.view.crop_rect() != before && self.machine.is_hot() {
            self.machine.detector_mut().rebaseline_next();
        }
    }

    fn hits(&mut self, crop: &Frame) -> Vec<RegionHit> {
        let view = self.view;
        self.machine
            .detect(crop)
            .into_iter()
            .map(|region| {
                let sensor_centroid = view::crop_to_sensor(&view, region.centroid);
                RegionHit { region, sensor_centroid, in_zone: self.zones.contains(sensor_centroid) }
            })
            .collect()
    }

    // `cut_from` is the rect `crop` was taken from
    fn apply(&mut self, cmd: Command, crop: Option<&Frame>, cut_from: Rect) -> Result<Applied> {
        debug!("command: {}", cmd);
        let res = match cmd {
            Command::Arm => {
                let res = crop
                    .ok_or_else(|| GuardError::NotReady("no frame this tick".into()))
                    .and_then(|c| self.machine.arm(c))
                    .map(Applied::Armed);
                if res.is_ok() {
                    // view changed earlier this tick
                    self.view_moved(cut_from);
                }
                res
            }
            Command::Disarm => Ok(if self.machine.disarm() { Applied::Disarmed } else { Applied::AlreadyCold }),
            Command::AddZonePoint(p) => {
                self.zones.add_point(p);
                Ok(Applied::PointAdded(p))
            }
            Command::ClickZonePoint(p) => {
                let sensor = view::display_to_sensor(&self.view, self.display, p);
                self.zones.add_point(sensor);
                Ok(Applied::PointAdded(sensor))
            }
            Command::CloseZone => {
                let points = self.zones.draft().len();
                if self.zones.close_zone() {
                    Ok(Applied::ZoneClosed { zones: self.zones.zones().len() })
                } else {
                    Err(GuardError::InvalidGeometry(format!("draft with {} points discarded", points)))
                }
            }
            Command::CancelDraft => {
                self.zones.cancel_draft();
                Ok(Applied::DraftCancelled)
            }
            Command::ClearZones => {
                self.zones.clear_all();
                Ok(Applied::ZonesCleared)
            }
            Command::SaveZones => persist::save_from(self.repo.as_ref(), &self.zones).map(Applied::ZonesSaved),
            Command::LoadZones => persist::load_into(self.repo.as_ref(), &mut self.zones).map(Applied::ZonesLoaded),
            Command::SetSensitivity(raw) => {
                let t = raw.clamp(1, 99);
                if t != raw {
                    warn!("sensitivity {} out of 1..99, using {}", raw, t);
                }
                self.machine.detector_mut().set_threshold(t);
                Ok(Applied::ThresholdSet(t))
            }
            Command::SetMinArea(px) => {
                self.machine.detector_mut().set_min_area(px);
                Ok(Applied::MinAreaSet(px))
            }
            Command::SetZoom(z) => {
                let before = self.view.crop_rect();
                let res = self.view.set_zoom(z).map(|_| Applied::ZoomSet(self.view.zoom));
                self.view_moved(before);
                res
            }
            Command::Pan { dx, dy } => {
                let before = self.view.crop_rect();
                self.view = view::pan_by(&self.view, dx, dy, self.display);
                self.view_moved(before);
                Ok(Applied::Panned { pan_x: self.view.pan_x, pan_y: self.view.pan_y })
            }
        };
        if let Err(e) = &res {
            warn!("command {} not applied: {}", cmd, e);
        }
        res
    }
}
