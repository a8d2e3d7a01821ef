use serde::Serialize;
use tracing::{info, warn};
use vigil_proto::Result;
use vigil_vision::{ChangeRegion, Frame, MotionDetector};

use crate::intrusion::IntrusionTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    /// idle / configuration
    Cold,
    /// armed, monitoring
    Hot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmOutcome {
    Armed,
    /// already hot; the reference was captured again
    Rearmed,
}

/// COLD/HOT gate around the detector. Owns the reference lifecycle and the
/// intrusion episode state.
pub struct SurveillanceStateMachine {
    mode: Mode,
    detector: MotionDetector,
    tracker: IntrusionTracker,
}

impl SurveillanceStateMachine {
    pub fn new(detector: MotionDetector) -> Self {
        Self { mode: Mode::Cold, detector, tracker: IntrusionTracker::new() }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_hot(&self) -> bool {
        self.mode == Mode::Hot
    }

    pub fn detector(&self) -> &MotionDetector {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut MotionDetector {
        &mut self.detector
    }

    pub fn tracker(&self) -> &IntrusionTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut IntrusionTracker {
        &mut self.tracker
    }

    /// COLD -> HOT, or re-capture when already HOT. A failed capture leaves
    /// the mode (and any previous reference) as it was.
    pub fn arm(&mut self, frame: &Frame) -> Result<ArmOutcome> {
        if let Err(e) = self.detector.arm(frame) {
            warn!("arm refused: {}", e);
            return Err(e);
        }
        self.tracker.end_episode();
        let outcome = match self.mode {
            Mode::Cold => ArmOutcome::Armed,
            Mode::Hot => ArmOutcome::Rearmed,
        };
        self.mode = Mode::Hot;
        info!("state: HOT ({:?})", outcome);
        Ok(outcome)
    }

    /// HOT -> COLD. Drops the reference and zeroes the intrusion state.
    /// Returns false when already COLD.
    pub fn disarm(&mut self) -> bool {
        if self.mode == Mode::Cold {
            return false;
        }
        self.detector.disarm();
        self.tracker.reset();
        self.mode = Mode::Cold;
        info!("state: COLD");
        true
    }

    /// Detection only runs while HOT.
    pub fn detect(&mut self, frame: &Frame) -> Vec<ChangeRegion> {
        match self.mode {
            Mode::Hot => self.detector.detect_changes(frame),
            Mode::Cold => Vec::new(),
        }
    }
}
