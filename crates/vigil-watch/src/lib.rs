pub mod command;
pub mod intrusion;
pub mod queue;
pub mod session;
pub mod state;

use serde::Deserialize;

pub use command::{Command, ParseCommandError};
pub use intrusion::{Edge, IntrusionTracker};
pub use session::{Applied, CommandResult, RegionHit, Session, TickReport};
pub use state::{ArmOutcome, Mode, SurveillanceStateMachine};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Commands applied per tick; the rest wait for the next one.
    pub max_commands_per_tick: usize,

    /// Pause between ticks when the source does not pace itself.
    pub tick_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { max_commands_per_tick: 5, tick_ms: 100 }
    }
}
