use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Info,
    Alarm,
    Error,
    System,
}

/// One operator-journal entry. Carries a snapshot of the session so a reader
/// of the JSONL journal does not need the tick reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEvent {
    pub ts_unix_ms: i64,
    pub kind: EventKind,
    pub msg: String,
    pub armed: bool,
    pub intrusions: u64,
    // digital zoom at the time of the entry
    pub zoom: Option<f64>,
}

impl WatchEvent {
    /// Two entries repeat each other when kind and message match; the
    /// timestamp and snapshot are ignored.
    pub fn repeats(&self, other: &WatchEvent) -> bool {
        self.kind == other.kind && self.msg == other.msg
    }
}
