use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};
use vigil_proto::event::{EventKind, WatchEvent};

/// Operator journal: the last `capacity` entries, with consecutive duplicates
/// collapsed. Every accepted entry goes to tracing and, when configured, to a
/// JSONL file.
pub struct EventJournal {
    entries: VecDeque<WatchEvent>,
    capacity: usize,
    sink: Option<File>,
}

impl EventJournal {
    pub fn new(capacity: usize, events_path: Option<&Path>) -> Result<Self> {
        let sink = match events_path {
            Some(p) => {
                if let Some(dir) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
                    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
                }
                Some(
                    OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(p)
                        .with_context(|| format!("open journal {}", p.display()))?,
                )
            }
            None => None,
        };
        let capacity = capacity.max(1);
        Ok(Self { entries: VecDeque::with_capacity(capacity), capacity, sink })
    }

    /// Returns false when the entry repeated the previous one and was dropped.
    pub fn record(&mut self, ev: WatchEvent) -> bool {
        if self.entries.back().map(|last| last.repeats(&ev)).unwrap_or(false) {
            return false;
        }

        match ev.kind {
            EventKind::Alarm => warn!(armed = ev.armed, intrusions = ev.intrusions, "ALARM {}", ev.msg),
            EventKind::Error => warn!("{}", ev.msg),
            EventKind::Info | EventKind::System => info!("{}", ev.msg),
        }

        if let Some(f) = self.sink.as_mut() {
            let line = serde_json::to_string(&ev).map_err(anyhow::Error::from).and_then(|mut s| {
                s.push('\n');
                f.write_all(s.as_bytes()).map_err(anyhow::Error::from)
            });
            if let Err(e) = line {
                warn!("journal write failed: {:#}", e);
            }
        }

        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(ev);
        true
    }

    /// Oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &WatchEvent> {
        self.entries.iter()
    }
}

pub fn now_unix_ms() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
