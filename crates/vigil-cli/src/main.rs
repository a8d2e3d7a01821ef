mod config;
mod journal;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use vigil_proto::event::{EventKind, WatchEvent};
use vigil_vision::camera::FrameSource;
use vigil_vision::doctor as vision_doctor;
use vigil_vision::motion::operator_sensitivity;
use vigil_watch::{Applied, ArmOutcome, Mode, ParseCommandError, Session, TickReport};
use vigil_zone::{doctor as zone_doctor, persist, FileZoneRepository, ZoneRepository, ZoneStore};

use crate::config::{load_config, Config};
use crate::journal::{now_unix_ms, EventJournal};

#[derive(Debug, Parser)]
#[command(name = "vigil", version, about = "vigil - single-camera intrusion monitor")]
struct Cli {
    #[arg(long)]
    config: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate configuration and the zone file.
    Doctor,
    /// Monitor; operator commands are read from stdin, one per line.
    Run,
    Zones { #[command(subcommand)] cmd: ZonesCmd },
}

#[derive(Debug, Subcommand)]
enum ZonesCmd {
    /// Print the persisted zones.
    List,
}

type CommandLine = std::result::Result<vigil_watch::Command, ParseCommandError>;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    match cli.cmd {
        Command::Doctor => doctor(&cfg)?,
        Command::Run => run(&cfg).await?,
        Command::Zones { cmd: ZonesCmd::List } => zones_list(&cfg)?,
    }
    Ok(())
}

fn doctor(cfg: &Config) -> Result<()> {
    info!("doctor: starting");

    vision_doctor::check_detector(&cfg.detector)?;
    vision_doctor::check_camera(&cfg.camera)?;
    vision_doctor::check_display(cfg.display.width, cfg.display.height)?;
    anyhow::ensure!(cfg.session.max_commands_per_tick > 0, "session.max_commands_per_tick must be > 0");
    anyhow::ensure!(cfg.journal.capacity > 0, "journal.capacity must be > 0");

    let repo = FileZoneRepository::new(&cfg.zones.path);
    let n = zone_doctor::check_zones(&repo, cfg.camera.width, cfg.camera.height)?;
    info!("doctor: {} zones in {}", n, repo.describe());
    info!(
        "doctor: sensitivity {}% (threshold {}), min area {}px",
        operator_sensitivity(cfg.detector.threshold),
        cfg.detector.threshold,
        cfg.detector.min_area
    );

    info!("doctor: OK");
    Ok(())
}

fn zones_list(cfg: &Config) -> Result<()> {
    let repo = FileZoneRepository::new(&cfg.zones.path);
    let mut store = ZoneStore::new();
    let n = persist::load_into(&repo, &mut store).with_context(|| format!("load {}", repo.describe()))?;
    if n == 0 {
        println!("no zones in {}", repo.describe());
        return Ok(());
    }
    for (i, zone) in store.zones().iter().enumerate() {
        let pts: Vec<String> = zone.points().iter().map(|p| format!("({},{})", p.x, p.y)).collect();
        println!("zone #{} n={} {}", i, zone.points().len(), pts.join(" "));
    }
    Ok(())
}

async fn run(cfg: &Config) -> Result<()> {
    info!("run: starting");

    let mut source = FrameSource::open(&cfg.camera)?;
    let repo = FileZoneRepository::new(&cfg.zones.path);
    let mut session = Session::new(
        &cfg.session,
        cfg.detector.clone(),
        cfg.display.rect(),
        (cfg.camera.width, cfg.camera.height),
        Box::new(repo),
    );
    let mut journal = EventJournal::new(cfg.journal.capacity, cfg.journal.events_path.as_deref().map(Path::new))?;
    journal.record(entry(&session, EventKind::System, "session started"));

    if cfg.zones.autoload {
        match session.load_zones() {
            Ok(n) => journal.record(entry(&session, EventKind::Info, format!("loaded {} zones", n))),
            Err(e) => journal.record(entry(&session, EventKind::Error, format!("zone load failed: {}", e))),
        };
    }

    let (tx, mut rx) = mpsc::channel::<CommandLine>(32);
    tokio::spawn(read_commands(tx));

    let tick = Duration::from_millis(cfg.session.tick_ms);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        while let Ok(line) = rx.try_recv() {
            match line {
                Ok(cmd) => session.enqueue(cmd),
                Err(e) => {
                    journal.record(entry(&session, EventKind::Error, format!("bad command: {}", e)));
                }
            }
        }

        let frame = source.next_frame().await.unwrap_or_else(|e| {
            warn!("frame source: {:#}", e);
            None
        });
        let report = session.tick(frame.as_ref());
        journal_tick(&mut journal, &session, &report);

        if source.exhausted() {
            info!("run: frame source exhausted");
            break;
        }

        tokio::select! {
            res = &mut ctrl_c => {
                if let Err(e) = res {
                    warn!("ctrl-c handler failed: {}", e);
                }
                info!("run: interrupted");
                break;
            }
            _ = tokio::time::sleep(tick) => {}
        }
    }

    journal.record(entry(
        &session,
        EventKind::System,
        format!("session stopped after {} intrusions", session.intrusions()),
    ));
    for ev in journal.recent() {
        println!("{} {:?} {}", ev.ts_unix_ms, ev.kind, ev.msg);
    }
    Ok(())
}

async fn read_commands(tx: mpsc::Sender<CommandLine>) {
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                if tx.send(line.parse()).await.is_err() {
                    break;
                }
            }
            Ok(None) => {
                debug!("stdin closed");
                break;
            }
            Err(e) => {
                warn!("stdin read failed: {}", e);
                break;
            }
        }
    }
}

fn entry(session: &Session, kind: EventKind, msg: impl Into<String>) -> WatchEvent {
    WatchEvent {
        ts_unix_ms: now_unix_ms(),
        kind,
        msg: msg.into(),
        armed: session.mode() == Mode::Hot,
        intrusions: session.intrusions(),
        zoom: Some(session.view().zoom),
    }
}

fn journal_tick(journal: &mut EventJournal, session: &Session, report: &TickReport) {
    debug!(
        tick = report.tick,
        mode = ?report.mode,
        regions = report.regions.len(),
        alarm = report.alarm,
        "tick"
    );

    if !report.had_frame {
        journal.record(entry(session, EventKind::Error, "no frame"));
    }
    if report.rising_edge() {
        let inside = report.regions.iter().filter(|h| h.in_zone).count();
        journal.record(entry(
            session,
            EventKind::Alarm,
            format!("intrusion #{} ({} regions in zone)", report.intrusions, inside),
        ));
    }
    for c in &report.commands {
        match &c.result {
            Ok(applied) => journal.record(entry(session, EventKind::Info, describe(applied))),
            Err(e) => journal.record(entry(session, EventKind::Error, format!("{}: {}", c.command, e))),
        };
    }
}

fn describe(applied: &Applied) -> String {
    match applied {
        Applied::Armed(ArmOutcome::Armed) => "armed".into(),
        Applied::Armed(ArmOutcome::Rearmed) => "reference recaptured".into(),
        Applied::Disarmed => "disarmed".into(),
        Applied::AlreadyCold => "already disarmed".into(),
        Applied::PointAdded(p) => format!("zone point ({},{})", p.x, p.y),
        Applied::ZoneClosed { zones } => format!("zone closed, {} zones", zones),
        Applied::DraftCancelled => "zone draft cancelled".into(),
        Applied::ZonesCleared => "all zones cleared".into(),
        Applied::ZonesSaved(n) => format!("saved {} zones", n),
        Applied::ZonesLoaded(n) => format!("loaded {} zones", n),
        Applied::ThresholdSet(t) => format!("sensitivity {}% (threshold {})", operator_sensitivity(*t), t),
        Applied::MinAreaSet(px) => format!("min area {}px", px),
        Applied::ZoomSet(z) => format!("zoom {:.2}x", z),
        Applied::Panned { pan_x, pan_y } => format!("pan {},{}", pan_x, pan_y),
    }
}
