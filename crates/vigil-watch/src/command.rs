use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use vigil_proto::Point;

/// Operator commands. Each carries exactly the payload it needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Arm,
    Disarm,
    /// sensor-space vertex
    AddZonePoint(Point),
    /// display-space click, mapped through the current view first
    ClickZonePoint(Point),
    CloseZone,
    CancelDraft,
    ClearZones,
    SaveZones,
    LoadZones,
    /// raw threshold 1..=99
    SetSensitivity(u8),
    SetMinArea(u32),
    SetZoom(f64),
    /// display-space drag delta
    Pan { dx: i32, dy: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("{cmd}: expected {expected}")]
    BadArgs { cmd: String, expected: &'static str },
}

impl FromStr for Command {
    type Err = ParseCommandError;

    /// Line form used on the CLI: `arm`, `point 10 20`, `zoom 1.5`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let name = parts.next().ok_or(ParseCommandError::Empty)?.to_ascii_lowercase();
        let args: Vec<&str> = parts.collect();

        let bad = |expected: &'static str| ParseCommandError::BadArgs { cmd: name.clone(), expected };
        let none = |cmd: Command| if args.is_empty() { Ok(cmd) } else { Err(bad("no arguments")) };
        let pair = || -> Result<(i32, i32), ParseCommandError> {
            match args.as_slice() {
                [a, b] => Ok((a.parse().map_err(|_| bad("X Y"))?, b.parse().map_err(|_| bad("X Y"))?)),
                _ => Err(bad("X Y")),
            }
        };

        match name.as_str() {
            "arm" | "hot" => none(Command::Arm),
            "disarm" | "cold" => none(Command::Disarm),
            "point" => pair().map(|(x, y)| Command::AddZonePoint(Point::new(x, y))),
            "click" => pair().map(|(x, y)| Command::ClickZonePoint(Point::new(x, y))),
            "close" => none(Command::CloseZone),
            "cancel" => none(Command::CancelDraft),
            "clear-zones" => none(Command::ClearZones),
            "save" => none(Command::SaveZones),
            "load" => none(Command::LoadZones),
            "sensitivity" => match args.as_slice() {
                [v] => v.parse().map(Command::SetSensitivity).map_err(|_| bad("raw threshold 1..99")),
                _ => Err(bad("raw threshold 1..99")),
            },
            "min-area" => match args.as_slice() {
                [v] => v.parse().map(Command::SetMinArea).map_err(|_| bad("pixel count")),
                _ => Err(bad("pixel count")),
            },
            "zoom" => match args.as_slice() {
                [v] => v.parse().map(Command::SetZoom).map_err(|_| bad("zoom factor")),
                _ => Err(bad("zoom factor")),
            },
            "pan" => pair().map(|(dx, dy)| Command::Pan { dx, dy }),
            _ => Err(ParseCommandError::Unknown(name.clone())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Arm => write!(f, "arm"),
            Command::Disarm => write!(f, "disarm"),
            Command::AddZonePoint(p) => write!(f, "point {} {}", p.x, p.y),
            Command::ClickZonePoint(p) => write!(f, "click {} {}", p.x, p.y),
            Command::CloseZone => write!(f, "close"),
            Command::CancelDraft => write!(f, "cancel"),
            Command::ClearZones => write!(f, "clear-zones"),
            Command::SaveZones => write!(f, "save"),
            Command::LoadZones => write!(f, "load"),
            Command::SetSensitivity(v) => write!(f, "sensitivity {}", v),
            Command::SetMinArea(v) => write!(f, "min-area {}", v),
            Command::SetZoom(z) => write!(f, "zoom {}", z),
            Command::Pan { dx, dy } => write!(f, "pan {} {}", dx, dy),
        }
    }
}
