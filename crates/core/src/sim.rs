//! Simulation-mode control plane shared between the control subscriber
//! and the sensor streams.
//!
//! A [`SimulationCell`] holds the node-wide mode as an atomic byte.
//! The control subscriber is the single writer; every sensor stream
//! reads it once per tick. `Relaxed` ordering is enough: the mode is a
//! standalone flag and a stale read for one tick is acceptable.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sensor::SensorKind;

// ---------------------------------------------------------------------------
// SimulationMode
// ---------------------------------------------------------------------------

/// Node-wide simulation state.
///
/// `None` is the initial state; the remaining variants mirror the
/// accepted control commands. `Reset` is kept distinct from `None` so
/// the last received command stays observable, but both leave every
/// sensor on its normal band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SimulationMode {
    None = 0,
    Overheat = 1,
    LowLight = 2,
    PoorAir = 3,
    Reset = 4,
}

impl SimulationMode {
    /// The band a mode forces onto one sensor kind, if any.
    ///
    /// A mode targets exactly one kind; all other kinds keep sampling
    /// their normal band.
    pub fn forced_band(self, kind: SensorKind) -> Option<(f64, f64)> {
        match (self, kind) {
            (SimulationMode::Overheat, SensorKind::Temperature) => Some((32.0, 36.0)),
            (SimulationMode::LowLight, SensorKind::Light) => Some((30.0, 80.0)),
            (SimulationMode::PoorAir, SensorKind::AirQuality) => Some((1100.0, 1400.0)),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SimulationMode::None => "none",
            SimulationMode::Overheat => "overheat",
            SimulationMode::LowLight => "lowlight",
            SimulationMode::PoorAir => "poorair",
            SimulationMode::Reset => "reset",
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => SimulationMode::Overheat,
            2 => SimulationMode::LowLight,
            3 => SimulationMode::PoorAir,
            4 => SimulationMode::Reset,
            _ => SimulationMode::None,
        }
    }
}

impl fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SimulationCell
// ---------------------------------------------------------------------------

/// Shared single-writer, multi-reader mode cell.
///
/// Shared via `Arc<SimulationCell>` between the control subscriber and
/// the sensor streams; no lock is ever taken on the sampling path.
#[derive(Debug)]
pub struct SimulationCell(AtomicU8);

impl SimulationCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(SimulationMode::None as u8))
    }

    /// Replace the current mode. A new command overwrites the previous
    /// one unconditionally.
    pub fn store(&self, mode: SimulationMode) {
        self.0.store(mode as u8, Ordering::Relaxed);
    }

    /// The mode in effect right now.
    pub fn load(&self) -> SimulationMode {
        SimulationMode::from_u8(self.0.load(Ordering::Relaxed))
    }
}

impl Default for SimulationCell {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Control payload
// ---------------------------------------------------------------------------

/// The commands accepted on the control topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulateCommand {
    Overheat,
    LowLight,
    PoorAir,
    Reset,
}

impl From<SimulateCommand> for SimulationMode {
    fn from(command: SimulateCommand) -> Self {
        match command {
            SimulateCommand::Overheat => SimulationMode::Overheat,
            SimulateCommand::LowLight => SimulationMode::LowLight,
            SimulateCommand::PoorAir => SimulationMode::PoorAir,
            SimulateCommand::Reset => SimulationMode::Reset,
        }
    }
}

/// Wire shape of a control message.
///
/// `timestamp` is informational; receivers act on `type` alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatePayload {
    #[serde(rename = "type")]
    pub command: SimulateCommand,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl SimulatePayload {
    /// Build a payload stamped with the current UTC time.
    pub fn new(command: SimulateCommand) -> Self {
        Self {
            command,
            timestamp: Some(Utc::now()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
