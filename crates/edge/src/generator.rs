//! Simulated sensor sources.
//!
//! A real deployment would read hardware here; this node samples a
//! uniform distribution instead. The normal band of every sensor
//! deliberately straddles its constraint so violations occur
//! organically, and an active simulation mode narrows one sensor onto
//! an always-violating band.

use canopy_core::{SensorKind, SimulationMode};
use rand::Rng;

/// Produces one sample per tick for a sensor kind.
///
/// The trait seam lets tests drive streams with scripted values
/// instead of random ones.
pub trait ValueGenerator: Send + Sync {
    fn sample(&self, kind: SensorKind, mode: SimulationMode) -> f64;
}

/// The normal sampling band for a kind.
fn normal_band(kind: SensorKind) -> (f64, f64) {
    match kind {
        SensorKind::Temperature => (10.0, 35.0),
        SensorKind::Humidity => (30.0, 90.0),
        SensorKind::Light => (50.0, 500.0),
        SensorKind::AirQuality => (500.0, 1500.0),
    }
}

/// Round to two decimals, the precision carried on the wire.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// SimulatedGenerator
// ---------------------------------------------------------------------------

/// Uniform random generator with simulation-mode overrides.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedGenerator;

impl SimulatedGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl ValueGenerator for SimulatedGenerator {
    fn sample(&self, kind: SensorKind, mode: SimulationMode) -> f64 {
        let (low, high) = mode.forced_band(kind).unwrap_or_else(|| normal_band(kind));
        round2(rand::rng().random_range(low..=high))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
