//! Per-sensor admissible ranges and the classification engine.
//!
//! [`ConstraintSet::evaluate`] is the only place a reading is classified:
//! it looks up the sensor's [`Constraint`] and walks an explicit rule
//! table in one deterministic pass. Boundary values are admissible --
//! only strict inequality trips a rule.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sensor::SensorKind;

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// The violation taxonomy produced by constraint evaluation.
///
/// Exactly one event kind applies to any violating reading; the rule
/// table below is mutually exclusive per sensor kind by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TemperatureAlertHigh,
    TemperatureAlertLow,
    HumidityAlertHigh,
    HumidityAlertLow,
    LightLow,
    #[serde(rename = "airquality_warning")]
    AirQualityWarning,
}

impl EventKind {
    /// The wire spelling used in payloads and event topic segments.
    pub const fn as_str(self) -> &'static str {
        match self {
            EventKind::TemperatureAlertHigh => "temperature_alert_high",
            EventKind::TemperatureAlertLow => "temperature_alert_low",
            EventKind::HumidityAlertHigh => "humidity_alert_high",
            EventKind::HumidityAlertLow => "humidity_alert_low",
            EventKind::LightLow => "light_low",
            EventKind::AirQualityWarning => "airquality_warning",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Constraint
// ---------------------------------------------------------------------------

/// Admissible range for one sensor kind.
///
/// Either bound may be absent: light carries only a floor, air quality
/// only a ceiling. An absent bound never trips a rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Constraint {
    /// A two-sided range.
    pub const fn range(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// A floor-only constraint.
    pub const fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// A ceiling-only constraint.
    pub const fn at_most(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }
}

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

/// Which bound a rule checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Breach {
    AboveMax,
    BelowMin,
}

/// One row of the classification table.
struct Rule {
    kind: SensorKind,
    breach: Breach,
    event: EventKind,
}

/// The complete classification table, evaluated top to bottom; the first
/// matching rule for a sensor kind wins. Order is load-bearing for the
/// two-sided kinds (max-exceeded is checked before min-underrun).
const RULES: &[Rule] = &[
    Rule {
        kind: SensorKind::Temperature,
        breach: Breach::AboveMax,
        event: EventKind::TemperatureAlertHigh,
    },
    Rule {
        kind: SensorKind::Temperature,
        breach: Breach::BelowMin,
        event: EventKind::TemperatureAlertLow,
    },
    Rule {
        kind: SensorKind::Humidity,
        breach: Breach::AboveMax,
        event: EventKind::HumidityAlertHigh,
    },
    Rule {
        kind: SensorKind::Humidity,
        breach: Breach::BelowMin,
        event: EventKind::HumidityAlertLow,
    },
    Rule {
        kind: SensorKind::Light,
        breach: Breach::BelowMin,
        event: EventKind::LightLow,
    },
    Rule {
        kind: SensorKind::AirQuality,
        breach: Breach::AboveMax,
        event: EventKind::AirQualityWarning,
    },
];

// ---------------------------------------------------------------------------
// Verdict + ConstraintSet
// ---------------------------------------------------------------------------

/// Result of classifying one reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub event: bool,
    pub event_type: Option<EventKind>,
}

impl Verdict {
    /// An admissible reading.
    pub const fn normal() -> Self {
        Self {
            event: false,
            event_type: None,
        }
    }

    /// A violating reading with its single event kind.
    pub const fn violation(event: EventKind) -> Self {
        Self {
            event: true,
            event_type: Some(event),
        }
    }
}

/// The startup-loaded constraint table, one entry per sensor kind.
#[derive(Debug, Clone)]
pub struct ConstraintSet {
    constraints: HashMap<SensorKind, Constraint>,
}

impl Default for ConstraintSet {
    /// The stock greenhouse ranges: temperature 15-30, humidity 40-80,
    /// light at least 100, air quality at most 1000.
    fn default() -> Self {
        let mut constraints = HashMap::new();
        constraints.insert(SensorKind::Temperature, Constraint::range(15.0, 30.0));
        constraints.insert(SensorKind::Humidity, Constraint::range(40.0, 80.0));
        constraints.insert(SensorKind::Light, Constraint::at_least(100.0));
        constraints.insert(SensorKind::AirQuality, Constraint::at_most(1000.0));
        Self { constraints }
    }
}

impl ConstraintSet {
    /// An empty set, for building a custom table.
    pub fn empty() -> Self {
        Self {
            constraints: HashMap::new(),
        }
    }

    /// Add or replace the constraint for a sensor kind.
    pub fn with(mut self, kind: SensorKind, constraint: Constraint) -> Self {
        self.constraints.insert(kind, constraint);
        self
    }

    /// The configured constraint for a kind.
    ///
    /// # Panics
    ///
    /// A kind with no entry is a configuration defect, not a runtime
    /// condition; this asserts rather than classifying the reading as
    /// normal by accident.
    pub fn constraint_for(&self, kind: SensorKind) -> Constraint {
        match self.constraints.get(&kind) {
            Some(c) => *c,
            None => panic!("no constraint configured for sensor kind `{kind}`"),
        }
    }

    /// Classify a value against its sensor kind's constraint.
    ///
    /// Deterministic and side-effect free. Strict inequality only: a
    /// value exactly equal to a bound is admissible.
    pub fn evaluate(&self, kind: SensorKind, value: f64) -> Verdict {
        let constraint = self.constraint_for(kind);

        for rule in RULES.iter().filter(|rule| rule.kind == kind) {
            let breached = match rule.breach {
                Breach::AboveMax => constraint.max.is_some_and(|max| value > max),
                Breach::BelowMin => constraint.min.is_some_and(|min| value < min),
            };
            if breached {
                return Verdict::violation(rule.event);
            }
        }

        Verdict::normal()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
