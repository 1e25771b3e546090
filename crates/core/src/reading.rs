//! The telemetry envelope published by edge nodes.
//!
//! One [`Reading`] is emitted per sample. The same envelope travels on
//! the raw channel always, and on the event channel additionally when
//! classification flagged a violation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constraint::{EventKind, Verdict};
use crate::sensor::SensorKind;

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// A classified sensor sample.
///
/// Constructed via [`Reading::new`], which stamps the observation time.
/// `event_type` is always present on the wire and is `null` for an
/// admissible reading, so consumers never branch on a missing key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Which sensor produced the sample.
    pub sensor: SensorKind,

    /// The sampled value, rounded to two decimals by the generator.
    pub value: f64,

    /// When the sample was taken (UTC).
    pub timestamp: DateTime<Utc>,

    /// Identifier of the edge node that produced the sample.
    pub node: String,

    /// Whether the value violated its constraint.
    pub event: bool,

    /// The violation kind, `None` when `event` is false.
    pub event_type: Option<EventKind>,
}

impl Reading {
    /// Build a reading from a classified sample, stamped with the
    /// current UTC time.
    pub fn new(node: impl Into<String>, sensor: SensorKind, value: f64, verdict: Verdict) -> Self {
        Self {
            sensor,
            value,
            timestamp: Utc::now(),
            node: node.into(),
            event: verdict.event,
            event_type: verdict.event_type,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
