//! Topic layout and the topic-to-partition routing rule.
//!
//! Every channel name used anywhere in the pipeline is built or named
//! here, so producers and consumers cannot drift apart:
//!
//! - `env/{sensor}/raw` -- every sample, via [`raw`].
//! - `env/event/{event_type}` -- violating samples only, via [`event`].
//! - [`CONTROL`] -- simulation commands from the dashboard.
//! - [`TELEMETRY_WILDCARD`] -- the logger's catch-all subscription.

use std::fmt;

use crate::constraint::EventKind;
use crate::sensor::SensorKind;

/// Control topic carrying [`SimulatePayload`](crate::SimulatePayload)
/// messages.
pub const CONTROL: &str = "greenhouse/control/simulate";

/// Matches every telemetry topic, raw and event alike.
pub const TELEMETRY_WILDCARD: &str = "env/#";

/// Matches the raw channel of every sensor kind.
pub const RAW_WILDCARD: &str = "env/+/raw";

/// Matches every event channel.
pub const EVENT_WILDCARD: &str = "env/event/#";

/// The raw channel for one sensor kind.
pub fn raw(kind: SensorKind) -> String {
    format!("env/{}/raw", kind.as_str())
}

/// The event channel for one violation kind.
pub fn event(kind: EventKind) -> String {
    format!("env/event/{}", kind.as_str())
}

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

/// Where a logged document lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    SensorReadings,
    Events,
}

impl Partition {
    /// Route a topic to its partition.
    ///
    /// The rule is a substring test on the full topic: anything with an
    /// `/event/` segment is an event, everything else is a reading.
    pub fn for_topic(topic: &str) -> Self {
        if topic.contains("/event/") {
            Partition::Events
        } else {
            Partition::SensorReadings
        }
    }

    /// The backing table name.
    pub const fn table(self) -> &'static str {
        match self {
            Partition::SensorReadings => "sensor_readings",
            Partition::Events => "events",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
