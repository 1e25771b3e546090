//! The closed set of sensor types an edge node produces readings for.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A sensor type monitored by an edge node.
///
/// The set is closed by construction: every constraint, topic, and
/// simulation band is keyed on one of these four variants. The wire
/// spelling (`temperature`, `humidity`, `light`, `airquality`) is pinned
/// by the serde rename and must not change -- the logger and dashboard
/// parse it back out of payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Temperature,
    Humidity,
    Light,
    AirQuality,
}

impl SensorKind {
    /// Every sensor kind, in the order streams are started.
    pub const ALL: [SensorKind; 4] = [
        SensorKind::Temperature,
        SensorKind::Humidity,
        SensorKind::Light,
        SensorKind::AirQuality,
    ];

    /// The wire spelling used in payloads and topic segments.
    pub const fn as_str(self) -> &'static str {
        match self {
            SensorKind::Temperature => "temperature",
            SensorKind::Humidity => "humidity",
            SensorKind::Light => "light",
            SensorKind::AirQuality => "airquality",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a known sensor kind.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown sensor kind: {0}")]
pub struct UnknownSensorKind(pub String);

impl FromStr for SensorKind {
    type Err = UnknownSensorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temperature" => Ok(SensorKind::Temperature),
            "humidity" => Ok(SensorKind::Humidity),
            "light" => Ok(SensorKind::Light),
            "airquality" => Ok(SensorKind::AirQuality),
            other => Err(UnknownSensorKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_spelling_round_trips() {
        for kind in SensorKind::ALL {
            let parsed: SensorKind = kind.as_str().parse().expect("own spelling must parse");
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn airquality_is_one_word() {
        // The wire spelling is a single unseparated word.
        assert_eq!(SensorKind::AirQuality.as_str(), "airquality");
        assert_eq!(
            serde_json::to_string(&SensorKind::AirQuality).unwrap(),
            "\"airquality\""
        );
    }

    #[test]
    fn unknown_kind_is_an_error() {
        assert!("co2".parse::<SensorKind>().is_err());
        assert!("Temperature".parse::<SensorKind>().is_err());
    }
}
