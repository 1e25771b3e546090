//! Canopy domain model.
//!
//! Pure types and logic shared by every service in the workspace:
//!
//! - [`SensorKind`] / [`EventKind`] -- the closed sensor and violation
//!   vocabularies.
//! - [`Reading`] -- the telemetry payload published on every tick.
//! - [`ConstraintSet`] -- per-sensor admissible ranges and the
//!   classification engine that turns a value into a [`Verdict`].
//! - [`SimulationMode`] / [`SimulationCell`] -- the process-wide simulation
//!   signal shared across concurrent sensor streams.
//! - [`topic`] -- topic naming conventions and partition routing.
//! - [`RetryPolicy`] -- shared startup-connection retry tunable.
//!
//! This crate is deliberately runtime-free: no tokio, no I/O. Everything
//! here is deterministic and unit-testable in isolation.

pub mod constraint;
pub mod reading;
pub mod retry;
pub mod sensor;
pub mod sim;
pub mod topic;

pub use constraint::{Constraint, ConstraintSet, EventKind, Verdict};
pub use reading::Reading;
pub use retry::RetryPolicy;
pub use sensor::SensorKind;
pub use sim::{SimulateCommand, SimulatePayload, SimulationCell, SimulationMode};
pub use topic::Partition;
