//! Partitioned document store for logged telemetry.
//!
//! The logger persists every message it receives as a
//! [`TelemetryDocument`]: the message body as received, augmented with
//! the source topic and an ingest timestamp. Documents land in one of
//! two partitions chosen from the topic alone ([`Partition`]), so raw
//! readings and constraint events stay queryable separately.
//!
//! - [`PgTelemetryStore`] -- the production store, backed by Postgres
//!   with an idempotent startup schema.
//! - [`InMemoryStore`] -- a journal-backed store for tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use canopy_core::Partition;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::{PgStoreConfig, PgTelemetryStore};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures surfaced by a [`TelemetryStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database never accepted a connection within the retry budget.
    #[error("database unreachable after {attempts} attempts")]
    Unreachable {
        attempts: u32,
        #[source]
        last: sqlx::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Shutdown was requested while connecting.
    #[error("connect cancelled")]
    Cancelled,
}

// ---------------------------------------------------------------------------
// TelemetryDocument
// ---------------------------------------------------------------------------

/// One persisted message: the body as published, plus ingest metadata.
///
/// The body is kept as free-form JSON rather than a typed reading, so
/// the logger stores exactly what was on the wire even if producers
/// evolve ahead of it.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryDocument {
    /// Full topic the message arrived on.
    pub topic: String,

    /// When the logger ingested the message (UTC).
    pub logged_at: DateTime<Utc>,

    /// The decoded message payload.
    pub body: serde_json::Value,
}

impl TelemetryDocument {
    /// Wrap a decoded payload, stamping the ingest time.
    pub fn new(topic: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            topic: topic.into(),
            logged_at: Utc::now(),
            body,
        }
    }

    /// The partition this document belongs to, derived from its topic.
    pub fn partition(&self) -> Partition {
        Partition::for_topic(&self.topic)
    }

    /// The `sensor` field of the body, when present.
    pub fn sensor(&self) -> Option<&str> {
        self.body.get("sensor").and_then(|v| v.as_str())
    }

    /// The `node` field of the body, when present.
    pub fn node(&self) -> Option<&str> {
        self.body.get("node").and_then(|v| v.as_str())
    }

    /// The `value` field of the body, when present.
    pub fn value(&self) -> Option<f64> {
        self.body.get("value").and_then(|v| v.as_f64())
    }
}

// ---------------------------------------------------------------------------
// TelemetryStore
// ---------------------------------------------------------------------------

/// The persistence contract used by the logger.
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    /// Persist one document into its topic-derived partition.
    async fn insert(&self, document: TelemetryDocument) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
