//! Postgres implementation of [`TelemetryStore`].
//!
//! [`PgTelemetryStore::connect`] dials the database with a bounded
//! fixed-interval retry, then applies the schema idempotently before
//! returning, so callers can insert immediately.

use std::time::Duration;

use async_trait::async_trait;
use canopy_core::{Partition, RetryPolicy};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::{StoreError, TelemetryDocument, TelemetryStore};

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(3);

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Connection parameters for [`PgTelemetryStore::connect`].
#[derive(Debug, Clone)]
pub struct PgStoreConfig {
    pub database_url: String,
    pub retry: RetryPolicy,
}

// ---------------------------------------------------------------------------
// PgTelemetryStore
// ---------------------------------------------------------------------------

/// Document store backed by two same-shaped Postgres tables, one per
/// [`Partition`].
pub struct PgTelemetryStore {
    pool: PgPool,
}

impl PgTelemetryStore {
    /// Connect and prepare the schema, retrying per `config.retry`.
    ///
    /// Exhausting the retry budget returns
    /// [`StoreError::Unreachable`]; services treat that as fatal at
    /// startup.
    pub async fn connect(
        config: PgStoreConfig,
        cancel: CancellationToken,
    ) -> Result<Self, StoreError> {
        let mut attempt = 0u32;
        let pool = loop {
            attempt += 1;
            let connect = PgPoolOptions::new()
                .max_connections(MAX_CONNECTIONS)
                .acquire_timeout(ACQUIRE_TIMEOUT)
                .connect(&config.database_url);

            tokio::select! {
                _ = cancel.cancelled() => return Err(StoreError::Cancelled),
                connected = connect => match connected {
                    Ok(pool) => break pool,
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            attempt,
                            max_attempts = config.retry.max_attempts,
                            "Database connection attempt failed"
                        );
                        if attempt >= config.retry.max_attempts {
                            return Err(StoreError::Unreachable {
                                attempts: attempt,
                                last: e,
                            });
                        }
                        tokio::select! {
                            _ = cancel.cancelled() => return Err(StoreError::Cancelled),
                            _ = tokio::time::sleep(config.retry.interval) => {}
                        }
                    }
                }
            }
        };

        let store = Self { pool };
        store.ensure_schema().await?;
        tracing::info!("Connected to document store");
        Ok(store)
    }

    /// Create both partition tables and their indexes if missing.
    ///
    /// Safe to call on every startup.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for partition in [Partition::SensorReadings, Partition::Events] {
            let table = partition.table();

            sqlx::query(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id        BIGSERIAL PRIMARY KEY,
                    topic     TEXT        NOT NULL,
                    sensor    TEXT,
                    node      TEXT,
                    body      JSONB       NOT NULL,
                    logged_at TIMESTAMPTZ NOT NULL
                )"
            ))
            .execute(&mut *tx)
            .await?;

            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_logged_at ON {table} (logged_at)"
            ))
            .execute(&mut *tx)
            .await?;

            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_node ON {table} (node)"
            ))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl TelemetryStore for PgTelemetryStore {
    async fn insert(&self, document: TelemetryDocument) -> Result<(), StoreError> {
        let table = document.partition().table();
        let query = format!(
            "INSERT INTO {table} (topic, sensor, node, body, logged_at) \
             VALUES ($1, $2, $3, $4, $5)"
        );

        sqlx::query(&query)
            .bind(&document.topic)
            .bind(document.sensor())
            .bind(document.node())
            .bind(&document.body)
            .bind(document.logged_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
