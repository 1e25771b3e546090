//! `canopy-dashboard` library crate.
//!
//! Re-exports internal modules for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod config;
pub mod error;
pub mod feed;
pub mod routes;
pub mod state;
pub mod ws;
