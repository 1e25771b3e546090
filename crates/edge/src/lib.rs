//! `canopy-edge` library crate.
//!
//! Re-exports internal modules for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod config;
pub mod control;
pub mod generator;
pub mod node;
pub mod stream;
