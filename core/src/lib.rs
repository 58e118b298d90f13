//! Synthetic mortgage loan tape: generate, persist as Parquet, load into
//! SQLite and export portfolio rollups.

pub mod band;
pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod loan;
pub mod pipeline;
pub mod rng;
pub mod store;
pub mod tape;
pub mod types;
