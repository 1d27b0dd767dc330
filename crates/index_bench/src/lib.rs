//! MongoDB index recommendation benchmark.
//!
//! Profiles a workload, asks `mindexer` for indexes and measures how much
//! they speed the workload up.

pub mod commands;
pub mod settings;
pub mod stats;
